use crate::core::{FloatImage, ImageLoadParams};
use ::image::imageops::{self, FilterType};
use ::image::GrayImage;

/// `image::GrayImage` into a [`FloatImage`] with intensities in `[0, 1]`.
pub fn float_image_from_luma(img: &GrayImage) -> FloatImage {
    FloatImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().iter().map(|&v| v as f32 / 255.0).collect(),
    }
}

/// Apply a preset's load parameters: scale, then crop, then flip.
///
/// A crop larger than the scaled image leaves an empty image.
pub fn load_impression_image(img: &GrayImage, params: &ImageLoadParams) -> FloatImage {
    let mut img = if params.scale > 0.0 && params.scale != 1.0 {
        let w = ((img.width() as f64 * params.scale).round() as u32).max(1);
        let h = ((img.height() as f64 * params.scale).round() as u32).max(1);
        imageops::resize(img, w, h, FilterType::Triangle)
    } else {
        img.clone()
    };

    let [[top, bottom], [left, right]] = params.crop;
    let w = img.width().saturating_sub(left + right);
    let h = img.height().saturating_sub(top + bottom);
    if (left, top, w, h) != (0, 0, img.width(), img.height()) {
        img = imageops::crop_imm(&img, left, top, w, h).to_image();
    }

    if params.x_flip {
        imageops::flip_horizontal_in_place(&mut img);
    }
    if params.y_flip {
        imageops::flip_vertical_in_place(&mut img);
    }
    float_image_from_luma(&img)
}
