/// Lightest intensity of the normalized `[0, 1]` range, used as constant fill
/// for samples that fall outside the source image.
pub const BACKGROUND_FILL: f32 = 1.0;

#[derive(Clone, Copy, Debug)]
pub struct FloatImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [f32], // row-major, len = w*h
}

/// Grayscale image with intensities in the normalized `[0, 1]` range.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl FloatImage {
    /// Wrap a row-major buffer. Returns `None` if `data.len() != width * height`.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Option<Self> {
        if width.checked_mul(height)? != data.len() {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn view(&self) -> FloatImageView<'_> {
        FloatImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn same_shape(&self, other: &FloatImage) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&v| v as f64).sum::<f64>() / self.data.len() as f64
    }

    /// Population standard deviation (`ddof = 0`).
    pub fn std(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self
            .data
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.data.len() as f64;
        var.sqrt()
    }
}

#[inline]
fn get_value(src: &FloatImageView<'_>, x: i64, y: i64) -> f32 {
    let x = x.clamp(0, src.width as i64 - 1) as usize;
    let y = y.clamp(0, src.height as i64 - 1) as usize;
    src.data[y * src.width + x]
}

/// Bilinear sample at `(x, y)` in pixel coordinates (pixel centers at integers).
///
/// Points outside `[0, w-1] × [0, h-1]` return `fill`.
#[inline]
pub fn sample_bilinear(src: &FloatImageView<'_>, x: f64, y: f64, fill: f32) -> f32 {
    const EDGE: f64 = 1e-9;
    if src.width == 0 || src.height == 0 || !x.is_finite() || !y.is_finite() {
        return fill;
    }
    let max_x = (src.width - 1) as f64;
    let max_y = (src.height - 1) as f64;
    if x < -EDGE || y < -EDGE || x > max_x + EDGE || y > max_y + EDGE {
        return fill;
    }
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let p00 = get_value(src, x0, y0);
    let p10 = get_value(src, x0 + 1, y0);
    let p01 = get_value(src, x0, y0 + 1);
    let p11 = get_value(src, x0 + 1, y0 + 1);

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}
