use crate::error::ScoreError;
use crate::inputs::ScoreInputs;
use impression_core::FloatImage;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Cross-power magnitudes below this are clamped before normalization.
const POC_MAGNITUDE_FLOOR: f64 = 1e-9;
/// Standard deviations of zero are replaced by this in feature NCC.
const FEATURE_STD_FLOOR: f64 = 1e-10;

/// How the standard deviation is taken when z-scoring an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Spread {
    /// Population std; a flat image normalizes to all zeros.
    Population,
    /// Sample std (`n - 1`) floored at [`FEATURE_STD_FLOOR`].
    SampleFloored,
}

pub(crate) fn check_shapes(a: &FloatImage, b: &FloatImage) -> Result<(), ScoreError> {
    if !a.same_shape(b) {
        return Err(ScoreError::ShapeMismatch {
            q_width: a.width,
            q_height: a.height,
            k_width: b.width,
            k_height: b.height,
        });
    }
    if a.is_empty() {
        return Err(ScoreError::EmptyImage);
    }
    Ok(())
}

fn zscore(img: &FloatImage, spread: Spread) -> Vec<f64> {
    let n = img.data.len();
    let mean = img.mean();
    let std = match spread {
        Spread::Population => img.std(),
        Spread::SampleFloored => {
            let ss: f64 = img.data.iter().map(|&v| (v as f64 - mean).powi(2)).sum();
            let s = if n > 1 { (ss / (n - 1) as f64).sqrt() } else { 0.0 };
            if s == 0.0 {
                FEATURE_STD_FLOOR
            } else {
                s
            }
        }
    };
    if std == 0.0 || !std.is_finite() {
        return vec![0.0; n];
    }
    img.data.iter().map(|&v| (v as f64 - mean) / std).collect()
}

/// Mean of the elementwise product of two z-scored images.
pub(crate) fn ncc(a: &FloatImage, b: &FloatImage, spread: Spread) -> Result<f64, ScoreError> {
    check_shapes(a, b)?;
    let za = zscore(a, spread);
    let zb = zscore(b, spread);
    let sum: f64 = za.iter().zip(&zb).map(|(x, y)| x * y).sum();
    Ok(sum / za.len() as f64)
}

fn to_complex(img: &FloatImage) -> Vec<Complex<f64>> {
    img.data.iter().map(|&v| Complex::new(v as f64, 0.0)).collect()
}

fn transpose(src: &[Complex<f64>], width: usize, height: usize) -> Vec<Complex<f64>> {
    let mut out = vec![Complex::new(0.0, 0.0); src.len()];
    for y in 0..height {
        for x in 0..width {
            out[x * height + y] = src[y * width + x];
        }
    }
    out
}

/// In-place unnormalized 2-D FFT of a row-major `width x height` buffer.
fn fft2(
    planner: &mut FftPlanner<f64>,
    data: &mut Vec<Complex<f64>>,
    width: usize,
    height: usize,
    inverse: bool,
) {
    let (rows, cols) = if inverse {
        (planner.plan_fft_inverse(width), planner.plan_fft_inverse(height))
    } else {
        (planner.plan_fft_forward(width), planner.plan_fft_forward(height))
    };
    rows.process(data);
    let mut t = transpose(data, width, height);
    cols.process(&mut t);
    *data = transpose(&t, height, width);
}

/// Phase-only correlation peak.
///
/// The cross-power spectrum `F(a) * conj(F(b))` is normalized by its
/// magnitude (floored), transformed back, and the largest real part is
/// returned. Identical textured images score 1.
pub(crate) fn poc(a: &FloatImage, b: &FloatImage) -> Result<f64, ScoreError> {
    check_shapes(a, b)?;
    let (w, h) = (a.width, a.height);
    let mut planner = FftPlanner::new();

    let mut fa = to_complex(a);
    let mut fb = to_complex(b);
    fft2(&mut planner, &mut fa, w, h, false);
    fft2(&mut planner, &mut fb, w, h, false);

    let mut cross: Vec<Complex<f64>> = fa
        .iter()
        .zip(&fb)
        .map(|(x, y)| {
            let p = x * y.conj();
            p / p.norm().max(POC_MAGNITUDE_FLOOR)
        })
        .collect();
    fft2(&mut planner, &mut cross, w, h, true);

    let scale = (w * h) as f64;
    Ok(cross
        .iter()
        .map(|c| c.re / scale)
        .fold(f64::NEG_INFINITY, f64::max))
}

/// Normalized cross-correlation of aligned Q against K.
///
/// Both images are z-scored with the population std; a flat image scores 0.
pub fn image_ncc(inputs: &ScoreInputs<'_>) -> Result<f64, ScoreError> {
    ncc(inputs.aligned_q, &inputs.k.image, Spread::Population)
}

/// Phase-only correlation peak of aligned Q against K.
pub fn image_poc(inputs: &ScoreInputs<'_>) -> Result<f64, ScoreError> {
    poc(inputs.aligned_q, &inputs.k.image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn texture(w: usize, h: usize, seed: u32) -> FloatImage {
        FloatImage::from_fn(w, h, |x, y| {
            let mut s = (x as u64) << 32 | (y as u64) << 8 | seed as u64;
            s = s.wrapping_mul(0x9e37_79b9_7f4a_7c15);
            s ^= s >> 29;
            s = s.wrapping_mul(0xbf58_476d_1ce4_e5b9);
            s ^= s >> 32;
            0.1 + (s % 1000) as f32 / 1250.0
        })
    }

    #[test]
    fn ncc_of_identical_images_is_one() {
        let img = texture(13, 9, 1);
        assert_relative_eq!(ncc(&img, &img, Spread::Population).expect("ncc"), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn ncc_of_inverted_image_is_minus_one() {
        let img = texture(8, 8, 2);
        let inv = FloatImage::from_fn(8, 8, |x, y| 1.0 - img.get(x, y).unwrap_or(0.0));
        assert_relative_eq!(ncc(&img, &inv, Spread::Population).expect("ncc"), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn flat_image_scores_zero() {
        let img = texture(6, 5, 3);
        let flat = FloatImage::filled(6, 5, 0.5);
        assert_eq!(ncc(&img, &flat, Spread::Population).expect("ncc"), 0.0);
        assert_eq!(ncc(&flat, &flat, Spread::SampleFloored).expect("ncc"), 0.0);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let a = texture(6, 5, 3);
        let b = texture(5, 6, 3);
        assert!(matches!(
            ncc(&a, &b, Spread::Population),
            Err(ScoreError::ShapeMismatch { .. })
        ));
        assert!(poc(&a, &b).is_err());
        let empty = FloatImage::filled(0, 0, 0.0);
        assert_eq!(poc(&empty, &empty), Err(ScoreError::EmptyImage));
    }

    #[test]
    fn sample_std_ncc_is_scaled_population_ncc() {
        let a = texture(7, 7, 4);
        let b = texture(7, 7, 9);
        let n = 49.0;
        let pop = ncc(&a, &b, Spread::Population).expect("ncc");
        let sample = ncc(&a, &b, Spread::SampleFloored).expect("ncc");
        assert_relative_eq!(sample, pop * (n - 1.0) / n, epsilon = 1e-9);
    }

    #[test]
    fn poc_of_identical_images_is_one() {
        let img = texture(12, 10, 5);
        assert_relative_eq!(poc(&img, &img).expect("poc"), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn poc_peak_survives_circular_shift() {
        let img = texture(16, 8, 6);
        let shifted = FloatImage::from_fn(16, 8, |x, y| img.get((x + 3) % 16, (y + 2) % 8).unwrap_or(0.0));
        assert_relative_eq!(poc(&img, &shifted).expect("poc"), 1.0, epsilon = 1e-9);
    }
}
