use crate::{sample_bilinear, FloatImage, FloatImageView};
use nalgebra::{Matrix2, Point2, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

/// Proper rigid motion `q = R(-theta) * k + translation` in `(x, y)` coordinates.
///
/// `theta` is the counter-clockwise angle K is turned by relative to Q, so
/// mapping K back onto Q rotates by `-theta`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    /// Radians in `(-pi, pi]`, always finite.
    pub theta: f64,
    pub translation: Vector2<f64>,
}

impl RigidTransform {
    pub fn new(theta: f64, translation: Vector2<f64>) -> Self {
        let theta = if theta.is_finite() { theta } else { 0.0 };
        Self { theta, translation }
    }

    /// K → Q rotation matrix `R(-theta)`; its determinant is +1 by construction.
    pub fn rotation(&self) -> Matrix2<f64> {
        *Rotation2::new(-self.theta).matrix()
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::from(self.rotation() * p.coords + self.translation)
    }
}

/// Similarity normalization: translate to centroid, scale so the mean
/// distance to the centroid is `sqrt(2)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointNormalization {
    pub center: Vector2<f64>,
    pub scale: f64,
}

impl PointNormalization {
    pub fn identity() -> Self {
        Self {
            center: Vector2::zeros(),
            scale: 1.0,
        }
    }

    pub fn from_points(pts: &[Point2<f64>]) -> Self {
        if pts.is_empty() {
            return Self::identity();
        }
        let n = pts.len() as f64;
        let center = pts.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / n;
        let mean_dist = pts.iter().map(|p| (p.coords - center).norm()).sum::<f64>() / n;
        let scale = if mean_dist > 1e-12 {
            (2.0_f64).sqrt() / mean_dist
        } else {
            1.0
        };
        Self { center, scale }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::from((p.coords - self.center) * self.scale)
    }
}

/// Polynomial mapping of order 2..=4.
///
/// With `(u, v)` the normalized input point, each output coordinate is
/// `sum_{j=0..=order} sum_{i=0..=j} c * u^(j-i) * v^i`, coefficients stored
/// in that term order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolynomialTransform {
    pub order: u8,
    pub coeffs_x: Vec<f64>,
    pub coeffs_y: Vec<f64>,
    pub normalization: PointNormalization,
}

/// Number of monomials of total degree `<= order` in two variables.
pub fn polynomial_term_count(order: u8) -> usize {
    let o = order as usize;
    (o + 1) * (o + 2) / 2
}

/// Highest supported polynomial order.
pub const MAX_POLYNOMIAL_ORDER: u8 = 4;
/// Term count at [`MAX_POLYNOMIAL_ORDER`].
pub const MAX_POLYNOMIAL_TERMS: usize = 15;

/// Evaluate every monomial `u^(j-i) * v^i` in canonical term order.
///
/// Only the first [`polynomial_term_count`]`(order)` entries are written;
/// orders above [`MAX_POLYNOMIAL_ORDER`] are clamped.
pub fn polynomial_terms(order: u8, u: f64, v: f64) -> [f64; MAX_POLYNOMIAL_TERMS] {
    let mut out = [0.0; MAX_POLYNOMIAL_TERMS];
    let mut idx = 0;
    for j in 0..=order.min(MAX_POLYNOMIAL_ORDER) as i32 {
        for i in 0..=j {
            out[idx] = u.powi(j - i) * v.powi(i);
            idx += 1;
        }
    }
    out
}

impl PolynomialTransform {
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let n = self.normalization.apply(p);
        let terms = polynomial_terms(self.order, n.x, n.y);
        let x = terms.iter().zip(&self.coeffs_x).map(|(t, c)| t * c).sum();
        let y = terms.iter().zip(&self.coeffs_y).map(|(t, c)| t * c).sum();
        Point2::new(x, y)
    }
}

/// Immutable K-space → Q-space map in `(x, y)` coordinates.
///
/// The direction is the inverse of the intuitive Q → K alignment: resampling
/// Q into K's frame asks, for each K pixel, where to read in Q.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mapping {
    #[default]
    Identity,
    Rigid(RigidTransform),
    Polynomial(PolynomialTransform),
}

impl Mapping {
    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        match self {
            Mapping::Identity => p,
            Mapping::Rigid(t) => t.apply(p),
            Mapping::Polynomial(t) => t.apply(p),
        }
    }

    pub fn map_points(&self, pts: &[Point2<f64>]) -> Vec<Point2<f64>> {
        pts.iter().map(|&p| self.apply(p)).collect()
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Mapping::Identity)
    }
}

/// Inverse warp: for each output pixel `(x, y)` read `src` at `mapping(x, y)`.
///
/// Output pixels whose source falls outside `src` get `fill`.
pub fn warp_inverse(
    src: &FloatImageView<'_>,
    mapping: &Mapping,
    out_w: usize,
    out_h: usize,
    fill: f32,
) -> FloatImage {
    let mut out = vec![fill; out_w * out_h];

    for y in 0..out_h {
        for x in 0..out_w {
            let ps = mapping.apply(Point2::new(x as f64, y as f64));
            out[y * out_w + x] = sample_bilinear(src, ps.x, ps.y, fill);
        }
    }

    FloatImage {
        width: out_w,
        height: out_h,
        data: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BACKGROUND_FILL;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn rigid_rotation_is_proper() {
        for theta in [-2.5, -0.3, 0.0, 1.0, 3.1] {
            let t = RigidTransform::new(theta, Vector2::new(1.0, 2.0));
            assert_abs_diff_eq!(t.rotation().determinant(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn non_finite_theta_becomes_zero() {
        let t = RigidTransform::new(f64::NAN, Vector2::zeros());
        assert_eq!(t.theta, 0.0);
    }

    #[test]
    fn rigid_apply_undoes_the_k_turn() {
        let t = RigidTransform::new(FRAC_PI_2, Vector2::new(10.0, 0.0));
        let p = t.apply(Point2::new(1.0, 0.0));
        assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn terms_fill_a_fixed_buffer_in_canonical_order() {
        let t = polynomial_terms(2, 2.0, 3.0);
        assert_eq!(&t[..6], &[1.0, 2.0, 3.0, 4.0, 6.0, 9.0]);
        assert!(t[6..].iter().all(|&x| x == 0.0));
        let t4 = polynomial_terms(4, 2.0, 3.0);
        assert_eq!(t4[14], 81.0);
        assert_eq!(t4[10], 16.0);
    }

    #[test]
    fn polynomial_with_linear_terms_is_affine() {
        // x' = 2 + u, y' = -1 + v
        let t = PolynomialTransform {
            order: 2,
            coeffs_x: vec![2.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            coeffs_y: vec![-1.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            normalization: PointNormalization::identity(),
        };
        assert_eq!(t.apply(Point2::new(3.0, 4.0)), Point2::new(5.0, 3.0));
        assert_eq!(polynomial_term_count(4), 15);
    }

    #[test]
    fn normalization_has_unit_mean_radius_sqrt2() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ];
        let n = PointNormalization::from_points(&pts);
        let mean = pts.iter().map(|&p| n.apply(p).coords.norm()).sum::<f64>() / 4.0;
        assert_abs_diff_eq!(mean, 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn identity_warp_reproduces_image() {
        let img = FloatImage::from_fn(7, 5, |x, y| ((x * 3 + y) % 5) as f32 / 4.0);
        let out = warp_inverse(&img.view(), &Mapping::Identity, 7, 5, BACKGROUND_FILL);
        assert_eq!(out, img);
    }

    #[test]
    fn shifted_warp_fills_background() {
        let img = FloatImage::filled(4, 4, 0.0);
        let shift = Mapping::Rigid(RigidTransform::new(0.0, Vector2::new(2.0, 0.0)));
        let out = warp_inverse(&img.view(), &shift, 4, 4, BACKGROUND_FILL);
        assert_eq!(out.get(1, 0), Some(0.0));
        assert_eq!(out.get(2, 0), Some(BACKGROUND_FILL));
        assert_eq!(out.get(3, 3), Some(BACKGROUND_FILL));
    }
}
