use impression_core::{rc_to_xy, Mapping, RigidTransform, RowCol};
use log::warn;
use nalgebra::{Matrix2, Point2, Vector2};

fn centroid(pts: &[Point2<f64>]) -> Vector2<f64> {
    let sum = pts.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords);
    sum / pts.len() as f64
}

/// Least-squares rotation + translation taking `k` onto `q` (`q ≈ R k + t`).
///
/// The reported `theta` is the angle K is turned by relative to Q, so
/// `R = R(-theta)`.
///
/// Both slices are `(x, y)` points and index-aligned. The reflection case is
/// folded back into a proper rotation through the sign of `det(V U^T)`.
/// Returns `None` when the input is empty, mismatched, or the rotation is
/// not finite.
pub fn estimate_rigid(q: &[Point2<f64>], k: &[Point2<f64>]) -> Option<RigidTransform> {
    if q.is_empty() || q.len() != k.len() {
        return None;
    }

    let q_cent = centroid(q);
    let k_cent = centroid(k);

    // Cross-covariance H = K_centered^T * Q_centered.
    let mut h = Matrix2::<f64>::zeros();
    for (pq, pk) in q.iter().zip(k) {
        h += (pk.coords - k_cent) * (pq.coords - q_cent).transpose();
    }

    if !h.iter().all(|x| x.is_finite()) {
        return None;
    }
    let svd = h.try_svd(true, true, f64::EPSILON, 1000)?;
    let u = svd.u?;
    let v = svd.v_t?.transpose();
    let d = if (v * u.transpose()).determinant() > 0.0 {
        1.0
    } else {
        -1.0
    };
    let rot = v * Matrix2::new(1.0, 0.0, 0.0, d) * u.transpose();

    if !rot.iter().all(|x| x.is_finite()) {
        return None;
    }

    // `rot` turns K onto Q; theta is the turn of K relative to Q, read off
    // the transpose.
    let mut theta = rot[(0, 1)].atan2(rot[(0, 0)]);
    if !theta.is_finite() {
        theta = 0.0;
    }

    let translation = q_cent - rot * k_cent;
    Some(RigidTransform::new(theta, translation))
}

/// Rigid K → Q mapping from index-aligned `(row, col)` correspondence points.
///
/// Degenerate input falls back to the identity mapping with a warning.
pub fn kabsch(q: &[RowCol], k: &[RowCol]) -> Mapping {
    match estimate_rigid(&rc_to_xy(q), &rc_to_xy(k)) {
        Some(t) => Mapping::Rigid(t),
        None => {
            warn!("degenerate rigid alignment; using identity mapping");
            Mapping::Identity
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Rotation2;

    fn cloud() -> Vec<Point2<f64>> {
        vec![
            Point2::new(3.0, 1.0),
            Point2::new(-2.0, 7.5),
            Point2::new(11.0, 4.0),
            Point2::new(6.0, -5.0),
            Point2::new(0.5, 0.25),
        ]
    }

    #[test]
    fn recovers_known_motion() {
        for theta0 in [-2.8, -1.0, 0.0, 0.4, 1.9, 3.0] {
            let t0 = Vector2::new(12.5, -7.0);
            let r0 = Rotation2::new(-theta0);
            let k = cloud();
            let q: Vec<Point2<f64>> = k.iter().map(|p| Point2::from(r0 * p.coords + t0)).collect();

            let est = estimate_rigid(&q, &k).expect("estimate");
            assert_abs_diff_eq!(est.theta, theta0, epsilon = 1e-9);
            assert_abs_diff_eq!(est.translation, t0, epsilon = 1e-9);
            assert_abs_diff_eq!(est.rotation().determinant(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn theta_is_the_turn_of_k_relative_to_q() {
        let q = cloud();
        let r = Rotation2::new(0.7);
        let k: Vec<Point2<f64>> = q.iter().map(|p| Point2::from(r * p.coords)).collect();
        let est = estimate_rigid(&q, &k).expect("estimate");
        assert_abs_diff_eq!(est.theta, 0.7, epsilon = 1e-9);
        for (pk, pq) in k.iter().zip(&q) {
            assert_abs_diff_eq!(est.apply(*pk), *pq, epsilon = 1e-9);
        }
    }

    #[test]
    fn mirrored_input_still_yields_a_rotation() {
        let k = cloud();
        let q: Vec<Point2<f64>> = k.iter().map(|p| Point2::new(-p.x, p.y)).collect();
        let est = estimate_rigid(&q, &k).expect("estimate");
        assert_abs_diff_eq!(est.rotation().determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn collinear_input_gives_finite_theta() {
        let k: Vec<Point2<f64>> = (0..4).map(|i| Point2::new(i as f64, 0.0)).collect();
        let q = k.clone();
        let est = estimate_rigid(&q, &k).expect("estimate");
        assert!(est.theta.is_finite());
        for (pk, pq) in k.iter().zip(&q) {
            assert_abs_diff_eq!(est.apply(*pk), *pq, epsilon = 1e-9);
        }
    }

    #[test]
    fn non_finite_points_fall_back_to_identity() {
        let q = vec![[f64::NAN, 0.0], [1.0, 1.0], [2.0, 0.0]];
        let k = vec![[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]];
        assert_eq!(kabsch(&q, &k), Mapping::Identity);
    }
}
