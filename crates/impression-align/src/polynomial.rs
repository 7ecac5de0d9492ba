use crate::method::PolynomialOrder;
use impression_core::{
    polynomial_term_count, polynomial_terms, PointNormalization, PolynomialTransform,
};
use nalgebra::{DMatrix, DVector, Point2};

/// Least-squares polynomial map taking `k` onto `q`, both `(x, y)` and
/// index-aligned.
///
/// K coordinates are normalized (centroid, mean radius `sqrt(2)`) before the
/// monomials are formed. Underdetermined systems get the minimum-norm
/// solution. Returns `None` on mismatched input or a non-finite fit.
pub fn fit_polynomial(
    q: &[Point2<f64>],
    k: &[Point2<f64>],
    order: PolynomialOrder,
) -> Option<PolynomialTransform> {
    if k.is_empty() || q.len() != k.len() {
        return None;
    }
    let order = order.get();
    let normalization = PointNormalization::from_points(k);
    let terms = polynomial_term_count(order);

    let mut a = DMatrix::<f64>::zeros(k.len(), terms);
    let mut bx = DVector::<f64>::zeros(k.len());
    let mut by = DVector::<f64>::zeros(k.len());
    for (row, (pk, pq)) in k.iter().zip(q).enumerate() {
        let n = normalization.apply(*pk);
        let row_terms = polynomial_terms(order, n.x, n.y);
        for (col, t) in row_terms.into_iter().take(terms).enumerate() {
            a[(row, col)] = t;
        }
        bx[row] = pq.x;
        by[row] = pq.y;
    }

    if !a.iter().chain(bx.iter()).chain(by.iter()).all(|v| v.is_finite()) {
        return None;
    }

    let svd = a.try_svd(true, true, f64::EPSILON, 10_000)?;
    let cx = svd.solve(&bx, 1e-10).ok()?;
    let cy = svd.solve(&by, 1e-10).ok()?;
    if !cx.iter().chain(cy.iter()).all(|v| v.is_finite()) {
        return None;
    }

    Some(PolynomialTransform {
        order,
        coeffs_x: cx.iter().copied().collect(),
        coeffs_y: cy.iter().copied().collect(),
        normalization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn grid() -> Vec<Point2<f64>> {
        (0..5)
            .flat_map(|j| (0..5).map(move |i| Point2::new(i as f64 * 20.0 + 3.0, j as f64 * 15.0 - 4.0)))
            .collect()
    }

    #[test]
    fn reproduces_a_quadratic_warp() {
        let warp = |p: Point2<f64>| {
            Point2::new(
                5.0 + 1.1 * p.x - 0.2 * p.y + 0.001 * p.x * p.x,
                -3.0 + 0.1 * p.x + 0.95 * p.y + 0.002 * p.x * p.y,
            )
        };
        let k = grid();
        let q: Vec<Point2<f64>> = k.iter().map(|&p| warp(p)).collect();

        for order in [2, 3, 4] {
            let order = PolynomialOrder::new(order).expect("valid order");
            let t = fit_polynomial(&q, &k, order).expect("fit");
            for &p in &[Point2::new(10.0, 10.0), Point2::new(60.0, 40.0)] {
                assert_abs_diff_eq!(t.apply(p), warp(p), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn mismatched_lengths_fail() {
        let k = grid();
        let order = PolynomialOrder::new(2).expect("valid order");
        assert!(fit_polynomial(&k[..3], &k, order).is_none());
        assert!(fit_polynomial(&[], &[], order).is_none());
    }
}
