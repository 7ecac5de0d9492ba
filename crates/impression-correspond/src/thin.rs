use impression_core::RowCol;
use kiddo::{KdTree, SquaredEuclidean};

/// Remove near-duplicate points.
///
/// A point is dropped when an earlier *kept* point lies within `alpha`
/// (inclusive). Input order decides who wins. `alpha <= 0` (or NaN) disables
/// thinning. Thinning an already thinned set with the same radius is a no-op:
/// every surviving pair is more than `alpha` apart.
pub fn thin_points(points: &[RowCol], alpha: f64) -> Vec<RowCol> {
    if !(alpha > 0.0) || points.len() < 2 {
        return points.to_vec();
    }

    let r2 = alpha * alpha;
    let mut kept: Vec<RowCol> = Vec::with_capacity(points.len());
    let mut tree: KdTree<f64, 2> = KdTree::new();

    for p in points {
        // The tree answers "who is roughly near"; the exact radius test
        // below decides, so the query radius is padded slightly.
        let nearby = tree.within_unsorted::<SquaredEuclidean>(p, r2 * (1.0 + 1e-9) + 1e-12);
        let crowded = nearby.iter().any(|nn| {
            let q = kept[nn.item as usize];
            let d0 = p[0] - q[0];
            let d1 = p[1] - q[1];
            d0 * d0 + d1 * d1 <= r2
        });
        if !crowded {
            tree.add(p, kept.len() as u64);
            kept.push(*p);
        }
    }

    kept
}
