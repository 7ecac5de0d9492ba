use crate::inputs::ScoreInputs;
use kiddo::{KdTree, SquaredEuclidean};
use log::debug;
use nalgebra::Point2;

/// Q must have more points than this for the clique and median metrics.
const MIN_Q_POINTS: usize = 3;
/// Q must have more points than this for the overlap metric.
const MIN_Q_POINTS_OVERLAP: usize = 10;
/// Fewest mutual matches the overlap metric reports a value for.
const MIN_OVERLAP_MATCHES: usize = 10;

/// A mutual nearest-neighbour pair between Q and mapped K points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointMatch {
    pub q: usize,
    pub k: usize,
    pub distance: f64,
}

fn build_tree(points: &[Point2<f64>]) -> KdTree<f64, 2> {
    let mut tree: KdTree<f64, 2> = KdTree::new();
    for (i, p) in points.iter().enumerate() {
        if p.x.is_finite() && p.y.is_finite() {
            tree.add(&[p.x, p.y], i as u64);
        }
    }
    tree
}

fn has_finite(points: &[Point2<f64>]) -> bool {
    points.iter().any(|p| p.x.is_finite() && p.y.is_finite())
}

/// Cross-checked nearest-neighbour matching.
///
/// `q[i]` and `k[j]` match when each is the other's nearest neighbour and
/// their distance is strictly below `max_distance`. Non-finite points never
/// match. Output is ordered by Q index.
pub fn match_mutual_nearest(
    q: &[Point2<f64>],
    k: &[Point2<f64>],
    max_distance: f64,
) -> Vec<PointMatch> {
    if !has_finite(q) || !has_finite(k) || !(max_distance > 0.0) {
        return Vec::new();
    }
    let q_tree = build_tree(q);
    let k_tree = build_tree(k);

    let mut matches = Vec::new();
    for (i, p) in q.iter().enumerate() {
        if !(p.x.is_finite() && p.y.is_finite()) {
            continue;
        }
        let to_k = k_tree.nearest_one::<SquaredEuclidean>(&[p.x, p.y]);
        let j = to_k.item as usize;
        let back = q_tree.nearest_one::<SquaredEuclidean>(&[k[j].x, k[j].y]);
        if back.item as usize != i {
            continue;
        }
        let distance = to_k.distance.sqrt();
        if distance < max_distance {
            matches.push(PointMatch {
                q: i,
                k: j,
                distance,
            });
        }
    }
    matches
}

fn mapped_matches(inputs: &ScoreInputs<'_>) -> Vec<PointMatch> {
    let q_xy = inputs.q.xy();
    let k_in_q = inputs.mapping.map_points(&inputs.k.xy());
    match_mutual_nearest(&q_xy, &k_in_q, inputs.epsilon)
}

/// Size of the correspondence; 0 when Q has 3 points or fewer.
pub fn clique_size(inputs: &ScoreInputs<'_>) -> f64 {
    if inputs.q.len() <= MIN_Q_POINTS {
        return 0.0;
    }
    inputs.correspondence.size() as f64
}

/// Share of Q's points that made it into the correspondence.
pub fn clique_fraction(inputs: &ScoreInputs<'_>) -> f64 {
    if inputs.q.len() <= MIN_Q_POINTS {
        return 0.0;
    }
    inputs.correspondence.size() as f64 / inputs.q.len() as f64
}

/// Fraction of Q points with a mapped K point within `epsilon`.
///
/// K points are carried into Q's frame by the mapping and matched to Q by
/// mutual nearest neighbour. Returns 0 when Q has 10 points or fewer, or
/// fewer than 10 matches are found.
pub fn overlap_percentage(inputs: &ScoreInputs<'_>) -> f64 {
    if inputs.q.len() <= MIN_Q_POINTS_OVERLAP {
        return 0.0;
    }
    let matches = mapped_matches(inputs);
    if matches.len() < MIN_OVERLAP_MATCHES {
        debug!("overlap: only {} matches within {}", matches.len(), inputs.epsilon);
        return 0.0;
    }
    matches.len() as f64 / inputs.q.len() as f64
}

/// `1 / (1 + median residual)` over the mutual matches, in `(0, 1]`.
///
/// Returns 0 when Q has 3 points or fewer or nothing matches.
pub fn median_distance(inputs: &ScoreInputs<'_>) -> f64 {
    if inputs.q.len() <= MIN_Q_POINTS {
        return 0.0;
    }
    let mut distances: Vec<f64> = mapped_matches(inputs).iter().map(|m| m.distance).collect();
    if distances.is_empty() {
        debug!("median distance: no matches within {}", inputs.epsilon);
        return 0.0;
    }
    distances.sort_by(f64::total_cmp);
    let n = distances.len();
    let median = if n % 2 == 1 {
        distances[n / 2]
    } else {
        0.5 * (distances[n / 2 - 1] + distances[n / 2])
    };
    1.0 / (1.0 + median)
}

/// Seconds the corresponder took.
pub fn elapsed(inputs: &ScoreInputs<'_>) -> f64 {
    inputs.correspondence.elapsed.as_secs_f64()
}
