//! Compatibility graph over candidate point pairs.
//!
//! Vertex `(q, k)` proposes that Q point `q` and K point `k` are the same
//! physical feature. Two proposals are adjacent when they use different Q
//! points, different K points, and the displacement between their Q points
//! has the same direction as the displacement between their K points (up to
//! the angle tolerance). A clique is then a one-to-one matching in which all
//! displacements agree, so its size is bounded by `min(|Q|, |K|)`.

use impression_core::RowCol;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Smallest accepted angle tolerance, in radians.
pub const MIN_ANGLE_TOLERANCE: f64 = 0.05;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("vertex count {q} x {k} does not fit 32-bit vertex ids")]
    TooManyVertices { q: usize, k: usize },
}

/// Angle window `|theta| <= radians` around zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleTolerance {
    radians: f64,
}

impl AngleTolerance {
    /// Tolerance from a user epsilon, clamped from below to
    /// [`MIN_ANGLE_TOLERANCE`]. NaN falls back to the minimum.
    pub fn from_epsilon(epsilon: f64) -> Self {
        let radians = if epsilon.is_nan() {
            MIN_ANGLE_TOLERANCE
        } else {
            epsilon.max(MIN_ANGLE_TOLERANCE)
        };
        Self { radians }
    }

    #[inline]
    pub fn radians(&self) -> f64 {
        self.radians
    }

    #[inline]
    pub fn accepts(&self, theta: f64) -> bool {
        theta.abs() <= self.radians
    }
}

/// Signed rotation in `(-π, π]` that turns `dq` onto `dk`.
///
/// With `dq = (a, b)`, the row vector `dk` is multiplied by
/// `[[-a, -b], [-b, a]]`; the result `(res0, res1) = (-dq·dk, dq×dk)` gives
/// the angle as `π - atan2(res1, res0)`. Zero-length displacements give NaN,
/// which no tolerance accepts.
pub fn angle_between(dq: [f64; 2], dk: [f64; 2]) -> f64 {
    let [a, b] = dq;
    if (a == 0.0 && b == 0.0) || (dk[0] == 0.0 && dk[1] == 0.0) {
        return f64::NAN;
    }
    let res0 = -a * dk[0] - b * dk[1];
    let res1 = -b * dk[0] + a * dk[1];
    let theta = PI - res1.atan2(res0);
    if theta > PI {
        theta - 2.0 * PI
    } else {
        theta
    }
}

#[inline]
fn diff(a: &RowCol, b: &RowCol) -> [f64; 2] {
    [b[0] - a[0], b[1] - a[1]]
}

#[derive(Clone, Debug)]
pub struct CompatibilityGraph {
    n_q: usize,
    n_k: usize,
    /// Sorted 0-based neighbor indices per 0-based vertex.
    adjacency: Vec<Vec<u32>>,
    n_edges: usize,
}

impl CompatibilityGraph {
    /// Build the graph over the full product `Q × K`.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(q, k), fields(q = q.len(), k = k.len())))]
    pub fn build(
        q: &[RowCol],
        k: &[RowCol],
        tolerance: AngleTolerance,
    ) -> Result<Self, GraphError> {
        let n_q = q.len();
        let n_k = k.len();
        let n_vertices = n_q
            .checked_mul(n_k)
            .filter(|&v| v < u32::MAX as usize)
            .ok_or(GraphError::TooManyVertices { q: n_q, k: n_k })?;

        let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); n_vertices];
        let mut n_edges = 0usize;

        for qa in 0..n_q {
            for qb in (qa + 1)..n_q {
                let dq = diff(&q[qa], &q[qb]);
                for ka in 0..n_k {
                    for kb in 0..n_k {
                        if ka == kb {
                            continue;
                        }
                        let dk = diff(&k[ka], &k[kb]);
                        if !tolerance.accepts(angle_between(dq, dk)) {
                            continue;
                        }
                        let va = qa * n_k + ka;
                        let vb = qb * n_k + kb;
                        adjacency[va].push(vb as u32);
                        adjacency[vb].push(va as u32);
                        n_edges += 1;
                    }
                }
            }
        }

        for list in &mut adjacency {
            list.sort_unstable();
        }

        Ok(Self {
            n_q,
            n_k,
            adjacency,
            n_edges,
        })
    }

    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.adjacency.len()
    }

    #[inline]
    pub fn n_edges(&self) -> usize {
        self.n_edges
    }

    /// Number of Q points the graph was built over.
    pub fn q_len(&self) -> usize {
        self.n_q
    }

    /// Number of K points the graph was built over.
    pub fn k_len(&self) -> usize {
        self.n_k
    }

    /// Edge density `2E / (V (V - 1))`; zero for graphs with fewer than two vertices.
    pub fn density(&self) -> f64 {
        let v = self.n_vertices() as f64;
        if v < 2.0 {
            return 0.0;
        }
        2.0 * self.n_edges as f64 / (v * (v - 1.0))
    }

    /// 1-based vertex id of the pair `(q_index, k_index)`.
    #[inline]
    pub fn vertex_id(&self, q_index: usize, k_index: usize) -> u32 {
        (q_index * self.n_k + k_index + 1) as u32
    }

    /// `(q_index, k_index)` of a 1-based vertex id: `((id-1) / n, (id-1) % n)`.
    #[inline]
    pub fn decode(&self, id: u32) -> (usize, usize) {
        let v = id as usize - 1;
        (v / self.n_k, v % self.n_k)
    }

    /// Neighbors of a 0-based vertex index, as sorted 0-based indices.
    #[inline]
    pub fn neighbors(&self, vertex: usize) -> &[u32] {
        &self.adjacency[vertex]
    }

    /// Whether the 0-based vertices `a` and `b` are adjacent.
    pub fn adjacent(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].binary_search(&(b as u32)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn square() -> Vec<RowCol> {
        vec![[0.0, 0.0], [0.0, 10.0], [10.0, 0.0], [10.0, 10.0]]
    }

    #[test]
    fn tolerance_has_a_floor() {
        assert_eq!(AngleTolerance::from_epsilon(0.0).radians(), MIN_ANGLE_TOLERANCE);
        assert_eq!(AngleTolerance::from_epsilon(0.3).radians(), 0.3);
        assert_eq!(AngleTolerance::from_epsilon(f64::NAN).radians(), MIN_ANGLE_TOLERANCE);
    }

    #[test]
    fn angle_of_parallel_displacements_is_zero() {
        assert_abs_diff_eq!(angle_between([1.0, 2.0], [2.0, 4.0]), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angle_between([1.0, 0.0], [0.0, 1.0]), FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(angle_between([1.0, 0.0], [0.0, -1.0]), -FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(angle_between([1.0, 0.0], [-1.0, 0.0]).abs(), PI, epsilon = 1e-12);
        assert!(angle_between([0.0, 0.0], [1.0, 0.0]).is_nan());
    }

    #[test]
    fn vertex_ids_round_trip_through_decode() {
        let g = CompatibilityGraph::build(&square(), &square()[..3], AngleTolerance::from_epsilon(0.1))
            .expect("graph");
        assert_eq!(g.n_vertices(), 12);
        assert_eq!((g.q_len(), g.k_len()), (4, 3));
        for qi in 0..4 {
            for ki in 0..3 {
                assert_eq!(g.decode(g.vertex_id(qi, ki)), (qi, ki));
            }
        }
        assert_eq!(g.vertex_id(0, 0), 1);
        assert_eq!(g.decode(4), (1, 0));
    }

    #[test]
    fn pairs_sharing_a_point_are_never_adjacent() {
        let g = CompatibilityGraph::build(&square(), &square(), AngleTolerance::from_epsilon(3.5))
            .expect("graph");
        for v in 0..g.n_vertices() {
            let (qv, kv) = (v / 4, v % 4);
            for &u in g.neighbors(v) {
                let (qu, ku) = (u as usize / 4, u as usize % 4);
                assert_ne!(qv, qu);
                assert_ne!(kv, ku);
            }
        }
        // Every permissible pair is adjacent under a tolerance above π.
        assert_eq!(g.n_edges(), (16 * 9) / 2);
    }

    #[test]
    fn identity_pairs_are_mutually_adjacent() {
        let g = CompatibilityGraph::build(&square(), &square(), AngleTolerance::from_epsilon(0.1))
            .expect("graph");
        for a in 0..4 {
            for b in (a + 1)..4 {
                assert!(g.adjacent(a * 4 + a, b * 4 + b));
            }
        }
        assert!(g.density() > 0.0 && g.density() <= 1.0);
    }
}
