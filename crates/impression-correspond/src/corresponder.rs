use crate::clique::{max_clique, CliqueOptions};
use crate::correspondence::{CorrespondFailure, Correspondence, GraphDiagnostics};
use crate::graph::{AngleTolerance, CompatibilityGraph};
use crate::thin::thin_points;
use impression_core::{PointSet, RowCol};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters of the clique corresponders.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliqueParams {
    /// Angle tolerance in radians; values below 0.05 are raised to 0.05.
    pub epsilon: f64,
    /// Seed the clique search with a greedy dive (speed only).
    pub use_dfs: bool,
    /// Thinning radius; `<= 0` disables thinning. Only used by
    /// [`CorresponderKind::CliqueThinned`].
    pub alpha: f64,
}

impl Default for CliqueParams {
    fn default() -> Self {
        Self {
            epsilon: 0.05,
            use_dfs: false,
            alpha: 0.01,
        }
    }
}

impl CliqueParams {
    pub fn tolerance(&self) -> AngleTolerance {
        AngleTolerance::from_epsilon(self.epsilon)
    }

    pub fn thinning_radius(&self) -> f64 {
        self.alpha.max(0.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown corresponder `{0}` (expected one of: dummy, clique1, clique2)")]
pub struct UnknownCorresponder(pub String);

/// Closed set of corresponders.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorresponderKind {
    /// Pairs points index-for-index; a baseline with no search.
    Identity,
    /// Maximum clique on the raw point sets.
    Clique(CliqueParams),
    /// Maximum clique after thinning both sets with radius `alpha`.
    CliqueThinned(CliqueParams),
}

impl CorresponderKind {
    pub fn name(&self) -> &'static str {
        match self {
            CorresponderKind::Identity => "dummy",
            CorresponderKind::Clique(_) => "clique1",
            CorresponderKind::CliqueThinned(_) => "clique2",
        }
    }

    /// Run the corresponder; never fails, see [`Correspondence::success`].
    pub fn correspond(&self, q: &PointSet, k: &PointSet) -> Correspondence {
        let start = Instant::now();
        let result = match self {
            CorresponderKind::Identity => identity_correspondence(&q.points, &k.points),
            CorresponderKind::Clique(params) => {
                clique_correspondence(&q.points, &k.points, params.tolerance(), params.use_dfs)
            }
            CorresponderKind::CliqueThinned(params) => {
                let alpha = params.thinning_radius();
                let q_sep = thin_points(&q.points, alpha);
                let k_sep = thin_points(&k.points, alpha);
                debug!(
                    "thinning at {alpha}: Q {} -> {}, K {} -> {}",
                    q.len(),
                    q_sep.len(),
                    k.len(),
                    k_sep.len()
                );
                clique_correspondence(&q_sep, &k_sep, params.tolerance(), params.use_dfs)
            }
        };
        result.with_elapsed(start.elapsed())
    }
}

impl fmt::Display for CorresponderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CorresponderKind {
    type Err = UnknownCorresponder;

    /// Parse a name into a variant with default parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dummy" => Ok(CorresponderKind::Identity),
            "clique1" => Ok(CorresponderKind::Clique(CliqueParams::default())),
            "clique2" => Ok(CorresponderKind::CliqueThinned(CliqueParams::default())),
            other => Err(UnknownCorresponder(other.to_string())),
        }
    }
}

fn identity_correspondence(q: &[RowCol], k: &[RowCol]) -> Correspondence {
    let n = q.len().min(k.len());
    if q.len() != k.len() {
        warn!("mapping may not be one-to-one (Q: {}, K: {})", q.len(), k.len());
    }
    let diagnostics = GraphDiagnostics {
        upper_bound: n,
        ratio: if n > 0 { 100.0 } else { 0.0 },
        ..GraphDiagnostics::default()
    };
    Correspondence::matched(q[..n].to_vec(), k[..n].to_vec(), diagnostics)
}

/// Maximum-clique correspondence between two point sets.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(q, k), fields(q = q.len(), k = k.len())))]
pub fn clique_correspondence(
    q: &[RowCol],
    k: &[RowCol],
    tolerance: AngleTolerance,
    greedy_seed: bool,
) -> Correspondence {
    if q.len() <= 2 || k.len() <= 2 {
        warn!("not enough interest points (Q: {}, K: {})", q.len(), k.len());
        return Correspondence::failed(
            CorrespondFailure::NotEnoughPoints {
                q: q.len(),
                k: k.len(),
            },
            GraphDiagnostics::default(),
        );
    }

    let graph = match CompatibilityGraph::build(q, k, tolerance) {
        Ok(graph) => graph,
        Err(err) => {
            warn!("unable to construct correspondence graph: {err}");
            return Correspondence::failed(
                CorrespondFailure::GraphConstruction(err.to_string()),
                GraphDiagnostics::default(),
            );
        }
    };
    if graph.n_edges() == 0 {
        warn!("unable to construct correspondence graph: no edges");
        return Correspondence::failed(CorrespondFailure::NoEdges, GraphDiagnostics::default());
    }

    let upper_bound = graph.q_len().min(graph.k_len());
    let mut diagnostics = GraphDiagnostics {
        vertices: graph.n_vertices(),
        edges: graph.n_edges(),
        upper_bound,
        ratio: 0.0,
        density: graph.density(),
    };
    debug!(
        "correspondence graph: V = {}, E = {}, density = {:.6}",
        diagnostics.vertices, diagnostics.edges, diagnostics.density
    );

    let ids = max_clique(
        &graph,
        &CliqueOptions {
            upper_bound,
            greedy_seed,
        },
    );
    if ids.is_empty() {
        warn!("unable to find maximum clique");
        return Correspondence::failed(CorrespondFailure::CliqueSearch, diagnostics);
    }

    let (q_corr, k_corr): (Vec<RowCol>, Vec<RowCol>) = ids
        .iter()
        .map(|&id| {
            let (qi, ki) = graph.decode(id);
            (q[qi], k[ki])
        })
        .unzip();

    diagnostics.ratio = 100.0 * q_corr.len() as f64 / upper_bound as f64;
    Correspondence::matched(q_corr, k_corr, diagnostics)
}
