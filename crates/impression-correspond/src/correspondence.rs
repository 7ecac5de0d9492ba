use impression_core::RowCol;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a correspondence could not be established. All of these are
/// recoverable: the caller gets a failed [`Correspondence`], not an error.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrespondFailure {
    #[error("not enough interest points (Q: {q}, K: {k})")]
    NotEnoughPoints { q: usize, k: usize },
    #[error("unable to construct correspondence graph: {0}")]
    GraphConstruction(String),
    #[error("correspondence graph has no edges")]
    NoEdges,
    #[error("unable to find maximum clique")]
    CliqueSearch,
}

/// Graph statistics kept on both success and failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDiagnostics {
    pub vertices: usize,
    pub edges: usize,
    /// `min(|Q|, |K|)` after thinning; clique size cannot exceed it.
    pub upper_bound: usize,
    /// `100 * size / upper_bound`.
    pub ratio: f64,
    /// `2E / (V (V - 1))`; informational only.
    pub density: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CorrespondenceOutcome {
    /// Index-aligned matched points: `q[i]` corresponds to `k[i]`.
    Matched { q: Vec<RowCol>, k: Vec<RowCol> },
    Failed { reason: CorrespondFailure },
}

/// Result of one corresponder run on a pair of point sets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    pub outcome: CorrespondenceOutcome,
    pub diagnostics: GraphDiagnostics,
    pub elapsed: Duration,
}

/// Placeholder point set returned by accessors on failure.
const PLACEHOLDER: [RowCol; 1] = [[0.0, 0.0]];

impl Correspondence {
    /// A one-to-one matching. `q` and `k` must have equal length.
    pub fn matched(q: Vec<RowCol>, k: Vec<RowCol>, diagnostics: GraphDiagnostics) -> Self {
        debug_assert_eq!(q.len(), k.len(), "matching must be one-to-one");
        Self {
            outcome: CorrespondenceOutcome::Matched { q, k },
            diagnostics,
            elapsed: Duration::ZERO,
        }
    }

    pub fn failed(reason: CorrespondFailure, diagnostics: GraphDiagnostics) -> Self {
        Self {
            outcome: CorrespondenceOutcome::Failed { reason },
            diagnostics,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    #[inline]
    pub fn success(&self) -> bool {
        matches!(self.outcome, CorrespondenceOutcome::Matched { .. })
    }

    /// Number of matched pairs; zero on failure.
    pub fn size(&self) -> usize {
        match &self.outcome {
            CorrespondenceOutcome::Matched { q, .. } => q.len(),
            CorrespondenceOutcome::Failed { .. } => 0,
        }
    }

    /// Matched Q points, or a single `[0, 0]` placeholder on failure.
    pub fn q(&self) -> &[RowCol] {
        match &self.outcome {
            CorrespondenceOutcome::Matched { q, .. } => q,
            CorrespondenceOutcome::Failed { .. } => &PLACEHOLDER,
        }
    }

    /// Matched K points, or a single `[0, 0]` placeholder on failure.
    pub fn k(&self) -> &[RowCol] {
        match &self.outcome {
            CorrespondenceOutcome::Matched { k, .. } => k,
            CorrespondenceOutcome::Failed { .. } => &PLACEHOLDER,
        }
    }

    pub fn failure(&self) -> Option<&CorrespondFailure> {
        match &self.outcome {
            CorrespondenceOutcome::Matched { .. } => None,
            CorrespondenceOutcome::Failed { reason } => Some(reason),
        }
    }

    /// Flat row for tabular aggregation; every field is present on failure.
    pub fn record(&self) -> CorrespondenceRecord {
        CorrespondenceRecord {
            success: self.success(),
            size: self.size(),
            graph_v: self.diagnostics.vertices,
            graph_e: self.diagnostics.edges,
            ub: self.diagnostics.upper_bound,
            ratio: self.diagnostics.ratio,
            elapsed_s: self.elapsed.as_secs_f64(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceRecord {
    pub success: bool,
    pub size: usize,
    pub graph_v: usize,
    pub graph_e: usize,
    pub ub: usize,
    pub ratio: f64,
    pub elapsed_s: f64,
}
