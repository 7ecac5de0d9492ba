//! Geometrically consistent point correspondence between two impressions.
//!
//! Pipeline of the clique corresponders:
//! 1. Optionally thin each point set (drop points within `alpha` of an
//!    earlier point).
//! 2. Build the compatibility graph over all `(q, k)` candidate pairs; two
//!    pairs are adjacent when their displacements point the same way within
//!    the angle tolerance.
//! 3. Find a maximum clique, bounded above by `min(|Q|, |K|)`.
//! 4. Decode vertex ids back into index-aligned matched Q/K points.
//!
//! Every step that cannot proceed (too few points, empty graph, empty
//! clique) produces a failed [`Correspondence`] and a warning instead of an
//! error.
//!
//! ```
//! use impression_core::{FloatImage, PointSet};
//! use impression_correspond::{CliqueParams, CorresponderKind};
//!
//! let square = vec![[0.0, 0.0], [0.0, 10.0], [10.0, 0.0], [10.0, 10.0]];
//! let q = PointSet::new(square.clone(), FloatImage::filled(12, 12, 1.0));
//! let k = PointSet::new(square, FloatImage::filled(12, 12, 1.0));
//!
//! let corr = CorresponderKind::Clique(CliqueParams { epsilon: 0.1, ..Default::default() })
//!     .correspond(&q, &k);
//! assert_eq!(corr.size(), 4);
//! ```

mod clique;
mod correspondence;
mod corresponder;
mod graph;
mod thin;

pub use clique::{max_clique, CliqueOptions};
pub use correspondence::{
    CorrespondFailure, Correspondence, CorrespondenceOutcome, CorrespondenceRecord,
    GraphDiagnostics,
};
pub use corresponder::{clique_correspondence, CliqueParams, CorresponderKind, UnknownCorresponder};
pub use graph::{angle_between, AngleTolerance, CompatibilityGraph, GraphError, MIN_ANGLE_TOLERANCE};
pub use thin::thin_points;
