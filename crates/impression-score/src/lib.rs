//! Similarity metrics for a pair of impressions.
//!
//! Every metric reads the same [`ScoreInputs`]: both point sets, the
//! correspondence, the K → Q mapping and Q's image resampled into K's frame.
//!
//! - Point metrics ([`clique_size`], [`clique_fraction`],
//!   [`overlap_percentage`], [`median_distance`]) return a sentinel 0 on
//!   degenerate input instead of failing.
//! - Image metrics ([`image_ncc`], [`image_poc`]) and their per-channel
//!   feature counterparts ([`mc_ncc`], [`mc_poc`]) return [`ScoreError`]; the
//!   caller isolates those failures per metric.

mod error;
mod features;
mod image;
mod inputs;
mod method;
mod points;

pub use error::ScoreError;
pub use features::{mc_ncc, mc_poc, FeatureExtractor};
pub use image::{image_ncc, image_poc};
pub use inputs::{ScoreInputs, ScoreParams};
pub use method::ScoreMethod;
pub use points::{
    clique_fraction, clique_size, elapsed, match_mutual_nearest, median_distance,
    overlap_percentage, PointMatch,
};
