use impression_core::{FloatImage, Mapping, PointSet};
use impression_correspond::Correspondence;
use serde::{Deserialize, Serialize};

/// Scorer parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreParams {
    /// Match radius in pixels for the point-distance metrics.
    pub epsilon: f64,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self { epsilon: 5.0 }
    }
}

/// Everything a scorer may look at for one (corresponder, aligner) pair.
///
/// All fields are borrowed: the caller keeps the cached correspondence,
/// mapping and aligned image alive across metrics.
#[derive(Clone, Copy, Debug)]
pub struct ScoreInputs<'a> {
    pub q: &'a PointSet,
    pub k: &'a PointSet,
    /// Q's image resampled into K's frame.
    pub aligned_q: &'a FloatImage,
    pub correspondence: &'a Correspondence,
    /// K → Q mapping in `(x, y)`.
    pub mapping: &'a Mapping,
    pub epsilon: f64,
}
