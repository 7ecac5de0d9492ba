/// Errors raised by scorers.
///
/// [`ScoreError::UnknownMetric`] is a configuration error. The rest come from
/// image-based scorers at run time and are isolated per metric by the caller.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("unknown metric `{0}`")]
    UnknownMetric(String),
    #[error("image shapes differ: {q_width}x{q_height} vs {k_width}x{k_height}")]
    ShapeMismatch {
        q_width: usize,
        q_height: usize,
        k_width: usize,
        k_height: usize,
    },
    #[error("cannot score an empty image")]
    EmptyImage,
    #[error("metric `{0}` needs a feature extractor")]
    MissingExtractor(&'static str),
    #[error("feature extraction failed: {0}")]
    FeatureExtraction(String),
    #[error("feature channel count differs: {q} vs {k}")]
    ChannelMismatch { q: usize, k: usize },
}
