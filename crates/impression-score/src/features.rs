use crate::error::ScoreError;
use crate::image::{ncc, poc, Spread};
use impression_core::FloatImage;

/// Source of per-channel feature maps for the multi-channel metrics.
///
/// Typically a frozen pretrained network. Build it once per worker and
/// hand out `&dyn FeatureExtractor`; every call must produce the same number
/// of equally shaped channels for equally shaped inputs.
pub trait FeatureExtractor {
    fn extract(&self, image: &FloatImage) -> Result<Vec<FloatImage>, ScoreError>;
}

impl<F> FeatureExtractor for F
where
    F: Fn(&FloatImage) -> Result<Vec<FloatImage>, ScoreError>,
{
    fn extract(&self, image: &FloatImage) -> Result<Vec<FloatImage>, ScoreError> {
        self(image)
    }
}

fn channel_pairs(
    q: &FloatImage,
    k: &FloatImage,
    extractor: &dyn FeatureExtractor,
) -> Result<(Vec<FloatImage>, Vec<FloatImage>), ScoreError> {
    let qc = extractor.extract(q)?;
    let kc = extractor.extract(k)?;
    if qc.len() != kc.len() {
        return Err(ScoreError::ChannelMismatch {
            q: qc.len(),
            k: kc.len(),
        });
    }
    if qc.is_empty() {
        return Err(ScoreError::FeatureExtraction("extractor produced no channels".into()));
    }
    Ok((qc, kc))
}

fn channel_mean(
    q: &FloatImage,
    k: &FloatImage,
    extractor: &dyn FeatureExtractor,
    per_channel: impl Fn(&FloatImage, &FloatImage) -> Result<f64, ScoreError>,
) -> Result<f64, ScoreError> {
    let (qc, kc) = channel_pairs(q, k, extractor)?;
    let mut sum = 0.0;
    for (a, b) in qc.iter().zip(&kc) {
        sum += per_channel(a, b)?;
    }
    Ok(sum / qc.len() as f64)
}

/// Channel-averaged NCC on extracted features (sample std, floored).
pub fn mc_ncc(
    aligned_q: &FloatImage,
    k: &FloatImage,
    extractor: &dyn FeatureExtractor,
) -> Result<f64, ScoreError> {
    channel_mean(aligned_q, k, extractor, |a, b| ncc(a, b, Spread::SampleFloored))
}

/// Channel-averaged phase-only correlation peak on extracted features.
pub fn mc_poc(
    aligned_q: &FloatImage,
    k: &FloatImage,
    extractor: &dyn FeatureExtractor,
) -> Result<f64, ScoreError> {
    channel_mean(aligned_q, k, extractor, poc)
}
