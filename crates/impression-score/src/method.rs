use crate::error::ScoreError;
use crate::features::{mc_ncc, mc_poc, FeatureExtractor};
use crate::image::{image_ncc, image_poc};
use crate::inputs::ScoreInputs;
use crate::points::{clique_size, clique_fraction, elapsed, median_distance, overlap_percentage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Closed set of similarity metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScoreMethod {
    CliqueSize,
    CliqueFraction,
    OverlapPercentage,
    MedianDistance,
    ImageNcc,
    ImagePoc,
    McNcc,
    McPoc,
    /// Seconds spent finding the correspondence.
    Elapsed,
}

impl ScoreMethod {
    pub const ALL: [ScoreMethod; 9] = [
        ScoreMethod::CliqueSize,
        ScoreMethod::CliqueFraction,
        ScoreMethod::OverlapPercentage,
        ScoreMethod::MedianDistance,
        ScoreMethod::ImageNcc,
        ScoreMethod::ImagePoc,
        ScoreMethod::McNcc,
        ScoreMethod::McPoc,
        ScoreMethod::Elapsed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScoreMethod::CliqueSize => "clique_size",
            ScoreMethod::CliqueFraction => "clique_fraction",
            ScoreMethod::OverlapPercentage => "overlap_percentage",
            ScoreMethod::MedianDistance => "median_distance",
            ScoreMethod::ImageNcc => "ImageNCC",
            ScoreMethod::ImagePoc => "ImagePOC",
            ScoreMethod::McNcc => "MCNCC",
            ScoreMethod::McPoc => "MCPOC",
            ScoreMethod::Elapsed => "time",
        }
    }

    /// Whether the metric needs a [`FeatureExtractor`].
    pub fn needs_features(&self) -> bool {
        matches!(self, ScoreMethod::McNcc | ScoreMethod::McPoc)
    }

    /// Evaluate the metric.
    ///
    /// Point metrics and `time` never fail. Image metrics fail on shape
    /// mismatch or empty images; feature metrics also fail without an
    /// extractor or when extraction fails.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(inputs, features), fields(metric = self.name())))]
    pub fn score(
        &self,
        inputs: &ScoreInputs<'_>,
        features: Option<&dyn FeatureExtractor>,
    ) -> Result<f64, ScoreError> {
        match self {
            ScoreMethod::CliqueSize => Ok(clique_size(inputs)),
            ScoreMethod::CliqueFraction => Ok(clique_fraction(inputs)),
            ScoreMethod::OverlapPercentage => Ok(overlap_percentage(inputs)),
            ScoreMethod::MedianDistance => Ok(median_distance(inputs)),
            ScoreMethod::Elapsed => Ok(elapsed(inputs)),
            ScoreMethod::ImageNcc => image_ncc(inputs),
            ScoreMethod::ImagePoc => image_poc(inputs),
            ScoreMethod::McNcc => {
                let fx = features.ok_or(ScoreError::MissingExtractor(self.name()))?;
                mc_ncc(inputs.aligned_q, &inputs.k.image, fx)
            }
            ScoreMethod::McPoc => {
                let fx = features.ok_or(ScoreError::MissingExtractor(self.name()))?;
                mc_poc(inputs.aligned_q, &inputs.k.image, fx)
            }
        }
    }
}

impl fmt::Display for ScoreMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScoreMethod {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoreMethod::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ScoreError::UnknownMetric(s.to_string()))
    }
}

impl TryFrom<String> for ScoreMethod {
    type Error = ScoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ScoreMethod> for String {
    fn from(m: ScoreMethod) -> Self {
        m.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use impression_core::{FloatImage, Mapping, PointSet};
    use impression_correspond::{CorrespondFailure, Correspondence, GraphDiagnostics};
    use std::time::Duration;

    #[test]
    fn names_round_trip() {
        for m in ScoreMethod::ALL {
            assert_eq!(m.name().parse::<ScoreMethod>(), Ok(m));
        }
        assert_eq!(
            "imagencc".parse::<ScoreMethod>(),
            Err(ScoreError::UnknownMetric("imagencc".into()))
        );
    }

    #[test]
    fn feature_metrics_need_an_extractor() {
        let q = PointSet::new(vec![], FloatImage::filled(3, 3, 0.5));
        let corr = Correspondence::failed(CorrespondFailure::NoEdges, GraphDiagnostics::default())
            .with_elapsed(Duration::from_millis(1500));
        let inputs = ScoreInputs {
            q: &q,
            k: &q,
            aligned_q: &q.image,
            correspondence: &corr,
            mapping: &Mapping::Identity,
            epsilon: 5.0,
        };
        assert_eq!(
            ScoreMethod::McNcc.score(&inputs, None),
            Err(ScoreError::MissingExtractor("MCNCC"))
        );
        assert_eq!(ScoreMethod::Elapsed.score(&inputs, None), Ok(1.5));
        for m in ScoreMethod::ALL.into_iter().filter(|m| !m.needs_features()) {
            assert!(m.score(&inputs, None).is_ok(), "{m}");
        }
    }
}
