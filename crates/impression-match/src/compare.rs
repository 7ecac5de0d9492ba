use crate::align::{align_q_to_k, select_alignment, AlignError, AlignMethod};
use crate::core::PointSet;
use crate::correspond::{CliqueParams, CorrespondenceRecord, CorresponderKind};
use crate::score::{FeatureExtractor, ScoreError, ScoreInputs, ScoreMethod, ScoreParams};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Configuration errors in a [`ComparisonPlan`]. These abort the whole
/// comparison before any work is done.
#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    #[error(transparent)]
    Align(#[from] AlignError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error("metric `{0}` needs a feature extractor but none was supplied")]
    MissingExtractor(&'static str),
    #[error("invalid plan JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The sweep run for one impression pair: every corresponder, crossed with
/// every aligner, crossed with every metric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonPlan {
    pub corresponders: Vec<CorresponderKind>,
    /// Aligner names: `dummy`, `kabsch`, `polynomial2`..`polynomial4`.
    pub aligners: Vec<String>,
    /// Metric names as accepted by [`ScoreMethod`].
    pub metrics: Vec<String>,
    pub score: ScoreParams,
}

impl Default for ComparisonPlan {
    fn default() -> Self {
        Self {
            corresponders: vec![CorresponderKind::CliqueThinned(CliqueParams::default())],
            aligners: vec!["kabsch".to_string()],
            metrics: ScoreMethod::ALL
                .into_iter()
                .filter(|m| !m.needs_features())
                .map(|m| m.name().to_string())
                .collect(),
            score: ScoreParams::default(),
        }
    }
}

impl ComparisonPlan {
    pub fn from_json(text: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse aligner and metric names.
    pub fn resolve(&self) -> Result<(Vec<AlignMethod>, Vec<ScoreMethod>), PlanError> {
        let aligners = self
            .aligners
            .iter()
            .map(|name| name.parse::<AlignMethod>())
            .collect::<Result<Vec<_>, _>>()?;
        let metrics = self
            .metrics
            .iter()
            .map(|name| name.parse::<ScoreMethod>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok((aligners, metrics))
    }
}

/// One metric value for one (corresponder, aligner) combination.
///
/// Failures are rows too: `success` is false, `value` is 0 and `error`
/// holds the message. The correspondence diagnostics are repeated on every
/// row so the table can be aggregated without joins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub corresponder: String,
    /// Aligner as requested.
    pub aligner: String,
    /// Aligner actually used after the weak-alignment fallback.
    pub applied_aligner: String,
    pub metric: String,
    pub value: f64,
    pub success: bool,
    pub error: Option<String>,
    pub correspondence: CorrespondenceRecord,
}

/// Run `plan` on one impression pair.
///
/// Each correspondence is computed once per corresponder, each mapping and
/// aligned image once per (corresponder, aligner). A metric that fails is
/// logged and recorded with `success = false`; the sweep carries on.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(q = q.len(), k = k.len())))]
pub fn compare_pair(
    q: &PointSet,
    k: &PointSet,
    plan: &ComparisonPlan,
    features: Option<&dyn FeatureExtractor>,
) -> Result<Vec<ScoreRecord>, PlanError> {
    let (aligners, metrics) = plan.resolve()?;
    if features.is_none() {
        if let Some(m) = metrics.iter().find(|m| m.needs_features()) {
            return Err(PlanError::MissingExtractor(m.name()));
        }
    }

    let mut records =
        Vec::with_capacity(plan.corresponders.len() * aligners.len() * metrics.len());

    for corresponder in &plan.corresponders {
        let corr = corresponder.correspond(q, k);
        let corr_row = corr.record();
        debug!(
            "{corresponder}: success = {}, size = {}, {:.3}s",
            corr_row.success, corr_row.size, corr_row.elapsed_s
        );

        for name in &plan.aligners {
            let method = select_alignment(&corr, name);
            let mapping = method.mapping(&corr);
            let aligned = align_q_to_k(q, k, &mapping);
            let inputs = ScoreInputs {
                q,
                k,
                aligned_q: &aligned,
                correspondence: &corr,
                mapping: &mapping,
                epsilon: plan.score.epsilon,
            };

            for metric in &metrics {
                let (value, error) = match metric.score(&inputs, features) {
                    Ok(v) if v.is_finite() => (v, None),
                    Ok(v) => (0.0, Some(format!("non-finite score {v}"))),
                    Err(err) => (0.0, Some(err.to_string())),
                };
                if let Some(err) = &error {
                    warn!("{metric} failed for {corresponder}/{name}: {err}");
                }
                records.push(ScoreRecord {
                    corresponder: corresponder.name().to_string(),
                    aligner: name.clone(),
                    applied_aligner: method.name(),
                    metric: metric.name().to_string(),
                    value,
                    success: error.is_none(),
                    error,
                    correspondence: corr_row,
                });
            }
        }
    }

    Ok(records)
}
