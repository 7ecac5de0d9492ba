use crate::kabsch::kabsch;
use crate::polynomial::fit_polynomial;
use impression_core::{rc_to_xy, warp_inverse, FloatImage, Mapping, PointSet, BACKGROUND_FILL};
use impression_correspond::Correspondence;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Fewest matched pairs an alignment is attempted from.
pub const MIN_ALIGNMENT_SIZE: usize = 3;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignError {
    #[error("polynomial order must be 2, 3 or 4, got {0}")]
    InvalidOrder(u32),
    #[error("unknown alignment method `{0}` (expected dummy, kabsch, polynomial2..4)")]
    UnknownMethod(String),
}

/// Polynomial order accepted by [`fit_polynomial`]: 2, 3 or 4.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PolynomialOrder(u8);

impl PolynomialOrder {
    pub fn new(order: u32) -> Result<Self, AlignError> {
        match order {
            2..=4 => Ok(Self(order as u8)),
            _ => Err(AlignError::InvalidOrder(order)),
        }
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for PolynomialOrder {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u32> for PolynomialOrder {
    type Error = AlignError;

    fn try_from(order: u32) -> Result<Self, Self::Error> {
        Self::new(order)
    }
}

impl From<PolynomialOrder> for u32 {
    fn from(order: PolynomialOrder) -> Self {
        order.0 as u32
    }
}

/// Closed set of aligners producing a K → Q [`Mapping`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "order", rename_all = "snake_case")]
pub enum AlignMethod {
    #[default]
    Identity,
    Kabsch,
    Polynomial(PolynomialOrder),
}

impl AlignMethod {
    pub fn name(&self) -> String {
        match self {
            AlignMethod::Identity => "dummy".to_string(),
            AlignMethod::Kabsch => "kabsch".to_string(),
            AlignMethod::Polynomial(order) => format!("polynomial{}", order.get()),
        }
    }

    /// Estimate the mapping from a correspondence.
    ///
    /// Estimation failures warn and yield [`Mapping::Identity`]. A failed
    /// correspondence also yields identity.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(corr), fields(method = %self, size = corr.size())))]
    pub fn mapping(&self, corr: &Correspondence) -> Mapping {
        if !corr.success() {
            return Mapping::Identity;
        }
        match self {
            AlignMethod::Identity => Mapping::Identity,
            AlignMethod::Kabsch => kabsch(corr.q(), corr.k()),
            AlignMethod::Polynomial(order) => {
                match fit_polynomial(&rc_to_xy(corr.q()), &rc_to_xy(corr.k()), *order) {
                    Some(t) => Mapping::Polynomial(t),
                    None => {
                        warn!("polynomial{} fit failed; using identity mapping", order.get());
                        Mapping::Identity
                    }
                }
            }
        }
    }
}

impl fmt::Display for AlignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for AlignMethod {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dummy" => Ok(AlignMethod::Identity),
            "kabsch" => Ok(AlignMethod::Kabsch),
            other => {
                let order = other
                    .strip_prefix("polynomial")
                    .and_then(|o| o.parse::<u32>().ok())
                    .ok_or_else(|| AlignError::UnknownMethod(other.to_string()))?;
                Ok(AlignMethod::Polynomial(PolynomialOrder::new(order)?))
            }
        }
    }
}

/// Pick the aligner for a correspondence.
///
/// Fewer than [`MIN_ALIGNMENT_SIZE`] matched pairs, or a name that does not
/// parse, make the alignment too weak: the result is [`AlignMethod::Identity`].
pub fn select_alignment(corr: &Correspondence, name: &str) -> AlignMethod {
    if corr.size() < MIN_ALIGNMENT_SIZE {
        warn!(
            "alignment is too weak ({} matched pairs); using identity",
            corr.size()
        );
        return AlignMethod::Identity;
    }
    match name.parse() {
        Ok(method) => method,
        Err(err) => {
            warn!("alignment is too weak: {err}; using identity");
            AlignMethod::Identity
        }
    }
}

/// Resample Q's image into K's frame and shape.
///
/// `mapping` sends K pixel coordinates into Q; pixels landing outside Q get
/// [`BACKGROUND_FILL`].
pub fn align_q_to_k(q: &PointSet, k: &PointSet, mapping: &Mapping) -> FloatImage {
    if mapping.is_identity() && q.image.same_shape(&k.image) {
        return q.image.clone();
    }
    warp_inverse(
        &q.image.view(),
        mapping,
        k.image.width,
        k.image.height,
        BACKGROUND_FILL,
    )
}
