//! K → Q alignment from a point correspondence.
//!
//! Two estimators are provided: a closed-form rigid fit ([`kabsch`]) and a
//! least-squares polynomial warp of order 2 to 4 ([`fit_polynomial`]). Both
//! produce an [`impression_core::Mapping`] in `(x, y)` pixel coordinates that
//! sends K into Q, which is exactly what [`align_q_to_k`] needs to resample
//! Q's image into K's frame.

mod kabsch;
mod method;
mod polynomial;

pub use kabsch::{estimate_rigid, kabsch};
pub use method::{
    align_q_to_k, select_alignment, AlignError, AlignMethod, PolynomialOrder, MIN_ALIGNMENT_SIZE,
};
pub use polynomial::fit_polynomial;
