//! High-level facade for comparing two impressions.
//!
//! This crate provides:
//! - re-exports of the component crates under short names
//! - [`compare_pair`], which sweeps corresponders, aligners and metrics over
//!   one impression pair and returns one flat [`ScoreRecord`] per metric
//! - (feature `image`) conversion from `image::GrayImage`
//!
//! ## Quickstart
//!
//! ```
//! use impression_match::core::{FloatImage, PointSet};
//! use impression_match::{compare_pair, ComparisonPlan};
//!
//! let pts = vec![[2.0, 3.0], [5.0, 11.0], [9.0, 4.0], [12.0, 13.0], [7.0, 7.5]];
//! let q = PointSet::new(pts.clone(), FloatImage::filled(16, 16, 1.0));
//! let k = PointSet::new(pts, FloatImage::filled(16, 16, 1.0));
//!
//! let records = compare_pair(&q, &k, &ComparisonPlan::default(), None).unwrap();
//! assert!(records.iter().all(|r| r.success));
//! ```
//!
//! ## API map
//! - `impression_match::core`: point sets, images, mappings, presets, logger.
//! - `impression_match::correspond`: compatibility graph and max-clique matching.
//! - `impression_match::align`: Kabsch and polynomial alignment.
//! - `impression_match::score`: similarity metrics.
//! - `impression_match::convert` (feature `image`): `image::GrayImage` input.

pub use impression_align as align;
pub use impression_core as core;
pub use impression_correspond as correspond;
pub use impression_score as score;

pub use impression_core::{FloatImage, Mapping, PointSet};
pub use impression_correspond::{Correspondence, CorresponderKind};

mod compare;

pub use compare::{compare_pair, ComparisonPlan, PlanError, ScoreRecord};

#[cfg(feature = "image")]
pub mod convert;
