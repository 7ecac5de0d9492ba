//! Core types for comparing two impressions.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete interest-point detector or image decoder: callers
//! hand in a [`PointSet`] (a normalized [`FloatImage`] plus `(row, col)`
//! points) and receive [`Mapping`]s that send K-space coordinates into
//! Q-space.

mod image;
mod logger;
mod mapping;
mod points;
mod presets;

pub use image::{sample_bilinear, FloatImage, FloatImageView, BACKGROUND_FILL};
pub use mapping::{
    polynomial_term_count, polynomial_terms, warp_inverse, Mapping, PointNormalization,
    PolynomialTransform, RigidTransform, MAX_POLYNOMIAL_ORDER, MAX_POLYNOMIAL_TERMS,
};
pub use points::{rc_to_xy, PointSet, RowCol};
pub use presets::{ConfigError, DatasetPreset, DatasetPresets, ImageLoadParams};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, LOG_ENV};
