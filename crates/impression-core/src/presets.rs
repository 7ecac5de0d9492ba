//! Per-dataset parameter presets.
//!
//! Different impression datasets need different loading and detector
//! settings. A [`DatasetPreset`] is a plain value handed to whichever
//! collaborator needs it; nothing here is global. Detector parameters are
//! opaque JSON objects: this crate stores and returns them by detector name
//! without looking inside.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unknown dataset preset `{0}`")]
    UnknownPreset(String),
    #[error("invalid preset JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// How an image of one role (e.g. `img_Q0`) is loaded before point detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageLoadParams {
    pub scale: f64,
    /// `[[top, bottom], [left, right]]` pixels removed after scaling.
    pub crop: [[u32; 2]; 2],
    #[serde(default)]
    pub x_flip: bool,
    #[serde(default)]
    pub y_flip: bool,
}

impl Default for ImageLoadParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            crop: [[0, 0], [0, 0]],
            x_flip: false,
            y_flip: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetPreset {
    /// Load parameters keyed by image role (`img_Q0`, `img_K1`, ...).
    #[serde(default)]
    pub images: BTreeMap<String, ImageLoadParams>,
    /// Opaque detector keyword parameters keyed by detector name.
    #[serde(default)]
    pub detectors: BTreeMap<String, Map<String, Value>>,
}

impl DatasetPreset {
    pub fn image(&self, role: &str) -> ImageLoadParams {
        self.images.get(role).cloned().unwrap_or_default()
    }

    /// Keyword parameters for `detector`, empty when the preset has none.
    pub fn detector(&self, detector: &str) -> Map<String, Value> {
        self.detectors.get(detector).cloned().unwrap_or_default()
    }
}

/// Presets keyed by dataset identifier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetPresets {
    pub presets: BTreeMap<String, DatasetPreset>,
}

impl DatasetPresets {
    /// The `ESY` and `SC1` tables.
    pub fn builtin() -> Self {
        let mut presets = BTreeMap::new();
        presets.insert(
            "ESY".to_string(),
            preset(
                ImageLoadParams {
                    scale: 0.125,
                    crop: [[20, 20], [20, 20]],
                    ..ImageLoadParams::default()
                },
                (true, false),
            ),
        );
        presets.insert(
            "SC1".to_string(),
            preset(
                ImageLoadParams {
                    scale: 0.25,
                    crop: [[80, 40], [0, 80]],
                    ..ImageLoadParams::default()
                },
                (false, true),
            ),
        );
        Self { presets }
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn get(&self, id: &str) -> Result<&DatasetPreset, ConfigError> {
        self.presets
            .get(id)
            .ok_or_else(|| ConfigError::UnknownPreset(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }
}

/// Q images load with `base`; the first K image additionally gets `k0_flip`.
fn preset(base: ImageLoadParams, k0_flip: (bool, bool)) -> DatasetPreset {
    let mut images = BTreeMap::new();
    for role in ["img_Q0", "img_Q1", "img_K1"] {
        images.insert(role.to_string(), base.clone());
    }
    images.insert(
        "img_K0".to_string(),
        ImageLoadParams {
            x_flip: k0_flip.0,
            y_flip: k0_flip.1,
            ..base
        },
    );

    let detectors = [
        ("SIFT", json!({ "upsampling": 1, "sigma_in": 0 })),
        ("ORB", json!({ "fast_threshold": 0.075 })),
        ("CENSURE", json!({})),
        (
            "Shi-Tomasi",
            json!({ "maxCorners": 500, "qualityLevel": 0.2, "min_distance": 10 }),
        ),
        ("KAZE", json!({ "threshold": 0.03 })),
        ("AKAZE", json!({ "threshold": 0.03 })),
        ("FAST_peaks", json!({ "min_distance": 7 })),
        ("FAST_params", json!({ "threshold": 0.075 })),
    ]
    .into_iter()
    .filter_map(|(name, v)| match v {
        Value::Object(map) => Some((name.to_string(), map)),
        _ => None,
    })
    .collect();

    DatasetPreset { images, detectors }
}
