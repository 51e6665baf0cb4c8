//! Typed configuration for each transform.
//!
//! Keys use the camelCase names of the reader configuration surface
//! (`cropType`, `cropRatio`, `jitterType`, `meanFile`, ...). Values are
//! validated when a transform is constructed, not when they are
//! deserialized, so configs can be built by hand in code as well.
//!
//! # Example
//!
//! ```ignore
//! let configs: Vec<TransformConfig> = serde_json::from_str(r#"[
//!     { "type": "Crop", "cropType": "random", "cropRatio": "0.8:1.0", "jitterType": "uniRatio" },
//!     { "type": "Scale", "width": 224, "height": 224, "channels": 3, "interpolations": "linear:cubic" },
//!     { "type": "Mean", "meanFile": "mean.json" },
//!     { "type": "Transpose" }
//! ]"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};

/// Crop ratio as one value or a `min:max` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CropRatio {
    /// `"0.875"` or `"0.5:1.0"`.
    Text(String),
    Value(f64),
    Values(Vec<f64>),
}

impl Default for CropRatio {
    fn default() -> Self {
        CropRatio::Text("1.0".to_string())
    }
}

impl From<&str> for CropRatio {
    fn from(text: &str) -> Self {
        CropRatio::Text(text.to_string())
    }
}

impl CropRatio {
    /// Parse and validate the `(min, max)` ratio bounds.
    ///
    /// A single value is used for both bounds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless `0 < min <= max <= 1`.
    pub fn bounds(&self) -> Result<(f64, f64)> {
        let values = match self {
            CropRatio::Text(text) => text
                .split(':')
                .map(|token| {
                    token.trim().parse::<f64>().map_err(|_| {
                        TransformError::config(format!("Invalid cropRatio value: {:?}", text))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            CropRatio::Value(v) => vec![*v],
            CropRatio::Values(vs) => vs.clone(),
        };

        let (min, max) = match values.as_slice() {
            [v] => (*v, *v),
            [lo, hi] => (*lo, *hi),
            _ => {
                return Err(TransformError::config(format!(
                    "cropRatio takes one or two values, got {}",
                    values.len()
                )))
            }
        };

        if !(0.0 < min && min <= 1.0) || !(0.0 < max && max <= 1.0) || min > max {
            return Err(TransformError::config(format!(
                "Invalid cropRatio value {}:{}, must be > 0 and <= 1. cropMin must <= cropMax",
                min, max
            )));
        }
        Ok((min, max))
    }
}

/// Crop transform configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CropConfig {
    pub seed: u64,
    /// `center` (default), `random` or `multiview10`.
    pub crop_type: String,
    pub crop_ratio: CropRatio,
    /// `none` (default), `uniRatio`, `uniLength` or `uniArea`.
    pub jitter_type: String,
    /// Random horizontal flip. Defaults to true for random crops only.
    pub hflip: Option<bool>,
}

/// Scale transform configuration. Target dimensions are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleConfig {
    #[serde(default)]
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    /// Colon-delimited kernel names, e.g. `"linear:cubic"`.
    #[serde(default)]
    pub interpolations: String,
}

impl ScaleConfig {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            seed: 0,
            width,
            height,
            channels,
            interpolations: String::new(),
        }
    }
}

/// Mean transform configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeanConfig {
    /// Path to the mean image document. Empty disables the transform.
    pub mean_file: String,
}

/// Transpose transform configuration. There are no options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransposeConfig {}

/// Configuration of one chain stage, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransformConfig {
    Crop(CropConfig),
    Scale(ScaleConfig),
    Mean(MeanConfig),
    Transpose(TransposeConfig),
}

impl TransformConfig {
    /// Parse a JSON array of stage configurations.
    pub fn list_from_json(json: &str) -> Result<Vec<TransformConfig>> {
        serde_json::from_str(json)
            .map_err(|e| TransformError::config(format!("Invalid transform list: {}", e)))
    }
}
