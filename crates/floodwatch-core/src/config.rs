//! Tunable scoring parameters.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "flashFlood": { "flashFloodGuidanceMm": 25 }, "defaultUrbanization": 0.8 }
//! ```
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::flash_flood::{FlashFloodParams, TerrainProfile};
use crate::risk::RainfallThresholds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FloodConfig {
    pub flash_flood: FlashFloodParams,
    pub rainfall_thresholds: RainfallThresholds,
    /// Terrain used when a prediction is requested without one.
    pub default_terrain: TerrainProfile,
    /// 0-1, used when no measured river distance is known.
    pub default_river_proximity: f64,
    /// 0-1.
    pub default_urbanization: f64,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            flash_flood: FlashFloodParams::default(),
            rainfall_thresholds: RainfallThresholds::default(),
            default_terrain: TerrainProfile::default(),
            default_river_proximity: 0.3,
            default_urbanization: 0.5,
        }
    }
}

impl FloodConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded flood config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ff = &self.flash_flood;
        if !(ff.flash_flood_guidance_mm > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "flashFloodGuidanceMm must be > 0, got {}",
                ff.flash_flood_guidance_mm
            )));
        }
        if !(ff.rainfall_threshold_mm_hr > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "rainfallThresholdMmHr must be > 0, got {}",
                ff.rainfall_threshold_mm_hr
            )));
        }
        let w = &ff.warning_thresholds;
        if !(w.moderate < w.high && w.high < w.extreme) {
            return Err(ConfigError::Invalid(format!(
                "warning thresholds must ascend, got {} / {} / {}",
                w.moderate, w.high, w.extreme
            )));
        }
        let r = &self.rainfall_thresholds;
        if !(r.low < r.medium && r.medium < r.high && r.high < r.extreme) {
            return Err(ConfigError::Invalid(format!(
                "rainfall thresholds must ascend, got {} / {} / {} / {}",
                r.low, r.medium, r.high, r.extreme
            )));
        }
        for (name, v) in [
            ("defaultRiverProximity", self.default_river_proximity),
            ("defaultUrbanization", self.default_urbanization),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {v}")));
            }
        }
        self.default_terrain
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
