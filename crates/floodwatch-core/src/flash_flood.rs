//! Flash-flood prediction: runoff → routing → threshold classification.
//!
//! The classifier compares two ratios against fixed thresholds:
//!   ffg_ratio       = runoff / flash_flood_guidance
//!   intensity_ratio = rainfall_intensity / rainfall_threshold
//! and the level decides confidence, warning text and affected radius.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::FloodConfig;
use crate::coords::LatLon;
use crate::error::FloodError;
use crate::hydrology::{estimate_runoff, route, ChannelGeometry, LandCover, RainfallSample};
use crate::weather::{summarize_rainfall, RainfallSummary, WeatherSeries};

pub const PREDICTION_SOURCE: &str = "HOMS J04-J10-J15 integrated flash flood forecast";
pub const FALLBACK_SOURCE: &str = "HOMS J04-J10-J15 integrated flash flood forecast (fallback)";

/// Millimetres of runoff over the basin → m³/s of inflow.
const RUNOFF_TO_FLOW: f64 = 3.6;

/// Upper bound accepted for `basin_response_time_hours` (30 days).
pub const MAX_RESPONSE_TIME_HOURS: f64 = 720.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlashFloodRiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl FlashFloodRiskLevel {
    pub const ALL: [FlashFloodRiskLevel; 4] = [
        FlashFloodRiskLevel::Low,
        FlashFloodRiskLevel::Moderate,
        FlashFloodRiskLevel::High,
        FlashFloodRiskLevel::Extreme,
    ];

    pub fn confidence(self) -> f64 {
        match self {
            FlashFloodRiskLevel::Extreme => 0.9,
            FlashFloodRiskLevel::High => 0.8,
            FlashFloodRiskLevel::Moderate => 0.7,
            FlashFloodRiskLevel::Low => 0.5,
        }
    }

    pub fn radius_km(self) -> f64 {
        match self {
            FlashFloodRiskLevel::Extreme => 15.0,
            FlashFloodRiskLevel::High => 12.0,
            FlashFloodRiskLevel::Moderate => 8.0,
            FlashFloodRiskLevel::Low => 5.0,
        }
    }

    pub fn warning_message(self) -> &'static str {
        match self {
            FlashFloodRiskLevel::Extreme => {
                "EMERGENCY! Sudden, severe flash flooding expected. Move to high ground immediately!"
            }
            FlashFloodRiskLevel::High => {
                "URGENT! High flash flood risk. Move away from stream beds and get to safe areas."
            }
            FlashFloodRiskLevel::Moderate => {
                "CAUTION! Flash flood risk present. Stay away from stream beds and follow updates."
            }
            FlashFloodRiskLevel::Low => "Flash flood risk is low.",
        }
    }
}

/// Ratio thresholds on `ffg_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WarningThresholds {
    pub moderate: f64,
    pub high: f64,
    pub extreme: f64,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self { moderate: 0.7, high: 0.9, extreme: 1.2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlashFloodParams {
    /// mm/h.
    pub rainfall_threshold_mm_hr: f64,
    /// mm.
    pub flash_flood_guidance_mm: f64,
    pub warning_thresholds: WarningThresholds,
}

impl Default for FlashFloodParams {
    fn default() -> Self {
        Self {
            rainfall_threshold_mm_hr: 20.0,
            flash_flood_guidance_mm: 30.0,
            warning_thresholds: WarningThresholds::default(),
        }
    }
}

/// Per-location land and channel descriptor used by the prediction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TerrainProfile {
    pub land_cover: LandCover,
    pub slope_percent: f64,
    pub impervious_area_percent: f64,
    /// 0-1.
    pub soil_moisture: f64,
    pub channel_length_km: f64,
    pub channel_slope_m_per_km: f64,
    pub channel_roughness: f64,
    pub cross_section_area_m2: f64,
    pub basin_response_time_hours: f64,
}

impl Default for TerrainProfile {
    fn default() -> Self {
        Self {
            land_cover: LandCover::Urban,
            slope_percent: 5.0,
            impervious_area_percent: 60.0,
            soil_moisture: 0.5,
            channel_length_km: 10.0,
            channel_slope_m_per_km: 2.0,
            channel_roughness: 0.035,
            cross_section_area_m2: 20.0,
            basin_response_time_hours: 2.0,
        }
    }
}

impl TerrainProfile {
    pub fn validate(&self) -> Result<(), FloodError> {
        if !(0.0..=1.0).contains(&self.soil_moisture) {
            return Err(FloodError::InvalidTerrain(format!(
                "soil moisture {} outside [0, 1]",
                self.soil_moisture
            )));
        }
        if !(0.0..=MAX_RESPONSE_TIME_HOURS).contains(&self.basin_response_time_hours) {
            return Err(FloodError::InvalidTerrain(format!(
                "basin response time {} h",
                self.basin_response_time_hours
            )));
        }
        Ok(())
    }

    fn rainfall_sample(&self, rain: &RainfallSummary) -> RainfallSample {
        RainfallSample {
            intensity_mm_hr: rain.intensity_mm_hr,
            duration_hours: rain.duration_hours,
            antecedent_rainfall_mm: rain.antecedent_mm,
            soil_moisture: self.soil_moisture,
            land_cover: self.land_cover,
            slope_percent: self.slope_percent,
            impervious_area_percent: self.impervious_area_percent,
        }
    }

    fn channel(&self, initial_flow_m3s: f64, lateral_inflow_m3s_per_km: f64) -> ChannelGeometry {
        ChannelGeometry {
            length_km: self.channel_length_km,
            slope_m_per_km: self.channel_slope_m_per_km,
            roughness: self.channel_roughness,
            cross_section_area_m2: self.cross_section_area_m2,
            initial_flow_m3s,
            lateral_inflow_m3s_per_km,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedArea {
    pub center: LatLon,
    pub radius_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashFloodPrediction {
    pub risk_level: FlashFloodRiskLevel,
    /// 0-1.
    pub confidence: f64,
    pub lead_time_minutes: u32,
    pub estimated_runoff_mm: f64,
    /// Routed reach outflow; 0 when routing was not run.
    pub routed_peak_flow_m3s: f64,
    pub warning_message: String,
    pub affected_area: AffectedArea,
    pub timestamp: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub source: String,
}

impl FlashFloodPrediction {
    /// Conservative low-risk result returned when the pipeline cannot run.
    pub fn fallback(location: LatLon, now: DateTime<Utc>) -> Self {
        Self {
            risk_level: FlashFloodRiskLevel::Low,
            confidence: 0.3,
            lead_time_minutes: 120,
            estimated_runoff_mm: 0.0,
            routed_peak_flow_m3s: 0.0,
            warning_message: "Flash flood prediction unavailable; low risk assumed.".to_string(),
            affected_area: AffectedArea {
                center: location,
                radius_km: FlashFloodRiskLevel::Low.radius_km(),
            },
            timestamp: now,
            valid_until: now + Duration::hours(2),
            source: FALLBACK_SOURCE.to_string(),
        }
    }
}

/// Level for the given ratios. Either ratio alone can raise the level.
pub fn classify_ratios(
    ffg_ratio: f64,
    intensity_ratio: f64,
    thresholds: &WarningThresholds,
) -> FlashFloodRiskLevel {
    if ffg_ratio > thresholds.extreme || intensity_ratio > 2.0 {
        FlashFloodRiskLevel::Extreme
    } else if ffg_ratio > thresholds.high || intensity_ratio > 1.5 {
        FlashFloodRiskLevel::High
    } else if ffg_ratio > thresholds.moderate || intensity_ratio > 1.0 {
        FlashFloodRiskLevel::Moderate
    } else {
        FlashFloodRiskLevel::Low
    }
}

/// Classify a computed runoff depth and rainfall intensity at `location`.
///
/// Lead time shrinks as the guidance ratio grows and is floored at zero.
pub fn classify(
    params: &FlashFloodParams,
    runoff_mm: f64,
    rainfall_intensity_mm_hr: f64,
    basin_response_time_hours: f64,
    location: LatLon,
    now: DateTime<Utc>,
) -> FlashFloodPrediction {
    let ffg_ratio = runoff_mm / params.flash_flood_guidance_mm;
    let intensity_ratio = rainfall_intensity_mm_hr / params.rainfall_threshold_mm_hr;
    let level = classify_ratios(ffg_ratio, intensity_ratio, &params.warning_thresholds);

    let lead_minutes = (basin_response_time_hours * 60.0 * (1.0 - ffg_ratio / 2.0)).max(0.0);
    // Saturates for response times no calendar can hold.
    let valid_until = Duration::try_seconds((lead_minutes * 60.0).round() as i64)
        .and_then(|lead| now.checked_add_signed(lead))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    tracing::debug!(ffg_ratio, intensity_ratio, ?level, lead_minutes, "flash flood classification");

    FlashFloodPrediction {
        risk_level: level,
        confidence: level.confidence(),
        lead_time_minutes: lead_minutes.round() as u32,
        estimated_runoff_mm: runoff_mm,
        routed_peak_flow_m3s: 0.0,
        warning_message: level.warning_message().to_string(),
        affected_area: AffectedArea { center: location, radius_km: level.radius_km() },
        timestamp: now,
        valid_until,
        source: PREDICTION_SOURCE.to_string(),
    }
}

fn run_pipeline(
    location: LatLon,
    weather: Option<&WeatherSeries>,
    terrain: &TerrainProfile,
    config: &FloodConfig,
    now: DateTime<Utc>,
) -> Result<FlashFloodPrediction, FloodError> {
    terrain.validate()?;
    let rain = match weather {
        Some(series) => summarize_rainfall(series)?,
        None => RainfallSummary::default(),
    };

    let runoff = estimate_runoff(&terrain.rainfall_sample(&rain));

    let inflow = runoff / RUNOFF_TO_FLOW;
    let channel = terrain.channel(rain.initial_flow_m3s, inflow / terrain.channel_length_km);
    channel.validate()?;
    let peak = route(&channel, inflow);

    let mut prediction = classify(
        &config.flash_flood,
        runoff,
        rain.intensity_mm_hr,
        terrain.basin_response_time_hours,
        location,
        now,
    );
    prediction.routed_peak_flow_m3s = peak;
    Ok(prediction)
}

/// End-to-end flash-flood prediction for `location`.
///
/// `weather = None` uses the default rainfall summary; `terrain = None` uses
/// `config.default_terrain`. Never fails: malformed input yields
/// [`FlashFloodPrediction::fallback`].
pub fn predict_flash_floods(
    location: LatLon,
    weather: Option<&WeatherSeries>,
    terrain: Option<&TerrainProfile>,
    config: &FloodConfig,
    now: DateTime<Utc>,
) -> FlashFloodPrediction {
    let terrain = terrain.unwrap_or(&config.default_terrain);
    match run_pipeline(location, weather, terrain, config, now) {
        Ok(prediction) => prediction,
        Err(err) => {
            tracing::warn!(%err, lat = location.lat, lon = location.lon, "flash flood prediction failed, using fallback");
            FlashFloodPrediction::fallback(location, now)
        }
    }
}
