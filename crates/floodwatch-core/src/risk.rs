//! Aggregate flood-risk scoring.
//!
//! Strictly additive: every factor whose condition holds adds its points and
//! appends one human-readable line, in evaluation order:
//!   1. forecast rainfall total
//!   2. basin status (water level, rivers, dams, 24 h rainfall, snowmelt)
//!   3. hazard-zone membership (zone severity or proximity, river, elevation)
//!   4. terrain (soil saturation, slope, river proximity, urbanization)
//! The score is not capped at 100.
use serde::{Deserialize, Serialize};

use crate::basin::BasinStatus;
use crate::config::FloodConfig;
use crate::hazard::{hazard_risk_description, highest_risk_zone, FloodHazardZone, HazardMembership};
use crate::providers::HazardZoneSource;
use crate::region::{defaults_for_region, estimate_region, RegionCode};
use crate::weather::WeatherSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FloodRiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl FloodRiskLevel {
    /// Lower bounds are inclusive: 70 → Extreme, 40 → High, 20 → Medium.
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            FloodRiskLevel::Extreme
        } else if score >= 40.0 {
            FloodRiskLevel::High
        } else if score >= 20.0 {
            FloodRiskLevel::Medium
        } else {
            FloodRiskLevel::Low
        }
    }

    /// Points added when the location lies in a hazard zone of this level.
    pub fn zone_points(self) -> f64 {
        match self {
            FloodRiskLevel::Extreme => 30.0,
            FloodRiskLevel::High => 20.0,
            FloodRiskLevel::Medium => 10.0,
            FloodRiskLevel::Low => 5.0,
        }
    }

    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            FloodRiskLevel::Extreme => &[
                "Prepare your emergency kit and follow official warnings",
                "Follow evacuation instructions and move to higher ground",
                "Stay away from flood water; even 15 cm of moving water can knock a person down",
                "Avoid driving; 30 cm of water can sweep a vehicle away",
            ],
            FloodRiskLevel::High => &[
                "Review your emergency plan and be ready",
                "Move valuables to higher places",
                "Check official warnings regularly",
                "Stay away from stream beds and water channels",
            ],
            FloodRiskLevel::Medium => &[
                "Check the weather forecast regularly",
                "Keep in mind that basements may flood",
                "Make sure drainage channels are not blocked",
            ],
            FloodRiskLevel::Low => &["Take normal precautions and follow the weather forecast"],
        }
    }
}

const IN_ZONE_RECOMMENDATIONS: [&str; 2] = [
    "If you live in a flood hazard zone, consider taking out flood insurance",
    "Learn the flood hazard maps and evacuation routes for your area",
];

/// Forecast-total thresholds (mm) for the rainfall factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RainfallThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub extreme: f64,
}

impl Default for RainfallThresholds {
    fn default() -> Self {
        Self { low: 5.0, medium: 20.0, high: 50.0, extreme: 100.0 }
    }
}

/// Caller-supplied terrain factors, each 0-1. Missing values fall back to the
/// basin, the regional table, or the configured defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TerrainOverrides {
    pub soil_saturation: Option<f64>,
    pub slope_factor: Option<f64>,
    pub river_proximity: Option<f64>,
    pub urbanization: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloodRiskAssessment {
    pub risk_level: FloodRiskLevel,
    pub risk_score: f64,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flood_hazard_zones: Option<Vec<FloodHazardZone>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_in_flood_zone: Option<bool>,
    pub region: RegionCode,
}

/// Running total plus the factor lines, appended together.
#[derive(Default)]
struct Tally {
    score: f64,
    factors: Vec<String>,
}

impl Tally {
    fn add(&mut self, points: f64, factor: impl Into<String>) {
        self.score += points;
        self.factors.push(factor.into());
    }
}

fn score_rainfall(t: &mut Tally, series: &WeatherSeries, thresholds: &RainfallThresholds) {
    let total = match series.validate() {
        Ok(()) => series.total(),
        Err(err) => {
            tracing::warn!(%err, "ignoring malformed forecast in rainfall factor");
            0.0
        }
    };
    let (points, label) = if total >= thresholds.extreme {
        (60.0, "very high")
    } else if total >= thresholds.high {
        (40.0, "high")
    } else if total >= thresholds.medium {
        (20.0, "moderate")
    } else if total >= thresholds.low {
        (5.0, "low")
    } else {
        return;
    };
    t.add(
        points,
        format!(
            "{total:.1} mm of rain expected over the next {} hours ({label})",
            series.forecast_step
        ),
    );
}

fn score_basin(t: &mut Tally, basin: &BasinStatus, series: &WeatherSeries) {
    let wl = basin.water_level_percent;
    if wl >= 80.0 {
        t.add(25.0, format!("{} water level is very high ({wl:.1}%)", basin.name));
    } else if wl >= 60.0 {
        t.add(15.0, format!("{} water level is high ({wl:.1}%)", basin.name));
    } else if wl >= 40.0 {
        t.add(5.0, format!("{} water level is moderate ({wl:.1}%)", basin.name));
    }

    let rivers: Vec<&str> = basin.critical_rivers().map(|r| r.name.as_str()).collect();
    if !rivers.is_empty() {
        t.add(
            15.0,
            format!("{} river(s) near critical level ({})", rivers.len(), rivers.join(", ")),
        );
    }

    let dams: Vec<&str> = basin.high_fill_dams().map(|d| d.name.as_str()).collect();
    if !dams.is_empty() {
        t.add(
            10.0,
            format!("{} dam(s) at a high fill rate ({})", dams.len(), dams.join(", ")),
        );
    }

    let rain = basin.rainfall_24h_mm;
    if rain > 25.0 {
        t.add(15.0, format!("{rain:.1} mm of rain recorded in the last 24 hours (very high)"));
    } else if rain > 15.0 {
        t.add(10.0, format!("{rain:.1} mm of rain recorded in the last 24 hours (high)"));
    } else if rain > 8.0 {
        t.add(5.0, format!("{rain:.1} mm of rain recorded in the last 24 hours (moderate)"));
    }

    if let Some(snow) = basin.snow_depth_cm.filter(|&d| d > 20.0) {
        if series.temperature_series().iter().any(|&c| c > 5.0) {
            t.add(
                15.0,
                format!("{snow} cm of snow on the ground and temperatures rising; snowmelt may raise flood risk"),
            );
        }
    }
}

fn score_hazard(t: &mut Tally, hazard: &HazardMembership) {
    if let Some(level) = hazard.in_zone_level() {
        let factor = match highest_risk_zone(&hazard.zones) {
            Some(zone) => format!(
                "Location is inside the {}-year return period flood hazard zone ({}): {}",
                zone.recurrence_period_years,
                zone.name,
                hazard_risk_description(level)
            ),
            None => format!("Location is inside a flood hazard zone: {}", hazard_risk_description(level)),
        };
        t.add(level.zone_points(), factor);
    } else if let Some(d) = hazard.nearest_zone_distance_m.filter(|&d| d < 1000.0) {
        t.add(5.0, format!("Location is {d:.0} m from a flood hazard zone"));
    }

    if let Some(d) = hazard.river_distance_m.filter(|&d| d < 500.0) {
        t.add(10.0, format!("Location is {d:.0} m from a river or stream"));
    }

    if let Some(e) = hazard.elevation_m.filter(|&e| e < 10.0) {
        t.add(10.0, format!("Location is at low elevation ({e:.0} m)"));
    }
}

/// Score one location from already-resolved inputs.
///
/// `hazard = None` omits the hazard factor group; use
/// [`calculate_flood_risk`] to try a lookup first.
pub fn score(
    series: &WeatherSeries,
    basin: Option<&BasinStatus>,
    hazard: Option<&HazardMembership>,
    overrides: Option<&TerrainOverrides>,
    config: &FloodConfig,
) -> FloodRiskAssessment {
    let overrides = overrides.copied().unwrap_or_default();
    let region = estimate_region(series.location.lat, series.location.lon);
    let regional = defaults_for_region(region);

    let soil_saturation = basin
        .map(|b| b.soil_moisture)
        .or(overrides.soil_saturation)
        .unwrap_or(regional.soil_saturation);
    let slope_factor = overrides.slope_factor.unwrap_or(regional.slope_factor);
    let river_proximity = overrides.river_proximity.unwrap_or(config.default_river_proximity);
    let urbanization = overrides.urbanization.unwrap_or(config.default_urbanization);

    let mut t = Tally::default();

    score_rainfall(&mut t, series, &config.rainfall_thresholds);
    if let Some(basin) = basin {
        score_basin(&mut t, basin, series);
    }
    if let Some(hazard) = hazard {
        score_hazard(&mut t, hazard);
    }

    // ── Terrain ─────────────────────────────────────────────────────────────
    t.score += soil_saturation * 15.0;
    if soil_saturation > 0.7 {
        t.factors.push("Soil is highly saturated".into());
    } else if soil_saturation > 0.4 {
        t.factors.push("Soil is moderately saturated".into());
    }

    t.score += slope_factor * 10.0;
    if slope_factor > 0.6 {
        t.factors.push("Steep slopes in the area".into());
    }

    // A measured river distance replaces the proximity estimate.
    if hazard.and_then(|h| h.river_distance_m).is_none() {
        t.score += river_proximity * 10.0;
        if river_proximity > 0.6 {
            t.factors.push("Location is close to river or stream beds".into());
        }
    }

    t.score += urbanization * 5.0;
    if urbanization > 0.7 {
        t.factors.push("Dense urbanization may cause drainage problems".into());
    }

    let risk_level = FloodRiskLevel::from_score(t.score);
    let in_zone = hazard.is_some_and(|h| h.is_in_flood_zone);
    let mut recommendations: Vec<String> =
        risk_level.recommendations().iter().map(|s| s.to_string()).collect();
    if in_zone {
        recommendations.extend(IN_ZONE_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    }

    tracing::debug!(score = t.score, ?risk_level, ?region, factors = t.factors.len(), "flood risk scored");

    FloodRiskAssessment {
        risk_level,
        risk_score: t.score,
        risk_factors: t.factors,
        recommendations,
        flood_hazard_zones: hazard.map(|h| h.zones.clone()),
        is_in_flood_zone: hazard.map(|h| h.is_in_flood_zone),
        region,
    }
}

/// End-to-end scoring. When `hazard` is not supplied the hazard source is
/// asked once; a failed lookup is logged and the hazard group is omitted.
pub async fn calculate_flood_risk<H: HazardZoneSource>(
    series: &WeatherSeries,
    basin: Option<&BasinStatus>,
    hazard: Option<&HazardMembership>,
    overrides: Option<&TerrainOverrides>,
    hazard_source: &H,
    config: &FloodConfig,
) -> FloodRiskAssessment {
    if hazard.is_some() {
        return score(series, basin, hazard, overrides, config);
    }
    let at = series.location.latlon();
    let fetched = match hazard_source.hazard_membership(at).await {
        Ok(h) => Some(h),
        Err(err) => {
            tracing::warn!(%err, lat = at.lat, lon = at.lon, "hazard zone lookup failed, scoring without it");
            None
        }
    };
    score(series, basin, fetched.as_ref(), overrides, config)
}

/// Inputs for one location in [`score_batch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreInput {
    pub series: WeatherSeries,
    #[serde(default)]
    pub basin: Option<BasinStatus>,
    #[serde(default)]
    pub hazard: Option<HazardMembership>,
    #[serde(default)]
    pub overrides: Option<TerrainOverrides>,
}

fn score_input(input: &ScoreInput, config: &FloodConfig) -> FloodRiskAssessment {
    score(
        &input.series,
        input.basin.as_ref(),
        input.hazard.as_ref(),
        input.overrides.as_ref(),
        config,
    )
}

/// Score independent locations; parallel with the `threading` feature.
pub fn score_batch(inputs: &[ScoreInput], config: &FloodConfig) -> Vec<FloodRiskAssessment> {
    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        inputs.par_iter().map(|i| score_input(i, config)).collect()
    }
    #[cfg(not(feature = "threading"))]
    {
        inputs.iter().map(|i| score_input(i, config)).collect()
    }
}
