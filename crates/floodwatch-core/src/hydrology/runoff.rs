//! Curve-number rainfall-runoff estimate.
//!
//! A simplified derivative of the SCS Curve Number method: the land-cover
//! base CN is nudged by antecedent rainfall and soil moisture, then
//!   S  = 25400 / CN − 254
//!   Ia = 0.2 · S
//!   Q  = (P − Ia)² / (P − Ia + S)   for P > Ia, else 0
//! with P = intensity · duration. All depths in mm.
use serde::{Deserialize, Serialize};

/// Upper CN bound; keeps S strictly positive.
pub const CN_MAX: f64 = 99.5;
/// Lower CN bound; keeps S finite for pathological inputs.
pub const CN_MIN: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandCover {
    Urban,
    Forest,
    Agricultural,
    Barren,
    /// Any land cover the base table does not know; CN 75.
    #[serde(other)]
    Other,
}

/// Immutable per-evaluation rainfall and land snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RainfallSample {
    pub intensity_mm_hr: f64,
    pub duration_hours: f64,
    /// Rainfall over the preceding days, mm.
    pub antecedent_rainfall_mm: f64,
    /// 0-1.
    pub soil_moisture: f64,
    pub land_cover: LandCover,
    pub slope_percent: f64,
    /// 0-100.
    pub impervious_area_percent: f64,
}

impl RainfallSample {
    pub fn total_rainfall_mm(&self) -> f64 {
        self.intensity_mm_hr * self.duration_hours
    }
}

fn base_curve_number(sample: &RainfallSample) -> f64 {
    match sample.land_cover {
        LandCover::Urban => 90.0 + sample.impervious_area_percent / 10.0,
        LandCover::Forest => 55.0 + sample.slope_percent / 5.0,
        LandCover::Agricultural => 70.0 + sample.slope_percent / 4.0,
        LandCover::Barren => 80.0 + sample.slope_percent / 3.0,
        LandCover::Other => 75.0,
    }
}

/// Adjusted curve number, clamped to `[CN_MIN, CN_MAX]`.
pub fn curve_number(sample: &RainfallSample) -> f64 {
    let mut cn = base_curve_number(sample);
    cn += (sample.antecedent_rainfall_mm / 10.0) * (1.0 - cn / 100.0);
    cn += sample.soil_moisture * 15.0;
    debug_assert!(!cn.is_infinite(), "curve number overflowed: {cn}");
    // NaN inputs fall to the floor instead of propagating.
    if cn.is_nan() {
        return CN_MIN;
    }
    cn.clamp(CN_MIN, CN_MAX)
}

/// Surface runoff depth in mm. Never negative.
pub fn estimate_runoff(sample: &RainfallSample) -> f64 {
    let cn = curve_number(sample);
    let s = 25400.0 / cn - 254.0;
    let ia = 0.2 * s;
    let rainfall = sample.total_rainfall_mm();

    let runoff = if rainfall > ia {
        (rainfall - ia).powi(2) / (rainfall - ia + s)
    } else {
        0.0
    };
    tracing::debug!(cn, s, ia, rainfall, runoff, "runoff estimate");
    runoff
}
