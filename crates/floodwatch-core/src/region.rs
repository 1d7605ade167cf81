//! Coarse bounding-box bucketing of coordinates into Turkish macro-regions,
//! and the per-region default tables keyed by the result.
//!
//! The boxes overlap; `estimate_region` tests them in a fixed order and the
//! first match wins, so branch order is part of the contract.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionCode {
    Marmara,
    Ege,
    Akdeniz,
    IcAnadolu,
    DoguAnadolu,
    GuneydoguAnadolu,
    Karadeniz,
    Default,
}

impl RegionCode {
    pub const ALL: [RegionCode; 8] = [
        RegionCode::Marmara,
        RegionCode::Ege,
        RegionCode::Akdeniz,
        RegionCode::IcAnadolu,
        RegionCode::DoguAnadolu,
        RegionCode::GuneydoguAnadolu,
        RegionCode::Karadeniz,
        RegionCode::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RegionCode::Marmara => "MARMARA",
            RegionCode::Ege => "EGE",
            RegionCode::Akdeniz => "AKDENIZ",
            RegionCode::IcAnadolu => "IC_ANADOLU",
            RegionCode::DoguAnadolu => "DOGU_ANADOLU",
            RegionCode::GuneydoguAnadolu => "GUNEYDOGU_ANADOLU",
            RegionCode::Karadeniz => "KARADENIZ",
            RegionCode::Default => "DEFAULT",
        }
    }
}

/// Classify `(lat, lon)` into a macro-region. Total over all finite and
/// non-finite inputs (NaN falls through to `Default`).
pub fn estimate_region(lat: f64, lon: f64) -> RegionCode {
    if lat > 40.0 && lon < 30.0 {
        RegionCode::Marmara
    } else if lat < 39.0 && lon < 30.0 {
        RegionCode::Ege
    } else if lat < 38.0 && lon > 30.0 {
        RegionCode::Akdeniz
    } else if lat > 38.0 && lat < 41.0 && lon > 30.0 && lon < 36.0 {
        RegionCode::IcAnadolu
    } else if lat > 38.0 && lon > 40.0 {
        RegionCode::DoguAnadolu
    } else if lat < 38.0 && lon > 38.0 {
        RegionCode::GuneydoguAnadolu
    } else if lat > 40.0 && lon > 30.0 && lon < 40.0 {
        RegionCode::Karadeniz
    } else {
        RegionCode::Default
    }
}

// ── Per-region default tables ─────────────────────────────────────────────────

/// Terrain defaults used by the flood-risk scorer when the caller supplies none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionDefaults {
    /// 0-1, 1 = fully saturated.
    pub soil_saturation: f64,
    /// 0-1, 1 = very steep.
    pub slope_factor: f64,
}

pub fn defaults_for_region(region: RegionCode) -> RegionDefaults {
    let (soil_saturation, slope_factor) = match region {
        RegionCode::Marmara => (0.4, 0.3),
        RegionCode::Ege => (0.3, 0.4),
        RegionCode::Akdeniz => (0.2, 0.5),
        RegionCode::IcAnadolu => (0.3, 0.2),
        RegionCode::DoguAnadolu => (0.4, 0.6),
        RegionCode::GuneydoguAnadolu => (0.2, 0.3),
        RegionCode::Karadeniz => (0.6, 0.7),
        RegionCode::Default => (0.4, 0.4),
    };
    RegionDefaults { soil_saturation, slope_factor }
}

/// Nominal basin used when the basin lookup is unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackBasin {
    pub name: &'static str,
    /// Nominal reservoir level, percent.
    pub water_level_percent: f64,
}

pub fn fallback_basin(region: RegionCode) -> FallbackBasin {
    let (name, water_level_percent) = match region {
        RegionCode::Marmara => ("Marmara Basin", 45.0),
        RegionCode::Ege => ("Gediz Basin", 30.0),
        RegionCode::Akdeniz => ("Antalya Basin", 25.0),
        RegionCode::IcAnadolu => ("Konya Closed Basin", 20.0),
        RegionCode::DoguAnadolu => ("Euphrates-Tigris Basin", 50.0),
        RegionCode::GuneydoguAnadolu => ("Euphrates-Tigris Basin", 40.0),
        RegionCode::Karadeniz => ("Eastern Black Sea Basin", 60.0),
        RegionCode::Default => ("Unknown Basin", 30.0),
    };
    FallbackBasin { name, water_level_percent }
}
