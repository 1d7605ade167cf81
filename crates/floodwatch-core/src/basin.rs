//! Basin (catchment) status consumed by the flood-risk scorer, and the
//! combined basin check that folds hazard-zone severity into the basin's
//! flood risk.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coords::LatLon;
use crate::hazard::HazardMembership;
use crate::providers::{BasinStatusSource, HazardZoneSource};
use crate::region::{estimate_region, fallback_basin};
use crate::risk::FloodRiskLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiverGauge {
    pub name: String,
    /// Metres.
    pub current_level: f64,
    pub normal_level: f64,
    pub flood_level: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rate_m3s: Option<f64>,
}

impl RiverGauge {
    /// Well above normal, or close to flood stage.
    pub fn is_critical(&self) -> bool {
        self.current_level > self.normal_level * 1.5 || self.current_level > self.flood_level * 0.8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamStatus {
    pub name: String,
    /// 0-100.
    pub fill_rate_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_hm3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_volume_hm3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_rate_m3s: Option<f64>,
}

pub const HIGH_FILL_PERCENT: f64 = 90.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasinStatus {
    pub name: String,
    /// 0-100.
    pub water_level_percent: f64,
    pub flood_risk: FloodRiskLevel,
    pub rainfall_24h_mm: f64,
    /// 0-1.
    pub soil_moisture: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snow_depth_cm: Option<f64>,
    #[serde(default)]
    pub rivers: Vec<RiverGauge>,
    #[serde(default)]
    pub dams: Vec<DamStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl BasinStatus {
    pub fn critical_rivers(&self) -> impl Iterator<Item = &RiverGauge> {
        self.rivers.iter().filter(|r| r.is_critical())
    }

    pub fn high_fill_dams(&self) -> impl Iterator<Item = &DamStatus> {
        self.dams.iter().filter(|d| d.fill_rate_percent > HIGH_FILL_PERCENT)
    }
}

/// Level implied by a reservoir water level alone.
pub fn level_from_water_level(water_level_percent: f64) -> FloodRiskLevel {
    if water_level_percent >= 80.0 {
        FloodRiskLevel::Extreme
    } else if water_level_percent >= 60.0 {
        FloodRiskLevel::High
    } else if water_level_percent >= 40.0 {
        FloodRiskLevel::Medium
    } else {
        FloodRiskLevel::Low
    }
}

/// Outcome of [`check_basin_status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasinCheck {
    pub basin_name: String,
    pub water_level_percent: f64,
    pub flood_risk: FloodRiskLevel,
    pub last_updated: DateTime<Utc>,
    /// `None` when the basin lookup failed and the regional fallback was used.
    pub basin: Option<BasinStatus>,
    pub hazard: Option<HazardMembership>,
}

/// Look up the basin and hazard membership around `at`.
///
/// A failed basin lookup degrades to the regional nominal basin; a failed
/// hazard lookup is dropped. Either way the basin's flood risk is raised to
/// the in-zone hazard level when that is higher.
pub async fn check_basin_status<B, H>(
    at: LatLon,
    basins: &B,
    hazards: &H,
    now: DateTime<Utc>,
) -> BasinCheck
where
    B: BasinStatusSource,
    H: HazardZoneSource,
{
    let (basin_name, water_level_percent, mut flood_risk, last_updated, basin) =
        match basins.basin_status(at).await {
            Ok(status) => (
                status.name.clone(),
                status.water_level_percent,
                status.flood_risk,
                status.last_updated.unwrap_or(now),
                Some(status),
            ),
            Err(err) => {
                tracing::warn!(%err, lat = at.lat, lon = at.lon, "basin lookup failed, using regional fallback");
                let nominal = fallback_basin(estimate_region(at.lat, at.lon));
                let level = nominal.water_level_percent.clamp(0.0, 100.0);
                (nominal.name.to_string(), level, level_from_water_level(level), now, None)
            }
        };

    let hazard = match hazards.hazard_membership(at).await {
        Ok(h) => Some(h),
        Err(err) => {
            tracing::warn!(%err, lat = at.lat, lon = at.lon, "hazard lookup failed");
            None
        }
    };

    if let Some(zone_level) = hazard.as_ref().and_then(HazardMembership::in_zone_level) {
        flood_risk = flood_risk.max(zone_level);
    }

    BasinCheck { basin_name, water_level_percent, flood_risk, last_updated, basin, hazard }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::FloodHazardZone;
    use crate::providers::{NoData, StaticSources};
    use crate::region::RegionCode;
    use chrono::TimeZone;
    use futures_lite::future::block_on;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn river(current: f64, normal: f64, flood: f64) -> RiverGauge {
        RiverGauge {
            name: "Test".into(),
            current_level: current,
            normal_level: normal,
            flood_level: flood,
            flow_rate_m3s: None,
        }
    }

    fn basin(water_level: f64) -> BasinStatus {
        BasinStatus {
            name: "Sakarya Basin".into(),
            water_level_percent: water_level,
            flood_risk: FloodRiskLevel::Low,
            rainfall_24h_mm: 0.0,
            soil_moisture: 0.3,
            snow_depth_cm: None,
            rivers: vec![],
            dams: vec![],
            last_updated: None,
        }
    }

    #[test]
    fn critical_river_either_condition() {
        assert!(river(3.1, 2.0, 10.0).is_critical());
        assert!(river(2.5, 2.0, 3.0).is_critical());
        assert!(!river(2.4, 2.0, 3.0).is_critical());
    }

    #[test]
    fn water_level_bands() {
        assert_eq!(level_from_water_level(80.0), FloodRiskLevel::Extreme);
        assert_eq!(level_from_water_level(79.9), FloodRiskLevel::High);
        assert_eq!(level_from_water_level(40.0), FloodRiskLevel::Medium);
        assert_eq!(level_from_water_level(39.9), FloodRiskLevel::Low);
    }

    #[test]
    fn missing_basin_uses_regional_nominal() {
        let at = LatLon::new(41.0, 39.7); // Karadeniz
        let check = block_on(check_basin_status(at, &NoData, &NoData, now()));
        assert_eq!(check.basin_name, "Eastern Black Sea Basin");
        assert_eq!(check.water_level_percent, 60.0);
        assert_eq!(check.flood_risk, FloodRiskLevel::High);
        assert!(check.basin.is_none() && check.hazard.is_none());
        assert_eq!(check.last_updated, now());
    }

    #[test]
    fn hazard_zone_raises_basin_risk() {
        let hazard = HazardMembership {
            is_in_flood_zone: true,
            zones: vec![FloodHazardZone {
                id: "mar-100-1".into(),
                name: "Nilufer 100-year zone".into(),
                recurrence_period_years: 100,
                risk_level: FloodRiskLevel::High,
                description: String::new(),
                source: String::new(),
            }],
            ..Default::default()
        };
        let sources = StaticSources::default()
            .with_basin(RegionCode::Marmara, basin(20.0))
            .with_hazard(RegionCode::Marmara, hazard);
        let check = block_on(check_basin_status(LatLon::new(41.0, 29.0), &sources, &sources, now()));
        assert_eq!(check.basin_name, "Sakarya Basin");
        assert_eq!(check.flood_risk, FloodRiskLevel::High);
        assert!(check.hazard.is_some());
    }

    #[test]
    fn lower_hazard_level_does_not_lower_basin_risk() {
        let mut b = basin(90.0);
        b.flood_risk = FloodRiskLevel::Extreme;
        let hazard = HazardMembership { is_in_flood_zone: true, ..Default::default() };
        let sources = StaticSources::default()
            .with_basin(RegionCode::Marmara, b)
            .with_hazard(RegionCode::Marmara, hazard);
        let check = block_on(check_basin_status(LatLon::new(41.0, 29.0), &sources, &sources, now()));
        assert_eq!(check.flood_risk, FloodRiskLevel::Extreme);
    }
}
