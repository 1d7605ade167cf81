//! Flood-hazard-zone membership as returned by the hazard-map collaborator,
//! plus the fixed description and recommendation tables per hazard level.
use serde::{Deserialize, Serialize};

use crate::risk::FloodRiskLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloodHazardZone {
    pub id: String,
    pub name: String,
    /// Return period of the mapped flood, years (e.g. 100, 500).
    pub recurrence_period_years: u32,
    pub risk_level: FloodRiskLevel,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
}

/// Read-only result of a hazard-map lookup for one point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardMembership {
    pub is_in_flood_zone: bool,
    #[serde(default)]
    pub zones: Vec<FloodHazardZone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearest_zone_distance_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub river_distance_m: Option<f64>,
}

impl HazardMembership {
    /// Severity used for scoring when the point is inside a zone. An in-zone
    /// result with no zone list counts as `Low`.
    pub fn in_zone_level(&self) -> Option<FloodRiskLevel> {
        if !self.is_in_flood_zone {
            return None;
        }
        Some(highest_risk_zone(&self.zones).map_or(FloodRiskLevel::Low, |z| z.risk_level))
    }
}

/// The first zone carrying the strictly highest risk level.
pub fn highest_risk_zone(zones: &[FloodHazardZone]) -> Option<&FloodHazardZone> {
    zones.iter().fold(None, |best: Option<&FloodHazardZone>, zone| match best {
        Some(b) if zone.risk_level <= b.risk_level => Some(b),
        _ => Some(zone),
    })
}

pub fn hazard_risk_description(level: FloodRiskLevel) -> &'static str {
    match level {
        FloodRiskLevel::Low => {
            "Low-risk flood zone. May be affected by floods with a 500-year return period."
        }
        FloodRiskLevel::Medium => {
            "Medium-risk flood zone. May be affected by floods with a 100-500 year return period."
        }
        FloodRiskLevel::High => {
            "High-risk flood zone. May be affected by floods with a 50-100 year return period."
        }
        FloodRiskLevel::Extreme => {
            "Very high-risk flood zone. May be affected by floods with a return period under 50 years."
        }
    }
}

/// Land-use guidance for a hazard zone of the given level.
pub fn hazard_recommendations(level: FloodRiskLevel) -> &'static [&'static str] {
    match level {
        FloodRiskLevel::Extreme => &[
            "Avoid new construction in this zone",
            "Apply flood-resilience measures to existing buildings",
            "Prepare emergency evacuation plans",
            "Flood insurance is strongly recommended",
        ],
        FloodRiskLevel::High => &[
            "Construction requires special permits and precautions",
            "Protect ground floors against flooding",
            "Move valuables and utilities to upper levels",
            "Flood insurance is recommended",
        ],
        FloodRiskLevel::Medium => &[
            "Carry out a flood risk assessment before building",
            "Strengthen drainage systems",
            "Install flood early-warning systems",
        ],
        FloodRiskLevel::Low => &[
            "Standard flood precautions are sufficient",
            "Maintain drainage systems regularly",
        ],
    }
}
