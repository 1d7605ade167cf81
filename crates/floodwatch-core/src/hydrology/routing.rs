//! Single-step Muskingum-style channel routing.
//!
//!   K  = L / (0.5 · √S₀)        travel time, hours
//!   D  = K − K·x + 0.5
//!   c₀ = (−K·x + 0.5) / D,  c₁ = (K·x + 0.5) / D,  c₂ = (K − K·x − 0.5) / D
//!   Q  = max(0, c₀·I + (c₁ + c₂)·Q₀ + q_lat·L)
//!
//! Both c₁ and c₂ weight the same initial flow Q₀: this is a one-step
//! approximation, not the multi-step recursion.
use serde::{Deserialize, Serialize};

use crate::error::FloodError;

/// Muskingum weighting factor.
pub const MUSKINGUM_X: f64 = 0.3;

/// Static terrain descriptor of one channel reach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelGeometry {
    pub length_km: f64,
    pub slope_m_per_km: f64,
    /// Manning n. Carried for callers; the one-step routing does not read it.
    pub roughness: f64,
    pub cross_section_area_m2: f64,
    pub initial_flow_m3s: f64,
    pub lateral_inflow_m3s_per_km: f64,
}

impl ChannelGeometry {
    /// Length and slope must be positive for the travel time to exist.
    pub fn validate(&self) -> Result<(), FloodError> {
        if !(self.length_km > 0.0 && self.length_km.is_finite()) {
            return Err(FloodError::InvalidGeometry(format!(
                "channel length must be > 0 km, got {}",
                self.length_km
            )));
        }
        if !(self.slope_m_per_km > 0.0 && self.slope_m_per_km.is_finite()) {
            return Err(FloodError::InvalidGeometry(format!(
                "channel slope must be > 0 m/km, got {}",
                self.slope_m_per_km
            )));
        }
        Ok(())
    }

    /// Travel time K in hours.
    pub fn travel_time_hours(&self) -> f64 {
        self.length_km / (0.5 * self.slope_m_per_km.sqrt())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuskingumCoefficients {
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

impl MuskingumCoefficients {
    pub fn for_travel_time(k: f64) -> Self {
        let x = MUSKINGUM_X;
        let d = k - k * x + 0.5;
        Self {
            c0: (-k * x + 0.5) / d,
            c1: (k * x + 0.5) / d,
            c2: (k - k * x - 0.5) / d,
        }
    }
}

/// Route `inflow_m3s` through `geometry`; outflow in m³/s, never negative.
///
/// Degenerate geometry (see [`ChannelGeometry::validate`]) produces NaN
/// coefficients, which the final clamp turns into 0.
pub fn route(geometry: &ChannelGeometry, inflow_m3s: f64) -> f64 {
    let k = geometry.travel_time_hours();
    let c = MuskingumCoefficients::for_travel_time(k);
    let lateral = geometry.lateral_inflow_m3s_per_km * geometry.length_km;

    let outflow = c.c0 * inflow_m3s
        + c.c1 * geometry.initial_flow_m3s
        + c.c2 * geometry.initial_flow_m3s
        + lateral;
    tracing::debug!(k, c0 = c.c0, c1 = c.c1, c2 = c.c2, outflow, "muskingum step");

    // f64::max returns the non-NaN operand.
    outflow.max(0.0)
}
