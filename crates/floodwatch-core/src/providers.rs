//! Data-provider seams for the external basin and hazard-map lookups.
//!
//! The scorers only need "give me the status at this point, or tell me it is
//! unavailable". Real back ends (HTTP, wasm fetch, files) implement these
//! traits outside the core; [`StaticSources`] serves deterministic fixtures
//! keyed by macro-region.
#![allow(async_fn_in_trait)]

use std::collections::HashMap;

use crate::basin::BasinStatus;
use crate::coords::LatLon;
use crate::error::LookupError;
use crate::hazard::HazardMembership;
use crate::region::{estimate_region, RegionCode};

pub trait HazardZoneSource {
    async fn hazard_membership(&self, at: LatLon) -> Result<HazardMembership, LookupError>;
}

pub trait BasinStatusSource {
    async fn basin_status(&self, at: LatLon) -> Result<BasinStatus, LookupError>;
}

impl<T: HazardZoneSource> HazardZoneSource for &T {
    async fn hazard_membership(&self, at: LatLon) -> Result<HazardMembership, LookupError> {
        (**self).hazard_membership(at).await
    }
}

impl<T: BasinStatusSource> BasinStatusSource for &T {
    async fn basin_status(&self, at: LatLon) -> Result<BasinStatus, LookupError> {
        (**self).basin_status(at).await
    }
}

/// A source that never has data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoData;

impl HazardZoneSource for NoData {
    async fn hazard_membership(&self, at: LatLon) -> Result<HazardMembership, LookupError> {
        Err(LookupError::Unavailable { lat: at.lat, lon: at.lon })
    }
}

impl BasinStatusSource for NoData {
    async fn basin_status(&self, at: LatLon) -> Result<BasinStatus, LookupError> {
        Err(LookupError::Unavailable { lat: at.lat, lon: at.lon })
    }
}

/// Fixture-backed source: one basin and one hazard result per macro-region.
/// Regions without an entry are unavailable.
#[derive(Debug, Clone, Default)]
pub struct StaticSources {
    basins: HashMap<RegionCode, BasinStatus>,
    hazards: HashMap<RegionCode, HazardMembership>,
}

impl StaticSources {
    pub fn with_basin(mut self, region: RegionCode, basin: BasinStatus) -> Self {
        self.basins.insert(region, basin);
        self
    }

    pub fn with_hazard(mut self, region: RegionCode, hazard: HazardMembership) -> Self {
        self.hazards.insert(region, hazard);
        self
    }
}

impl HazardZoneSource for StaticSources {
    async fn hazard_membership(&self, at: LatLon) -> Result<HazardMembership, LookupError> {
        self.hazards
            .get(&estimate_region(at.lat, at.lon))
            .cloned()
            .ok_or(LookupError::Unavailable { lat: at.lat, lon: at.lon })
    }
}

impl BasinStatusSource for StaticSources {
    async fn basin_status(&self, at: LatLon) -> Result<BasinStatus, LookupError> {
        self.basins
            .get(&estimate_region(at.lat, at.lon))
            .cloned()
            .ok_or(LookupError::Unavailable { lat: at.lat, lon: at.lon })
    }
}
