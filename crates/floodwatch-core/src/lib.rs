//! Flood and flash-flood risk scoring for a location-based dashboard.
//!
//! The crate is a synchronous, side-effect free pipeline except for two seams:
//! the optional hazard-zone / basin lookups (async [`providers`]) and the
//! alert-history persistence ([`alert::store`]).
//!
//! ```text
//! WeatherSeries ─┬─ summarize_rainfall ─ estimate_runoff ─┬─ route ─────────┐
//!                │                                        └─ classify ─ FlashFloodPrediction ─ AlertManager
//!                └─ estimate_region ─ score ─ FloodRiskAssessment
//! ```
pub mod alert;
pub mod basin;
pub mod config;
pub mod coords;
pub mod error;
pub mod flash_flood;
pub mod hazard;
pub mod hydrology;
pub mod providers;
pub mod region;
pub mod risk;
pub mod weather;

pub use config::FloodConfig;
pub use coords::{LatLon, Location};
pub use error::{FloodError, LookupError};
pub use flash_flood::{predict_flash_floods, FlashFloodPrediction, FlashFloodRiskLevel};
pub use region::{estimate_region, RegionCode};
pub use risk::{calculate_flood_risk, score, FloodRiskAssessment, FloodRiskLevel};
