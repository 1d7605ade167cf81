//! Rainfall-runoff estimation and single-reach flood routing.
pub mod routing;
pub mod runoff;

pub use routing::{route, ChannelGeometry, MuskingumCoefficients};
pub use runoff::{curve_number, estimate_runoff, LandCover, RainfallSample};
