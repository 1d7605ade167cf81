//! Error types for the floodwatch core.
//!
//! Scoring entry points never return these for expected missing-data
//! conditions; they surface at the provider, store and config seams and inside
//! the flash-flood pipeline before it falls back.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FloodError {
    #[error("invalid weather series: {0}")]
    InvalidWeather(String),

    #[error("invalid channel geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid terrain profile: {0}")]
    InvalidTerrain(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure of an external basin / hazard-zone lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no data available for ({lat:.4}, {lon:.4})")]
    Unavailable { lat: f64, lon: f64 },

    #[error("lookup source failed: {0}")]
    Source(String),

    #[error("malformed lookup payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure of the key-value persistence backing alert settings and history.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("could not encode or decode `{key}`: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}
