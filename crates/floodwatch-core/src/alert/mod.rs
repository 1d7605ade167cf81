//! Alerting on flash-flood predictions.
//!
//! [`policy`] holds the pure decision rules, [`store`] the key-value
//! persistence seam, and [`manager`] ties both to a dispatcher.
pub mod manager;
pub mod policy;
pub mod store;

pub use manager::{
    alert_message, alert_priority, compose_alert, AlertDispatcher, AlertManager, AlertPriority,
    AlertRecord, AlertStatus, LogDispatcher,
};
pub use policy::{active_channels, should_alert, AlertChannel, AlertSettings, ChannelConfig, QuietHours};
pub use store::{KeyValueStore, MemoryStore, HISTORY_KEY, HISTORY_LIMIT, SETTINGS_KEY};
