//! Alert records, message text, dispatch and history.
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::policy::{active_channels, should_alert, AlertChannel, AlertSettings};
use super::store::{load_json, save_json, KeyValueStore, HISTORY_KEY, HISTORY_LIMIT, SETTINGS_KEY};
use crate::coords::Location;
use crate::error::StoreError;
use crate::flash_flood::{FlashFloodPrediction, FlashFloodRiskLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Pending,
    Sent,
    Delivered,
    Failed,
    Acknowledged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub risk_level: FlashFloodRiskLevel,
    pub message: String,
    pub location: Location,
    pub channels: Vec<AlertChannel>,
    pub status: AlertStatus,
    pub priority: AlertPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// One "CHANNEL: contact" entry per channel.
    #[serde(default)]
    pub sent_to: Vec<String>,
}

pub fn alert_priority(level: FlashFloodRiskLevel) -> AlertPriority {
    match level {
        FlashFloodRiskLevel::Extreme => AlertPriority::Critical,
        FlashFloodRiskLevel::High => AlertPriority::High,
        FlashFloodRiskLevel::Moderate => AlertPriority::Medium,
        FlashFloodRiskLevel::Low => AlertPriority::Low,
    }
}

fn format_lead_time(minutes: u32) -> String {
    if minutes < 60 {
        format!("{minutes} minutes")
    } else {
        format!("{} hours {} minutes", minutes / 60, minutes % 60)
    }
}

pub fn alert_message(level: FlashFloodRiskLevel, location_name: &str, lead_minutes: u32) -> String {
    let lead = format_lead_time(lead_minutes);
    match level {
        FlashFloodRiskLevel::Extreme => format!(
            "EMERGENCY ALERT: Very severe flash flooding expected in {location_name} in about {lead}. Move to a safe area IMMEDIATELY!"
        ),
        FlashFloodRiskLevel::High => format!(
            "URGENT WARNING: High flash flood risk in {location_name} in about {lead}. Move away from stream beds and go to a safe area."
        ),
        FlashFloodRiskLevel::Moderate => format!(
            "WARNING: Flash flooding possible in {location_name} in about {lead}. Stay away from stream beds and follow updates."
        ),
        FlashFloodRiskLevel::Low => format!(
            "INFO: Flash flood risk in {location_name} is low. Take normal precautions and follow the weather forecast."
        ),
    }
}

/// Build a pending record for `channels`, addressed with the contacts in
/// `settings`.
pub fn compose_alert(
    level: FlashFloodRiskLevel,
    location: &Location,
    lead_minutes: u32,
    channels: Vec<AlertChannel>,
    settings: &AlertSettings,
    now: DateTime<Utc>,
) -> AlertRecord {
    let sent_to = channels
        .iter()
        .map(|&c| format!("{c}: {}", settings.contact(c).unwrap_or("unknown")))
        .collect();
    let id = format!("alert-{}-{}", now.timestamp_millis(), rand::thread_rng().gen_range(0..1000));
    AlertRecord {
        id,
        timestamp: now,
        risk_level: level,
        message: alert_message(level, &location.name, lead_minutes),
        location: location.clone(),
        channels,
        status: AlertStatus::Pending,
        priority: alert_priority(level),
        acknowledged_at: None,
        sent_to,
    }
}

/// Delivers a composed alert and reports the resulting status.
pub trait AlertDispatcher {
    fn dispatch(&self, record: &AlertRecord) -> AlertStatus;
}

/// Writes the alert to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

impl AlertDispatcher for LogDispatcher {
    fn dispatch(&self, record: &AlertRecord) -> AlertStatus {
        tracing::info!(
            id = %record.id,
            priority = ?record.priority,
            recipients = %record.sent_to.join(", "),
            "{}",
            record.message
        );
        AlertStatus::Sent
    }
}

const TEST_LEAD_MINUTES: u32 = 120;

fn test_location() -> Location {
    Location::new("Test Location", 39.925533, 32.866287)
}

/// Settings and history in a [`KeyValueStore`], plus the dispatcher alerts
/// go out through.
pub struct AlertManager<S, D = LogDispatcher> {
    store: S,
    dispatcher: D,
}

impl<S: KeyValueStore> AlertManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_dispatcher(store, LogDispatcher)
    }
}

impl<S: KeyValueStore, D: AlertDispatcher> AlertManager<S, D> {
    pub fn with_dispatcher(store: S, dispatcher: D) -> Self {
        Self { store, dispatcher }
    }

    /// Stored settings; defaults when absent or unreadable.
    pub fn settings(&self) -> AlertSettings {
        match load_json(&self.store, SETTINGS_KEY) {
            Ok(Some(settings)) => settings,
            Ok(None) => AlertSettings::default(),
            Err(err) => {
                tracing::warn!(%err, "could not read alert settings, using defaults");
                AlertSettings::default()
            }
        }
    }

    pub fn save_settings(&mut self, settings: &AlertSettings) -> Result<(), StoreError> {
        save_json(&mut self.store, SETTINGS_KEY, settings)
    }

    /// Newest first; empty when absent or unreadable.
    pub fn history(&self) -> Vec<AlertRecord> {
        match load_json(&self.store, HISTORY_KEY) {
            Ok(history) => history.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(%err, "could not read alert history, starting empty");
                Vec::new()
            }
        }
    }

    pub fn push_history(&mut self, record: AlertRecord) -> Result<(), StoreError> {
        let mut history = self.history();
        history.insert(0, record);
        history.truncate(HISTORY_LIMIT);
        save_json(&mut self.store, HISTORY_KEY, &history)
    }

    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        self.history().first().map(|r| r.timestamp)
    }

    /// Mark the record `id` acknowledged. `Ok(false)` when no such record.
    pub fn acknowledge(&mut self, id: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut history = self.history();
        let Some(record) = history.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        record.status = AlertStatus::Acknowledged;
        record.acknowledged_at = Some(now);
        save_json(&mut self.store, HISTORY_KEY, &history)?;
        Ok(true)
    }

    /// Alert the user at `location` about `prediction` if the stored
    /// settings allow it. Returns the dispatched record, if any.
    pub fn evaluate<Tz: TimeZone>(
        &mut self,
        prediction: &FlashFloodPrediction,
        location: &Location,
        now: &DateTime<Tz>,
    ) -> Result<Option<AlertRecord>, StoreError> {
        if !self.settings().covers(location.latlon(), prediction.affected_area.center) {
            tracing::debug!(location = %location.name, "prediction outside notification radius");
            return Ok(None);
        }
        self.notify(prediction.risk_level, location, prediction.lead_time_minutes, now)
    }

    /// Apply the alert policy to `level` and dispatch through the active
    /// channels when it passes.
    pub fn notify<Tz: TimeZone>(
        &mut self,
        level: FlashFloodRiskLevel,
        location: &Location,
        lead_minutes: u32,
        now: &DateTime<Tz>,
    ) -> Result<Option<AlertRecord>, StoreError> {
        let settings = self.settings();
        if !should_alert(level, &settings, self.last_alert_at(), now) {
            tracing::debug!(?level, "alert suppressed by settings");
            return Ok(None);
        }
        let channels = active_channels(&settings, level);
        if channels.is_empty() {
            tracing::debug!(?level, "no active alert channel");
            return Ok(None);
        }
        let now = now.with_timezone(&Utc);
        self.send(level, location, lead_minutes, channels, &settings, now).map(Some)
    }

    /// Send a MODERATE test alert through the currently active channels.
    pub fn send_test_alert(&mut self, now: DateTime<Utc>) -> Result<Option<AlertRecord>, StoreError> {
        let settings = self.settings();
        if !settings.enabled {
            tracing::warn!("alerts are disabled, not sending a test alert");
            return Ok(None);
        }
        let level = FlashFloodRiskLevel::Moderate;
        let channels = active_channels(&settings, level);
        if channels.is_empty() {
            tracing::warn!("no active alert channel, not sending a test alert");
            return Ok(None);
        }
        self.send(level, &test_location(), TEST_LEAD_MINUTES, channels, &settings, now)
            .map(Some)
    }

    fn send(
        &mut self,
        level: FlashFloodRiskLevel,
        location: &Location,
        lead_minutes: u32,
        channels: Vec<AlertChannel>,
        settings: &AlertSettings,
        now: DateTime<Utc>,
    ) -> Result<AlertRecord, StoreError> {
        let mut record = compose_alert(level, location, lead_minutes, channels, settings, now);
        record.status = self.dispatcher.dispatch(&record);
        self.push_history(record.clone())?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::policy::QuietHours;
    use crate::alert::store::MemoryStore;
    use crate::coords::LatLon;
    use chrono::Duration;
    use std::cell::RefCell;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 3, 14, 0, 0).unwrap()
    }

    fn home() -> Location {
        Location::new("Ankara", 39.93, 32.86)
    }

    fn prediction(level: FlashFloodRiskLevel, lead: u32) -> FlashFloodPrediction {
        let mut p = FlashFloodPrediction::fallback(home().latlon(), now());
        p.risk_level = level;
        p.lead_time_minutes = lead;
        p
    }

    /// Records every dispatched id and fails deliveries.
    #[derive(Default)]
    struct Recording {
        sent: RefCell<Vec<String>>,
    }

    impl AlertDispatcher for &Recording {
        fn dispatch(&self, record: &AlertRecord) -> AlertStatus {
            self.sent.borrow_mut().push(record.id.clone());
            AlertStatus::Failed
        }
    }

    #[test]
    fn priorities() {
        assert_eq!(alert_priority(FlashFloodRiskLevel::Extreme), AlertPriority::Critical);
        assert_eq!(alert_priority(FlashFloodRiskLevel::High), AlertPriority::High);
        assert_eq!(alert_priority(FlashFloodRiskLevel::Moderate), AlertPriority::Medium);
        assert_eq!(alert_priority(FlashFloodRiskLevel::Low), AlertPriority::Low);
    }

    #[test]
    fn lead_time_wording() {
        assert!(alert_message(FlashFloodRiskLevel::High, "Rize", 45).contains("in about 45 minutes"));
        assert!(alert_message(FlashFloodRiskLevel::High, "Rize", 125).contains("in about 2 hours 5 minutes"));
        assert!(alert_message(FlashFloodRiskLevel::Extreme, "Rize", 60).contains("1 hours 0 minutes"));
        let low = alert_message(FlashFloodRiskLevel::Low, "Rize", 45);
        assert!(low.starts_with("INFO:") && !low.contains("minutes"), "{low}");
    }

    #[test]
    fn composed_record_addresses_contacts() {
        let record = compose_alert(
            FlashFloodRiskLevel::Moderate,
            &home(),
            90,
            vec![AlertChannel::Sms, AlertChannel::Push],
            &AlertSettings::default(),
            now(),
        );
        assert!(record.id.starts_with(&format!("alert-{}-", now().timestamp_millis())));
        assert_eq!(record.status, AlertStatus::Pending);
        assert_eq!(record.priority, AlertPriority::Medium);
        assert_eq!(record.sent_to, vec!["SMS: unknown", "PUSH: browser"]);
        assert!(record.message.contains("Ankara") && record.message.contains("1 hours 30 minutes"));
    }

    #[test]
    fn settings_default_when_missing_or_corrupt() {
        let mut store = MemoryStore::new();
        assert_eq!(AlertManager::new(store.clone()).settings(), AlertSettings::default());
        store.set(SETTINGS_KEY, "{ broken".into()).unwrap();
        let manager = AlertManager::new(store);
        assert_eq!(manager.settings(), AlertSettings::default());
        assert!(manager.history().is_empty());
    }

    #[test]
    fn settings_persist() {
        let mut manager = AlertManager::new(MemoryStore::new());
        let settings = AlertSettings { cooldown_period_minutes: 5, ..Default::default() };
        manager.save_settings(&settings).unwrap();
        assert_eq!(manager.settings(), settings);
    }

    #[test]
    fn history_is_newest_first_and_capped() {
        let mut manager = AlertManager::new(MemoryStore::new());
        for i in 0..(HISTORY_LIMIT as i64 + 5) {
            let t = now() + Duration::minutes(i);
            let record = compose_alert(FlashFloodRiskLevel::High, &home(), 30, vec![], &AlertSettings::default(), t);
            manager.push_history(record).unwrap();
        }
        let history = manager.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].timestamp, now() + Duration::minutes(HISTORY_LIMIT as i64 + 4));
        assert_eq!(manager.last_alert_at(), Some(history[0].timestamp));
        assert_eq!(history[HISTORY_LIMIT - 1].timestamp, now() + Duration::minutes(5));
    }

    #[test]
    fn evaluate_dispatches_records_and_then_cools_down() {
        let mut manager = AlertManager::new(MemoryStore::new());
        let p = prediction(FlashFloodRiskLevel::High, 40);

        let record = manager.evaluate(&p, &home(), &now()).unwrap().expect("alert sent");
        assert_eq!(record.status, AlertStatus::Sent);
        assert_eq!(record.channels, vec![AlertChannel::Sms, AlertChannel::Email, AlertChannel::Push]);
        assert_eq!(manager.history(), vec![record]);

        let later = now() + Duration::minutes(30);
        assert!(manager.evaluate(&p, &home(), &later).unwrap().is_none());
        let much_later = now() + Duration::minutes(61);
        assert!(manager.evaluate(&p, &home(), &much_later).unwrap().is_some());
        assert_eq!(manager.history().len(), 2);
    }

    #[test]
    fn evaluate_skips_low_quiet_or_channelless() {
        let mut manager = AlertManager::new(MemoryStore::new());
        assert!(manager
            .evaluate(&prediction(FlashFloodRiskLevel::Low, 40), &home(), &now())
            .unwrap()
            .is_none());

        let quiet = AlertSettings {
            quiet_hours: Some(QuietHours {
                enabled: true,
                start: "13:00".into(),
                end: "15:00".into(),
                override_for_critical: false,
            }),
            ..Default::default()
        };
        manager.save_settings(&quiet).unwrap();
        assert!(manager
            .evaluate(&prediction(FlashFloodRiskLevel::Extreme, 10), &home(), &now())
            .unwrap()
            .is_none());

        let mut silent = AlertSettings::default();
        for c in silent.channels.values_mut() {
            c.enabled = false;
        }
        manager.save_settings(&silent).unwrap();
        assert!(manager
            .evaluate(&prediction(FlashFloodRiskLevel::Extreme, 10), &home(), &now())
            .unwrap()
            .is_none());
        assert!(manager.history().is_empty());
    }

    #[test]
    fn evaluate_ignores_far_predictions() {
        let mut manager = AlertManager::new(MemoryStore::new());
        let mut p = prediction(FlashFloodRiskLevel::Extreme, 10);
        p.affected_area.center = LatLon::new(41.0, 29.0);
        assert!(manager.evaluate(&p, &home(), &now()).unwrap().is_none());
    }

    #[test]
    fn dispatcher_status_is_recorded() {
        let recording = Recording::default();
        let mut manager = AlertManager::with_dispatcher(MemoryStore::new(), &recording);
        let record = manager
            .evaluate(&prediction(FlashFloodRiskLevel::Moderate, 90), &home(), &now())
            .unwrap()
            .expect("alert composed");
        assert_eq!(record.status, AlertStatus::Failed);
        assert_eq!(*recording.sent.borrow(), vec![record.id.clone()]);
        assert_eq!(manager.history()[0].status, AlertStatus::Failed);
    }

    #[test]
    fn acknowledge_marks_stored_record() {
        let mut manager = AlertManager::new(MemoryStore::new());
        let record = manager.send_test_alert(now()).unwrap().expect("test alert");
        assert_eq!(record.location.name, "Test Location");
        assert_eq!(record.risk_level, FlashFloodRiskLevel::Moderate);
        assert!(record.message.contains("2 hours 0 minutes"));

        let later = now() + Duration::minutes(3);
        assert!(manager.acknowledge(&record.id, later).unwrap());
        assert!(!manager.acknowledge("alert-0-0", later).unwrap());
        let stored = &manager.history()[0];
        assert_eq!(stored.status, AlertStatus::Acknowledged);
        assert_eq!(stored.acknowledged_at, Some(later));
    }

    #[test]
    fn test_alert_needs_enabled_settings() {
        let mut manager = AlertManager::new(MemoryStore::new());
        manager.save_settings(&AlertSettings { enabled: false, ..Default::default() }).unwrap();
        assert!(manager.send_test_alert(now()).unwrap().is_none());
        assert!(manager.history().is_empty());
    }
}
