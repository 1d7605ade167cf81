//! When to alert, and through which channels.
//!
//! A prediction is alerted only when every rule passes:
//!   enabled  ∧  level ≥ minRiskLevel
//!            ∧  (outside quiet hours  ∨  EXTREME with overrideForCritical)
//!            ∧  (no previous alert  ∨  cooldown = 0  ∨  elapsed ≥ cooldown)
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::coords::LatLon;
use crate::flash_flood::FlashFloodRiskLevel;

/// Delivery channel. The declaration order is the order channels are listed
/// and dispatched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertChannel {
    Sms,
    Email,
    Push,
    PhoneCall,
    EmergencyServices,
}

impl AlertChannel {
    pub const ALL: [AlertChannel; 5] = [
        AlertChannel::Sms,
        AlertChannel::Email,
        AlertChannel::Push,
        AlertChannel::PhoneCall,
        AlertChannel::EmergencyServices,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlertChannel::Sms => "SMS",
            AlertChannel::Email => "EMAIL",
            AlertChannel::Push => "PUSH",
            AlertChannel::PhoneCall => "PHONE_CALL",
            AlertChannel::EmergencyServices => "EMERGENCY_SERVICES",
        }
    }

    /// Lowest level at which an enabled channel is actually used.
    fn min_level(self) -> FlashFloodRiskLevel {
        match self {
            AlertChannel::EmergencyServices => FlashFloodRiskLevel::Extreme,
            AlertChannel::PhoneCall => FlashFloodRiskLevel::High,
            _ => FlashFloodRiskLevel::Low,
        }
    }
}

impl fmt::Display for AlertChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelConfig {
    pub enabled: bool,
    pub contact_info: String,
}

impl ChannelConfig {
    fn new(enabled: bool, contact_info: &str) -> Self {
        Self { enabled, contact_info: contact_info.to_string() }
    }
}

/// Daily window, in the clock time of the `now` passed to [`should_alert`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuietHours {
    pub enabled: bool,
    /// "HH:MM".
    pub start: String,
    /// "HH:MM".
    pub end: String,
    #[serde(default)]
    pub override_for_critical: bool,
}

fn parse_hhmm(s: &str) -> Option<u32> {
    let (h, m) = s.trim().split_once(':')?;
    let (h, m): (u32, u32) = (h.parse().ok()?, m.parse().ok()?);
    (h < 24 && m < 60).then_some(h * 60 + m)
}

impl QuietHours {
    /// Whether `minute_of_day` falls in the window, both ends inclusive.
    /// A window whose end is not after its start wraps past midnight, so
    /// `start == end` covers the whole day. `None` when either bound is
    /// not a valid "HH:MM".
    pub fn contains(&self, minute_of_day: u32) -> Option<bool> {
        let start = parse_hhmm(&self.start)?;
        let end = parse_hhmm(&self.end)?;
        Some(if end > start {
            (start..=end).contains(&minute_of_day)
        } else {
            minute_of_day >= start || minute_of_day <= end
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettings {
    pub enabled: bool,
    pub min_risk_level: FlashFloodRiskLevel,
    pub channels: BTreeMap<AlertChannel, ChannelConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,
    #[serde(alias = "notificationRadius")]
    pub notification_radius_km: f64,
    #[serde(alias = "cooldownPeriod")]
    pub cooldown_period_minutes: u32,
}

impl Default for AlertSettings {
    fn default() -> Self {
        let channels = BTreeMap::from([
            (AlertChannel::Sms, ChannelConfig::new(true, "")),
            (AlertChannel::Email, ChannelConfig::new(true, "")),
            (AlertChannel::Push, ChannelConfig::new(true, "browser")),
            (AlertChannel::PhoneCall, ChannelConfig::new(false, "")),
            (AlertChannel::EmergencyServices, ChannelConfig::new(false, "112")),
        ]);
        Self {
            enabled: true,
            min_risk_level: FlashFloodRiskLevel::Moderate,
            channels,
            quiet_hours: None,
            notification_radius_km: 25.0,
            cooldown_period_minutes: 60,
        }
    }
}

impl AlertSettings {
    /// Whether a prediction centred at `center` is close enough to `user`.
    pub fn covers(&self, user: LatLon, center: LatLon) -> bool {
        user.distance_km(center) <= self.notification_radius_km
    }

    pub fn contact(&self, channel: AlertChannel) -> Option<&str> {
        self.channels
            .get(&channel)
            .map(|c| c.contact_info.as_str())
            .filter(|c| !c.is_empty())
    }

    fn in_quiet_hours(&self, minute_of_day: u32) -> bool {
        let Some(quiet) = self.quiet_hours.as_ref().filter(|q| q.enabled) else {
            return false;
        };
        match quiet.contains(minute_of_day) {
            Some(inside) => inside,
            None => {
                tracing::warn!(start = %quiet.start, end = %quiet.end, "unparsable quiet hours, ignoring them");
                false
            }
        }
    }
}

/// Whether a prediction at `level` should raise an alert at `now`.
///
/// Quiet hours are read in `now`'s own time zone; pass a local
/// `DateTime` to evaluate them in the user's clock.
pub fn should_alert<Tz: TimeZone>(
    level: FlashFloodRiskLevel,
    settings: &AlertSettings,
    last_alert: Option<DateTime<Utc>>,
    now: &DateTime<Tz>,
) -> bool {
    if !settings.enabled || level < settings.min_risk_level {
        return false;
    }

    let minute_of_day = now.hour() * 60 + now.minute();
    if settings.in_quiet_hours(minute_of_day) {
        let critical_override = level == FlashFloodRiskLevel::Extreme
            && settings.quiet_hours.as_ref().is_some_and(|q| q.override_for_critical);
        if !critical_override {
            return false;
        }
    }

    if let Some(last) = last_alert {
        if settings.cooldown_period_minutes > 0 {
            let elapsed_min = (now.with_timezone(&Utc) - last).num_milliseconds() as f64 / 60_000.0;
            if elapsed_min < f64::from(settings.cooldown_period_minutes) {
                return false;
            }
        }
    }
    true
}

/// Enabled channels usable at `level`, in [`AlertChannel`] order.
pub fn active_channels(settings: &AlertSettings, level: FlashFloodRiskLevel) -> Vec<AlertChannel> {
    settings
        .channels
        .iter()
        .filter(|(channel, config)| config.enabled && level >= channel.min_level())
        .map(|(channel, _)| *channel)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 3, h, m, 0).unwrap()
    }

    fn quiet(start: &str, end: &str, override_for_critical: bool) -> AlertSettings {
        AlertSettings {
            quiet_hours: Some(QuietHours {
                enabled: true,
                start: start.into(),
                end: end.into(),
                override_for_critical,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let s = AlertSettings::default();
        assert!(s.enabled);
        assert_eq!(s.min_risk_level, FlashFloodRiskLevel::Moderate);
        assert_eq!(s.contact(AlertChannel::Push), Some("browser"));
        assert_eq!(s.contact(AlertChannel::EmergencyServices), Some("112"));
        assert_eq!(s.contact(AlertChannel::Sms), None);
        assert_eq!(s.notification_radius_km, 25.0);
        assert_eq!(s.cooldown_period_minutes, 60);
    }

    #[test]
    fn level_threshold() {
        let s = AlertSettings::default();
        assert!(!should_alert(FlashFloodRiskLevel::Low, &s, None, &at(12, 0)));
        for level in &FlashFloodRiskLevel::ALL[1..] {
            assert!(should_alert(*level, &s, None, &at(12, 0)), "{level:?}");
        }
        let off = AlertSettings { enabled: false, ..Default::default() };
        assert!(!should_alert(FlashFloodRiskLevel::Extreme, &off, None, &at(12, 0)));
    }

    #[test]
    fn wrap_around_quiet_hours() {
        let s = quiet("22:00", "07:00", false);
        assert!(!should_alert(FlashFloodRiskLevel::High, &s, None, &at(23, 30)));
        assert!(!should_alert(FlashFloodRiskLevel::High, &s, None, &at(3, 0)));
        assert!(!should_alert(FlashFloodRiskLevel::High, &s, None, &at(7, 0)));
        assert!(should_alert(FlashFloodRiskLevel::High, &s, None, &at(12, 0)));
        assert!(should_alert(FlashFloodRiskLevel::High, &s, None, &at(7, 1)));
    }

    #[test]
    fn daytime_quiet_hours_inclusive() {
        let s = quiet("13:00", "14:00", false);
        assert!(!should_alert(FlashFloodRiskLevel::High, &s, None, &at(13, 0)));
        assert!(!should_alert(FlashFloodRiskLevel::High, &s, None, &at(14, 0)));
        assert!(should_alert(FlashFloodRiskLevel::High, &s, None, &at(14, 1)));
    }

    #[test]
    fn equal_bounds_cover_the_day() {
        let s = quiet("08:00", "08:00", false);
        for h in [0, 8, 12, 23] {
            assert!(!should_alert(FlashFloodRiskLevel::High, &s, None, &at(h, 15)), "{h}:15");
        }
    }

    #[test]
    fn critical_override_only_for_extreme() {
        let s = quiet("22:00", "07:00", true);
        assert!(should_alert(FlashFloodRiskLevel::Extreme, &s, None, &at(23, 30)));
        assert!(!should_alert(FlashFloodRiskLevel::High, &s, None, &at(23, 30)));
        let no_override = quiet("22:00", "07:00", false);
        assert!(!should_alert(FlashFloodRiskLevel::Extreme, &no_override, None, &at(23, 30)));
    }

    #[test]
    fn disabled_or_malformed_quiet_hours_never_block() {
        let mut s = quiet("22:00", "07:00", false);
        s.quiet_hours.as_mut().unwrap().enabled = false;
        assert!(should_alert(FlashFloodRiskLevel::High, &s, None, &at(23, 30)));
        for (start, end) in [("22", "07:00"), ("25:00", "07:00"), ("22:00", "7:xx")] {
            let s = quiet(start, end, false);
            assert!(should_alert(FlashFloodRiskLevel::High, &s, None, &at(23, 30)), "{start}-{end}");
        }
    }

    #[test]
    fn quiet_hours_follow_callers_clock() {
        // 20:30 UTC is 23:30 at UTC+3.
        let s = quiet("22:00", "07:00", false);
        let utc = at(20, 30);
        let local = utc.with_timezone(&FixedOffset::east_opt(3 * 3600).unwrap());
        assert!(should_alert(FlashFloodRiskLevel::High, &s, None, &utc));
        assert!(!should_alert(FlashFloodRiskLevel::High, &s, None, &local));
    }

    #[test]
    fn cooldown() {
        let s = AlertSettings::default();
        let now = at(12, 0);
        let recent = now - Duration::minutes(59);
        let old = now - Duration::minutes(60);
        assert!(!should_alert(FlashFloodRiskLevel::High, &s, Some(recent), &now));
        assert!(should_alert(FlashFloodRiskLevel::High, &s, Some(old), &now));

        let no_cooldown = AlertSettings { cooldown_period_minutes: 0, ..Default::default() };
        assert!(should_alert(FlashFloodRiskLevel::High, &no_cooldown, Some(now), &now));
    }

    #[test]
    fn channel_gating() {
        let mut s = AlertSettings::default();
        for config in s.channels.values_mut() {
            config.enabled = true;
        }
        use AlertChannel::*;
        assert_eq!(active_channels(&s, FlashFloodRiskLevel::Low), vec![Sms, Email, Push]);
        assert_eq!(active_channels(&s, FlashFloodRiskLevel::Moderate), vec![Sms, Email, Push]);
        assert_eq!(active_channels(&s, FlashFloodRiskLevel::High), vec![Sms, Email, Push, PhoneCall]);
        assert_eq!(
            active_channels(&s, FlashFloodRiskLevel::Extreme),
            vec![Sms, Email, Push, PhoneCall, EmergencyServices]
        );
        assert_eq!(
            active_channels(&AlertSettings::default(), FlashFloodRiskLevel::Extreme),
            vec![Sms, Email, Push]
        );
    }

    #[test]
    fn covers_within_radius() {
        let s = AlertSettings::default();
        let ankara = LatLon::new(39.93, 32.86);
        assert!(s.covers(ankara, LatLon::new(40.0, 32.9)));
        assert!(!s.covers(ankara, LatLon::new(41.0, 29.0)));
    }

    #[test]
    fn deserializes_stored_settings() {
        let json = r#"{
            "enabled": true,
            "minRiskLevel": "HIGH",
            "channels": {
                "SMS": { "enabled": true, "contactInfo": "+90 555 000 0000" },
                "PHONE_CALL": { "enabled": true, "contactInfo": "+90 555 000 0001" }
            },
            "quietHours": { "enabled": true, "start": "23:00", "end": "06:30", "overrideForCritical": true },
            "notificationRadius": 10,
            "cooldownPeriod": 30
        }"#;
        let s: AlertSettings = serde_json::from_str(json).unwrap();
        assert_eq!(s.min_risk_level, FlashFloodRiskLevel::High);
        assert_eq!(s.notification_radius_km, 10.0);
        assert_eq!(s.cooldown_period_minutes, 30);
        assert_eq!(
            active_channels(&s, FlashFloodRiskLevel::High),
            vec![AlertChannel::Sms, AlertChannel::PhoneCall]
        );
        let back = serde_json::to_value(&s).unwrap();
        assert_eq!(back["notificationRadiusKm"], 10.0);
        assert!(back["channels"]["PHONE_CALL"]["enabled"].as_bool().unwrap());
    }
}
