//! Browser bindings for the floodwatch core.
//!
//! Inputs arrive as JSON strings in the web front end's camelCase shapes;
//! results go back as plain JS objects. The hazard-zone lookup can be
//! delegated to a JS function `(lat, lon) => Promise<HazardMembership>`.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use js_sys::{Function, Promise};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use floodwatch_core::alert::{self, AlertSettings};
use floodwatch_core::basin::BasinStatus;
use floodwatch_core::error::LookupError;
use floodwatch_core::flash_flood::TerrainProfile;
use floodwatch_core::hazard::{self, HazardMembership};
use floodwatch_core::providers::{HazardZoneSource, NoData};
use floodwatch_core::risk::TerrainOverrides;
use floodwatch_core::weather::WeatherSeries;
use floodwatch_core::{FlashFloodRiskLevel, FloodConfig, FloodRiskLevel, LatLon};

// ── Conversions ─────────────────────────────────────────────────────────────

fn parse<T: DeserializeOwned>(what: &str, json: &str) -> Result<T> {
    serde_json::from_str(json).with_context(|| format!("invalid {what}"))
}

fn parse_opt<T: DeserializeOwned>(what: &str, json: Option<&str>) -> Result<Option<T>> {
    json.map(|j| parse(what, j)).transpose()
}

fn parse_config(json: Option<&str>) -> Result<FloodConfig> {
    match json {
        Some(j) => FloodConfig::from_json_str(j).context("invalid config"),
        None => Ok(FloodConfig::default()),
    }
}

fn parse_zone_level(level: &str) -> Result<FloodRiskLevel> {
    serde_json::from_value(serde_json::Value::String(level.to_string()))
        .with_context(|| format!("unknown hazard level `{level}`"))
}

fn parse_level(level: &str) -> Result<FlashFloodRiskLevel> {
    serde_json::from_value(serde_json::Value::String(level.to_string()))
        .with_context(|| format!("unknown risk level `{level}`"))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn js_err(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

// ── Hazard lookup through JS ────────────────────────────────────────────────

struct JsHazardSource {
    fetch: Function,
}

impl HazardZoneSource for JsHazardSource {
    async fn hazard_membership(&self, at: LatLon) -> Result<HazardMembership, LookupError> {
        let returned = self
            .fetch
            .call2(&JsValue::NULL, &JsValue::from_f64(at.lat), &JsValue::from_f64(at.lon))
            .map_err(|e| LookupError::Source(format!("{e:?}")))?;
        let value = JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(|e| LookupError::Source(format!("{e:?}")))?;
        serde_wasm_bindgen::from_value(value).map_err(|e| LookupError::Source(e.to_string()))
    }
}

// ── Entry points ────────────────────────────────────────────────────────────

fn predict(
    location: &str,
    weather: Option<&str>,
    terrain: Option<&str>,
    config: Option<&str>,
    now: DateTime<Utc>,
) -> Result<floodwatch_core::FlashFloodPrediction> {
    let location: LatLon = parse("location", location)?;
    let weather: Option<WeatherSeries> = parse_opt("weather series", weather)?;
    let terrain: Option<TerrainProfile> = parse_opt("terrain profile", terrain)?;
    let config = parse_config(config)?;
    Ok(floodwatch_core::predict_flash_floods(
        location,
        weather.as_ref(),
        terrain.as_ref(),
        &config,
        now,
    ))
}

/// Flash-flood prediction for `{lat, lon}`. Malformed weather data yields
/// the low-risk fallback prediction; malformed JSON is an error.
#[wasm_bindgen(js_name = predictFlashFloods)]
pub fn predict_flash_floods(
    location_json: &str,
    weather_json: Option<String>,
    terrain_json: Option<String>,
    config_json: Option<String>,
) -> Result<JsValue, JsValue> {
    let prediction = predict(
        location_json,
        weather_json.as_deref(),
        terrain_json.as_deref(),
        config_json.as_deref(),
        Utc::now(),
    )
    .map_err(js_err)?;
    to_js(&prediction)
}

/// Flood-risk assessment. When `hazard_json` is absent and `hazard_fetch`
/// is given, the function is awaited for the membership; a rejected or
/// malformed answer drops the hazard factors.
#[wasm_bindgen(js_name = calculateFloodRisk)]
pub async fn calculate_flood_risk(
    series_json: String,
    basin_json: Option<String>,
    hazard_json: Option<String>,
    overrides_json: Option<String>,
    hazard_fetch: Option<Function>,
    config_json: Option<String>,
) -> Result<JsValue, JsValue> {
    let series: WeatherSeries = parse("weather series", &series_json).map_err(js_err)?;
    let basin: Option<BasinStatus> = parse_opt("basin status", basin_json.as_deref()).map_err(js_err)?;
    let hazard: Option<HazardMembership> =
        parse_opt("hazard membership", hazard_json.as_deref()).map_err(js_err)?;
    let overrides: Option<TerrainOverrides> =
        parse_opt("terrain overrides", overrides_json.as_deref()).map_err(js_err)?;
    let config = parse_config(config_json.as_deref()).map_err(js_err)?;

    let assessment = match hazard_fetch {
        Some(fetch) => {
            floodwatch_core::calculate_flood_risk(
                &series,
                basin.as_ref(),
                hazard.as_ref(),
                overrides.as_ref(),
                &JsHazardSource { fetch },
                &config,
            )
            .await
        }
        None => {
            floodwatch_core::calculate_flood_risk(
                &series,
                basin.as_ref(),
                hazard.as_ref(),
                overrides.as_ref(),
                &NoData,
                &config,
            )
            .await
        }
    };
    to_js(&assessment)
}

fn decide(level: &str, settings: &str, last_alert: Option<&str>, now: DateTime<Local>) -> Result<bool> {
    let level = parse_level(level)?;
    let settings: AlertSettings = parse("alert settings", settings)?;
    let last_alert = last_alert
        .map(|t| DateTime::parse_from_rfc3339(t).map(|t| t.with_timezone(&Utc)))
        .transpose()
        .context("invalid last alert timestamp")?;
    Ok(alert::should_alert(level, &settings, last_alert, &now))
}

/// Quiet hours are read in the browser's local time.
#[wasm_bindgen(js_name = shouldAlert)]
pub fn should_alert(
    level: &str,
    settings_json: &str,
    last_alert_timestamp: Option<String>,
) -> Result<bool, JsValue> {
    decide(level, settings_json, last_alert_timestamp.as_deref(), Local::now()).map_err(js_err)
}

fn channels(settings: &str, level: &str) -> Result<Vec<alert::AlertChannel>> {
    let settings: AlertSettings = parse("alert settings", settings)?;
    Ok(alert::active_channels(&settings, parse_level(level)?))
}

#[wasm_bindgen(js_name = getActiveChannels)]
pub fn active_channels(settings_json: &str, level: &str) -> Result<JsValue, JsValue> {
    to_js(&channels(settings_json, level).map_err(js_err)?)
}

#[wasm_bindgen(js_name = estimateRegion)]
pub fn estimate_region(lat: f64, lon: f64) -> String {
    floodwatch_core::estimate_region(lat, lon).as_str().to_string()
}

#[derive(Debug, PartialEq, Serialize)]
struct HazardZoneInfo {
    description: &'static str,
    recommendations: &'static [&'static str],
}

fn zone_info(level: &str) -> Result<HazardZoneInfo> {
    let level = parse_zone_level(level)?;
    Ok(HazardZoneInfo {
        description: hazard::hazard_risk_description(level),
        recommendations: hazard::hazard_recommendations(level),
    })
}

/// Description and land-use guidance for a hazard zone of `level`
/// (LOW, MEDIUM, HIGH or EXTREME).
#[wasm_bindgen(js_name = hazardZoneInfo)]
pub fn hazard_zone_info(level: &str) -> Result<JsValue, JsValue> {
    to_js(&zone_info(level).map_err(js_err)?)
}

#[wasm_bindgen(js_name = defaultAlertSettings)]
pub fn default_alert_settings() -> Result<JsValue, JsValue> {
    to_js(&AlertSettings::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use floodwatch_core::alert::AlertChannel;

    #[test]
    fn prediction_from_json() {
        let now = Utc.with_ymd_and_hms(2024, 9, 14, 15, 0, 0).unwrap();
        let p = predict(
            r#"{"lat": 41.0, "lon": 29.0}"#,
            Some(r#"{"location": {"name": "Istanbul", "lat": 41.0, "lon": 29.0},
                     "forecastStep": 6, "values": [0, 0, 0, 0, 0, 0]}"#),
            None,
            None,
            now,
        )
        .unwrap();
        assert_eq!(p.risk_level, FlashFloodRiskLevel::Low);
        assert_eq!(p.timestamp, now);
    }

    #[test]
    fn bad_json_names_the_input() {
        let err = predict("{}", None, None, None, Utc::now()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid location"), "{err:#}");
        let err = predict(r#"{"lat": 1, "lon": 2}"#, None, None, Some("[]"), Utc::now()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid config"), "{err:#}");
    }

    #[test]
    fn alert_decisions_from_json() {
        let settings = serde_json::to_string(&AlertSettings::default()).unwrap();
        let now = Local::now();
        assert!(decide("HIGH", &settings, None, now).unwrap());
        assert!(!decide("LOW", &settings, None, now).unwrap());
        let just_now = now.with_timezone(&Utc).to_rfc3339();
        assert!(!decide("HIGH", &settings, Some(&just_now), now).unwrap());
        assert!(decide("MEDIUM", &settings, None, now).is_err());
        assert_eq!(
            channels(&settings, "EXTREME").unwrap(),
            vec![AlertChannel::Sms, AlertChannel::Email, AlertChannel::Push]
        );
    }

    #[test]
    fn hazard_zone_panel_tables() {
        let info = zone_info("HIGH").unwrap();
        assert!(info.description.contains("50-100 year"), "{}", info.description);
        assert_eq!(info.recommendations.len(), 4);
        assert_eq!(info.recommendations[3], "Flood insurance is recommended");
        assert_eq!(zone_info("LOW").unwrap().recommendations.len(), 2);
        assert!(zone_info("MODERATE").is_err());
    }

    #[test]
    fn region_codes() {
        assert_eq!(estimate_region(41.0, 29.0), "MARMARA");
        assert_eq!(estimate_region(0.0, 0.0), floodwatch_core::RegionCode::Default.as_str());
    }
}
