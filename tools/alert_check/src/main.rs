/// Alert policy check against a JSON-file settings/history store.
///
/// Prints whether an alert at the given level would go out now, and through
/// which channels. With `--record` the alert is dispatched to the log and
/// appended to the stored history.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;

use floodwatch_cli::{init_logging, LogLevel};
use floodwatch_core::alert::{
    active_channels, should_alert, AlertChannel, AlertManager, AlertRecord, KeyValueStore,
};
use floodwatch_core::error::StoreError;
use floodwatch_core::{FlashFloodRiskLevel, Location};

#[derive(Parser, Debug)]
#[command(name = "alert_check", about = "Decide whether a flash-flood alert would be sent")]
struct Args {
    /// JSON file holding `alertSettings` and `alertHistory`; created on write.
    #[arg(short, long)]
    store: PathBuf,

    /// Flash-flood risk level: LOW, MODERATE, HIGH or EXTREME.
    #[arg(long, value_parser = parse_level)]
    level: FlashFloodRiskLevel,

    /// Minutes until the expected flooding.
    #[arg(long, default_value_t = 60)]
    lead_time: u32,

    #[arg(long, default_value = "Current location")]
    location_name: String,

    #[arg(long, default_value_t = 39.925533, allow_negative_numbers = true)]
    lat: f64,

    #[arg(long, default_value_t = 32.866287, allow_negative_numbers = true)]
    lon: f64,

    /// Dispatch and record the alert when the policy allows it.
    #[arg(long)]
    record: bool,

    /// Log level.
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

fn parse_level(s: &str) -> Result<FlashFloodRiskLevel, String> {
    serde_json::from_value(Value::String(s.to_uppercase()))
        .map_err(|_| format!("unknown level `{s}` (expected LOW, MODERATE, HIGH or EXTREME)"))
}

// ── File-backed store ─────────────────────────────────────────────────────────

/// Keys map to JSON values inside one object; every write rewrites the file.
struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonFileStore {
    fn open(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(Value::to_string))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let value: Value = serde_json::from_str(&value)
            .map_err(|source| StoreError::Codec { key: key.to_string(), source })?;
        self.entries.insert(key.to_string(), value);
        let text = serde_json::to_string_pretty(&self.entries)
            .map_err(|source| StoreError::Codec { key: key.to_string(), source })?;
        fs::write(&self.path, text)
            .map_err(|e| StoreError::Backend(format!("{}: {e}", self.path.display())))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Decision {
    level: FlashFloodRiskLevel,
    should_alert: bool,
    channels: Vec<AlertChannel>,
    last_alert_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<AlertRecord>,
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level)?;

    let mut manager = AlertManager::new(JsonFileStore::open(args.store.clone())?);
    let settings = manager.settings();
    let last_alert_at = manager.last_alert_at();
    let now = Local::now();

    let decision = should_alert(args.level, &settings, last_alert_at, &now);
    let channels = active_channels(&settings, args.level);

    let record = if args.record {
        let location = Location::new(args.location_name.clone(), args.lat, args.lon);
        manager
            .notify(args.level, &location, args.lead_time, &now)
            .with_context(|| format!("Failed to record alert in {}", args.store.display()))?
    } else {
        None
    };

    let report = Decision { level: args.level, should_alert: decision, channels, last_alert_at, record };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
