/// Flash-flood prediction and flood-risk assessment for one forecast file.
///
/// Prints `{ "flashFlood": …, "floodRisk": … }` as pretty JSON on stdout;
/// logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use futures_lite::future::block_on;
use serde::de::DeserializeOwned;
use serde::Serialize;

use floodwatch_cli::{init_logging, LogLevel};
use floodwatch_core::basin::BasinStatus;
use floodwatch_core::error::LookupError;
use floodwatch_core::flash_flood::TerrainProfile;
use floodwatch_core::hazard::HazardMembership;
use floodwatch_core::providers::{HazardZoneSource, NoData};
use floodwatch_core::risk::TerrainOverrides;
use floodwatch_core::weather::WeatherSeries;
use floodwatch_core::{
    calculate_flood_risk, predict_flash_floods, FlashFloodPrediction, FloodConfig,
    FloodRiskAssessment, LatLon,
};

#[derive(Parser, Debug)]
#[command(name = "assess", about = "Score flood and flash-flood risk for a weather forecast")]
struct Args {
    /// Weather series JSON (location, forecastStep, values, optional temperatures).
    #[arg(short, long)]
    weather: PathBuf,

    /// Basin status JSON.
    #[arg(long)]
    basin: Option<PathBuf>,

    /// Hazard-zone membership JSON used as is.
    #[arg(long)]
    hazard: Option<PathBuf>,

    /// Hazard-zone membership JSON consulted only when --hazard is absent.
    /// A missing or malformed file is logged and the hazard factors skipped.
    #[arg(long)]
    hazard_fallback: Option<PathBuf>,

    /// Terrain profile JSON for the flash-flood pipeline.
    #[arg(long)]
    terrain: Option<PathBuf>,

    /// Terrain factor overrides JSON (soilSaturation, slopeFactor, …).
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Scoring config JSON; defaults when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level.
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    flash_flood: FlashFloodPrediction,
    flood_risk: FloodRiskAssessment,
}

// ── Input helpers ─────────────────────────────────────────────────────────────

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_opt<T: DeserializeOwned>(path: Option<&PathBuf>) -> Result<Option<T>> {
    path.map(|p| read_json(p)).transpose()
}

/// Hazard membership read from a file at lookup time.
struct FileHazardSource {
    path: PathBuf,
}

impl HazardZoneSource for FileHazardSource {
    async fn hazard_membership(&self, _at: LatLon) -> Result<HazardMembership, LookupError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| LookupError::Source(format!("{}: {e}", self.path.display())))?;
        Ok(serde_json::from_str(&text)?)
    }
}

struct Inputs {
    series: WeatherSeries,
    basin: Option<BasinStatus>,
    hazard: Option<HazardMembership>,
    overrides: Option<TerrainOverrides>,
}

fn assess_risk<H: HazardZoneSource>(inputs: &Inputs, source: &H, config: &FloodConfig) -> FloodRiskAssessment {
    block_on(calculate_flood_risk(
        &inputs.series,
        inputs.basin.as_ref(),
        inputs.hazard.as_ref(),
        inputs.overrides.as_ref(),
        source,
        config,
    ))
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level)?;

    let config = match &args.config {
        Some(path) => FloodConfig::load(path).context("Failed to load config")?,
        None => FloodConfig::default(),
    };
    let inputs = Inputs {
        series: read_json(&args.weather)?,
        basin: read_opt(args.basin.as_ref())?,
        hazard: read_opt(args.hazard.as_ref())?,
        overrides: read_opt(args.overrides.as_ref())?,
    };
    let terrain: Option<TerrainProfile> = read_opt(args.terrain.as_ref())?;

    let now = Utc::now();
    let flash_flood = predict_flash_floods(
        inputs.series.location.latlon(),
        Some(&inputs.series),
        terrain.as_ref(),
        &config,
        now,
    );
    let flood_risk = match &args.hazard_fallback {
        Some(path) => assess_risk(&inputs, &FileHazardSource { path: path.clone() }, &config),
        None => assess_risk(&inputs, &NoData, &config),
    };
    tracing::info!(
        flash_flood = ?flash_flood.risk_level,
        flood_risk = ?flood_risk.risk_level,
        score = flood_risk.risk_score,
        "assessment complete"
    );

    let report = Report { flash_flood, flood_risk };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
