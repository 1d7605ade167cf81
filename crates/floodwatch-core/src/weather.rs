//! Weather-series input and the rainfall summary derived from it.
use serde::{Deserialize, Serialize};

use crate::coords::Location;
use crate::error::FloodError;

/// Number of leading forecast steps summarised for the flash-flood pipeline.
pub const RECENT_WINDOW: usize = 6;

/// A forecast series as delivered by the weather collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSeries {
    pub location: Location,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub chart_type: String,
    /// Forecast horizon in hours.
    pub forecast_step: u32,
    #[serde(default)]
    pub time_points: Vec<String>,
    /// Primary series (precipitation, mm per step).
    pub values: Vec<f64>,
    /// Air temperature in °C per step, when the collaborator provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperatures: Option<Vec<f64>>,
}

impl WeatherSeries {
    pub fn new(location: Location, forecast_step: u32, values: Vec<f64>) -> Self {
        Self {
            location,
            model: String::new(),
            chart_type: String::new(),
            forecast_step,
            time_points: Vec::new(),
            values,
            temperatures: None,
        }
    }

    /// Reject series the scorers cannot interpret.
    pub fn validate(&self) -> Result<(), FloodError> {
        if let Some(i) = self.values.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(FloodError::InvalidWeather(format!(
                "value #{i} is {} (expected finite and ≥ 0)",
                self.values[i]
            )));
        }
        if let Some(t) = &self.temperatures {
            if t.iter().any(|v| !v.is_finite()) {
                return Err(FloodError::InvalidWeather("non-finite temperature".into()));
            }
        }
        Ok(())
    }

    /// Total of the primary series over the forecast window, mm.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Series read by the snow-melt check. Falls back to the primary series
    /// when no temperatures were delivered.
    pub fn temperature_series(&self) -> &[f64] {
        self.temperatures.as_deref().unwrap_or(self.values.as_slice())
    }
}

/// Rainfall characteristics fed to the runoff and routing steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RainfallSummary {
    pub intensity_mm_hr: f64,
    pub duration_hours: f64,
    pub antecedent_mm: f64,
    pub initial_flow_m3s: f64,
}

impl Default for RainfallSummary {
    /// Used when no series is available at all.
    fn default() -> Self {
        Self {
            intensity_mm_hr: 10.0,
            duration_hours: 2.0,
            antecedent_mm: 20.0,
            initial_flow_m3s: 2.0,
        }
    }
}

/// Summarise the leading [`RECENT_WINDOW`] steps of `series`.
///
/// Intensity always divides by the full window length, even when the series
/// is shorter; duration counts the wet steps, minimum one.
pub fn summarize_rainfall(series: &WeatherSeries) -> Result<RainfallSummary, FloodError> {
    series.validate()?;

    let recent = &series.values[..series.values.len().min(RECENT_WINDOW)];
    let total: f64 = recent.iter().sum();
    let wet_steps = recent.iter().filter(|&&v| v > 0.0).count();

    Ok(RainfallSummary {
        intensity_mm_hr: total / RECENT_WINDOW as f64,
        duration_hours: wet_steps.max(1) as f64,
        antecedent_mm: total * 2.0,
        initial_flow_m3s: total * 0.1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(values: Vec<f64>) -> WeatherSeries {
        WeatherSeries::new(Location::new("Test", 41.0, 29.0), values.len() as u32, values)
    }

    #[test]
    fn summary_uses_first_six_steps() {
        let s = series(vec![6.0, 0.0, 6.0, 6.0, 0.0, 6.0, 100.0, 100.0]);
        let r = summarize_rainfall(&s).unwrap();
        assert_relative_eq!(r.intensity_mm_hr, 4.0);
        assert_relative_eq!(r.duration_hours, 4.0);
        assert_relative_eq!(r.antecedent_mm, 48.0);
        assert_relative_eq!(r.initial_flow_m3s, 2.4, epsilon = 1e-12);
    }

    #[test]
    fn dry_or_empty_series_has_one_hour_duration() {
        for values in [vec![], vec![0.0; 12]] {
            let r = summarize_rainfall(&series(values)).unwrap();
            assert_eq!(r.intensity_mm_hr, 0.0);
            assert_eq!(r.duration_hours, 1.0);
        }
    }

    #[test]
    fn short_series_still_divides_by_window() {
        let r = summarize_rainfall(&series(vec![3.0, 3.0])).unwrap();
        assert_relative_eq!(r.intensity_mm_hr, 1.0);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(summarize_rainfall(&series(vec![1.0, f64::NAN])).is_err());
        assert!(summarize_rainfall(&series(vec![-2.0])).is_err());
    }

    #[test]
    fn temperature_series_falls_back_to_values() {
        let mut s = series(vec![1.0, 2.0]);
        assert_eq!(s.temperature_series(), &[1.0, 2.0]);
        s.temperatures = Some(vec![7.5]);
        assert_eq!(s.temperature_series(), &[7.5]);
    }

    #[test]
    fn deserializes_front_end_shape() {
        let json = r#"{
            "location": {"name": "Rize", "lat": 41.02, "lon": 40.52},
            "model": "openweathermap",
            "chartType": "accprecip",
            "forecastStep": 48,
            "timePoints": ["2024-01-01T00:00:00Z"],
            "values": [1.5]
        }"#;
        let s: WeatherSeries = serde_json::from_str(json).unwrap();
        assert_eq!(s.forecast_step, 48);
        assert_eq!(s.location.name, "Rize");
        assert!(s.temperatures.is_none());
    }
}
