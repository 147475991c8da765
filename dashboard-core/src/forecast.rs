use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::{
    config::Config,
    error::FetchError,
    model::{Coordinates, ForecastBundle, HourlyForecast, HourlySample, Metric},
    provider::{ForecastSource, OpenMeteoForecast},
};

/// Samples kept per metric: hours 0 through 23 of the horizon.
pub const HOURS: usize = 24;

fn series(values: &[f64], scale: impl Fn(f64) -> f64) -> Vec<HourlySample> {
    values
        .iter()
        .take(HOURS)
        .enumerate()
        .map(|(hour, v)| HourlySample::at_hour(hour, scale(*v)))
        .collect()
}

fn meters_to_km(meters: f64) -> f64 {
    meters / 1000.0
}

impl ForecastBundle {
    /// Reshape raw hourly fields into chart series.
    ///
    /// Each series holds the first 24 upstream entries (fewer if upstream
    /// sent fewer, never padded). Visibility is converted to kilometres;
    /// the other metrics keep the upstream units.
    pub fn from_hourly(raw: &HourlyForecast) -> Self {
        let starts_at = raw
            .time
            .first()
            .and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M").ok());

        Self {
            starts_at,
            temperature: series(&raw.temperature, |v| v),
            wind_speed: series(&raw.wind_speed, |v| v),
            precipitation: series(&raw.precipitation_probability, |v| v),
            visibility: series(&raw.visibility, meters_to_km),
        }
    }
}

/// Fetches a forecast for a location and hands back a complete bundle.
#[derive(Debug, Clone)]
pub struct ForecastAdapter {
    source: Arc<dyn ForecastSource>,
}

impl ForecastAdapter {
    pub fn new(source: Arc<dyn ForecastSource>) -> Self {
        Self { source }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Ok(Self::new(Arc::new(OpenMeteoForecast::from_config(config)?)))
    }

    /// Either a whole bundle or an error; there is no partial result.
    pub async fn fetch_forecast(
        &self,
        coordinates: Coordinates,
    ) -> Result<ForecastBundle, FetchError> {
        coordinates.validate()?;

        let raw = self.source.hourly(coordinates).await?;
        let bundle = ForecastBundle::from_hourly(&raw);

        debug!(
            lat = coordinates.latitude,
            lon = coordinates.longitude,
            hours = bundle.series(Metric::Temperature).len(),
            "Forecast ready"
        );
        Ok(bundle)
    }
}
