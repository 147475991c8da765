//! Open-Meteo geocoding and forecast endpoints (<https://open-meteo.com>).
//!
//! Neither endpoint needs an API key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    config::{Config, RetryConfig},
    error::FetchError,
    forecast::HOURS,
    http::{client_from_config, get_json},
    model::{Coordinates, HourlyForecast, LocationCandidate},
};

use super::{ForecastSource, Geocoder};

/// Hourly fields requested from the forecast endpoint.
pub const HOURLY_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,precipitation_probability,visibility";

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    base_url: String,
    language: String,
    retry: RetryConfig,
    http: Client,
}

impl OpenMeteoGeocoder {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            base_url: config.geocoding_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            retry: config.retry.clone(),
            http,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Ok(Self::new(client_from_config(config)?, config))
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    // Absent when nothing matched.
    #[serde(default)]
    results: Vec<GeoResult>,
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    name: String,
    // Some features (seas, disputed areas) come without a country.
    #[serde(default)]
    country: String,
    admin1: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl From<GeoResult> for LocationCandidate {
    fn from(r: GeoResult) -> Self {
        LocationCandidate {
            name: r.name,
            country: r.country,
            admin1: r.admin1,
            latitude: r.latitude,
            longitude: r.longitude,
        }
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    #[instrument(skip(self))]
    async fn geocode(
        &self,
        query: &str,
        count: usize,
    ) -> Result<Vec<LocationCandidate>, FetchError> {
        let url = format!("{}/search", self.base_url);
        let params = [
            ("name", query.to_string()),
            ("count", count.to_string()),
            ("language", self.language.clone()),
            ("format", "json".to_string()),
        ];

        let parsed: GeoResponse =
            get_json(&self.http, "geocoding", &url, &params, &self.retry).await?;

        Ok(parsed.results.into_iter().map(LocationCandidate::from).collect())
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoForecast {
    base_url: String,
    retry: RetryConfig,
    http: Client,
}

impl OpenMeteoForecast {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            base_url: config.forecast_url.trim_end_matches('/').to_string(),
            retry: config.retry.clone(),
            http,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Ok(Self::new(client_from_config(config)?, config))
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlyBlock,
}

// Upstream pads the horizon with `null` where a model has no value.
#[derive(Debug, Deserialize)]
struct HourlyBlock {
    #[serde(default)]
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    visibility: Vec<Option<f64>>,
}

/// First [`HOURS`] entries of one field. Nulls past the window are ignored.
fn window(field: &'static str, values: Vec<Option<f64>>) -> Result<Vec<f64>, FetchError> {
    values
        .into_iter()
        .take(HOURS)
        .enumerate()
        .map(|(hour, value)| {
            value.ok_or(FetchError::MissingValue {
                service: "forecast",
                field,
                hour,
            })
        })
        .collect()
}

impl TryFrom<HourlyBlock> for HourlyForecast {
    type Error = FetchError;

    fn try_from(h: HourlyBlock) -> Result<Self, Self::Error> {
        Ok(HourlyForecast {
            time: h.time.into_iter().take(HOURS).collect(),
            temperature: window("temperature_2m", h.temperature_2m)?,
            wind_speed: window("wind_speed_10m", h.wind_speed_10m)?,
            precipitation_probability: window(
                "precipitation_probability",
                h.precipitation_probability,
            )?,
            visibility: window("visibility", h.visibility)?,
        })
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoForecast {
    #[instrument(skip(self), fields(lat = %coordinates.latitude, lon = %coordinates.longitude))]
    async fn hourly(&self, coordinates: Coordinates) -> Result<HourlyForecast, FetchError> {
        let url = format!("{}/forecast", self.base_url);
        let params = [
            ("latitude", coordinates.latitude.to_string()),
            ("longitude", coordinates.longitude.to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
        ];

        let parsed: ForecastResponse =
            get_json(&self.http, "forecast", &url, &params, &self.retry).await?;

        HourlyForecast::try_from(parsed.hourly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geocoding_response_without_results_is_empty() {
        let parsed: GeoResponse = serde_json::from_str(r#"{"generationtime_ms": 0.5}"#).unwrap();
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn geocoding_result_maps_to_candidate() {
        let parsed: GeoResponse = serde_json::from_str(
            r#"{"results":[{"id":2988507,"name":"Paris","latitude":48.85341,"longitude":2.3488,
                "country":"France","admin1":"Île-de-France","timezone":"Europe/Paris"}]}"#,
        )
        .unwrap();

        let candidates: Vec<LocationCandidate> =
            parsed.results.into_iter().map(LocationCandidate::from).collect();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Paris");
        assert_eq!(candidates[0].admin1.as_deref(), Some("Île-de-France"));
    }

    #[test]
    fn geocoding_result_without_country_defaults_to_empty() {
        let parsed: GeoResponse = serde_json::from_str(
            r#"{"results":[{"name":"North Sea","latitude":56.0,"longitude":3.0}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.results[0].country, "");
        assert!(parsed.results[0].admin1.is_none());
    }

    #[test]
    fn forecast_response_requires_all_four_fields() {
        let missing_visibility = r#"{"hourly":{"temperature_2m":[1.0],"wind_speed_10m":[2.0],
            "precipitation_probability":[3]}}"#;
        assert!(serde_json::from_str::<ForecastResponse>(missing_visibility).is_err());
    }

    #[test]
    fn forecast_response_accepts_integer_values() {
        let body = r#"{"hourly":{"time":["2024-01-15T00:00"],"temperature_2m":[1.5],
            "relative_humidity_2m":[80],"wind_speed_10m":[2],"precipitation_probability":[30],
            "visibility":[24140]}}"#;
        let parsed: ForecastResponse = serde_json::from_str(body).unwrap();
        let hourly = HourlyForecast::try_from(parsed.hourly).unwrap();

        assert_eq!(hourly.precipitation_probability, vec![30.0]);
        assert_eq!(hourly.visibility, vec![24140.0]);
        assert_eq!(hourly.time, vec!["2024-01-15T00:00".to_string()]);
    }

    fn block_with(hours: usize, nulls: &[(&str, usize)]) -> HourlyBlock {
        let mut hourly = serde_json::json!({
            "temperature_2m": vec![12.5; hours],
            "wind_speed_10m": vec![8.0; hours],
            "precipitation_probability": vec![20; hours],
            "visibility": vec![24140; hours],
        });
        for (field, hour) in nulls {
            hourly[*field][*hour] = serde_json::Value::Null;
        }
        serde_json::from_value(hourly).unwrap()
    }

    #[test]
    fn nulls_beyond_the_window_are_ignored() {
        let block = block_with(48, &[("temperature_2m", 47), ("precipitation_probability", 40)]);
        let hourly = HourlyForecast::try_from(block).unwrap();

        assert_eq!(hourly.temperature.len(), HOURS);
        assert_eq!(hourly.precipitation_probability.len(), HOURS);
        assert_eq!(hourly.visibility[23], 24140.0);
    }

    #[test]
    fn null_inside_the_window_is_rejected() {
        let block = block_with(48, &[("visibility", 5)]);
        let err = HourlyForecast::try_from(block).unwrap_err();

        assert!(matches!(
            err,
            FetchError::MissingValue {
                field: "visibility",
                hour: 5,
                ..
            }
        ));
    }

    #[test]
    fn trailing_slash_in_base_url_is_ignored() {
        let mut cfg = Config::default();
        cfg.forecast_url = "http://localhost:1234/v1/".into();
        let source = OpenMeteoForecast::from_config(&cfg).unwrap();
        assert_eq!(source.base_url, "http://localhost:1234/v1");
    }
}
