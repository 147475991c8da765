use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::FetchError,
    model::{Coordinates, HourlyForecast, LocationCandidate},
};

pub mod open_meteo;

pub use open_meteo::{OpenMeteoForecast, OpenMeteoGeocoder};

/// Free-text place search.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Up to `count` matches in the service's relevance order.
    async fn geocode(&self, query: &str, count: usize)
    -> Result<Vec<LocationCandidate>, FetchError>;
}

/// Raw hourly forecast for a point.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn hourly(&self, coordinates: Coordinates) -> Result<HourlyForecast, FetchError>;
}
