//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Location search (`LocationResolver`) over a geocoding service
//! - Hourly forecast retrieval and reshaping (`ForecastAdapter`)
//! - Consumer-side state that only applies the latest request's result
//! - Configuration, theme and HTTP plumbing (timeout, retry with backoff)
//!
//! It is used by `dashboard-cli`, but holds no terminal code of its own.

pub mod config;
pub mod error;
pub mod forecast;
mod http;
pub mod model;
pub mod provider;
pub mod resolver;
pub mod session;
pub mod theme;

pub use config::{Config, RetryConfig};
pub use error::FetchError;
pub use forecast::ForecastAdapter;
pub use http::client_from_config;
pub use model::{
    Coordinates, ForecastBundle, HourlyForecast, HourlySample, LocationCandidate, Metric,
};
pub use provider::{ForecastSource, Geocoder};
pub use resolver::LocationResolver;
pub use session::{ForecastOutcome, ForecastView, SearchOutcome, SearchSession, SearchTicket};
pub use theme::{SharedTheme, Theme};
