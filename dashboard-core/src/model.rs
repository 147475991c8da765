use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{error::FetchError, theme::Theme};

/// A geocoded place offered by location search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub name: String,
    pub country: String,
    pub admin1: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationCandidate {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Stable key for list rendering; two candidates at the same spot are the same place.
    pub fn key(&self) -> String {
        format!("{}-{}", self.latitude, self.longitude)
    }

    /// "Paris, France" without the region qualifier.
    pub fn short_name(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

impl fmt::Display for LocationCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.name, self.country)?;
        if let Some(admin1) = &self.admin1 {
            write!(f, " ({admin1})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Range check only; anything finite inside the globe is accepted.
    pub fn validate(&self) -> Result<(), FetchError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);

        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(FetchError::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// One `(hour label, value)` point of a metric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    pub label: String,
    pub value: f64,
}

impl HourlySample {
    pub fn at_hour(hour: usize, value: f64) -> Self {
        Self {
            label: format!("{hour}:00"),
            value,
        }
    }
}

/// The four series a forecast bundle always carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Temperature,
    WindSpeed,
    Precipitation,
    Visibility,
}

impl Metric {
    pub const fn all() -> &'static [Metric] {
        &[Metric::Temperature, Metric::WindSpeed, Metric::Precipitation, Metric::Visibility]
    }

    /// Key used in serialized bundles and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::WindSpeed => "windSpeed",
            Metric::Precipitation => "precipitation",
            Metric::Visibility => "visibility",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::WindSpeed => "Wind Speed",
            Metric::Precipitation => "Precipitation",
            Metric::Visibility => "Visibility",
        }
    }

    /// Suffix appended to a formatted value, leading space included where wanted.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::WindSpeed => " km/h",
            Metric::Precipitation => "%",
            Metric::Visibility => " km",
        }
    }

    /// Chart colour as a `#rrggbb` hex string.
    pub fn color(&self, theme: Theme) -> &'static str {
        match (self, theme) {
            (Metric::Temperature, Theme::Light) => "#ff7e67",
            (Metric::Temperature, Theme::Dark) => "#f87171",
            (Metric::WindSpeed, Theme::Light) => "#4299e1",
            (Metric::WindSpeed, Theme::Dark) => "#60a5fa",
            (Metric::Precipitation, Theme::Light) => "#68d391",
            (Metric::Precipitation, Theme::Dark) => "#4ade80",
            (Metric::Visibility, Theme::Light) => "#805ad5",
            (Metric::Visibility, Theme::Dark) => "#a78bfa",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Metric {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "temperature" | "temp" => Ok(Metric::Temperature),
            "windspeed" | "wind_speed" | "wind" => Ok(Metric::WindSpeed),
            "precipitation" | "precip" | "rain" => Ok(Metric::Precipitation),
            "visibility" | "vis" => Ok(Metric::Visibility),
            _ => Err(anyhow::anyhow!(
                "Unknown metric '{value}'. Supported metrics: temperature, windSpeed, precipitation, visibility."
            )),
        }
    }
}

/// Hourly fields as delivered by a forecast source, before reshaping.
///
/// Sources may send the whole horizon or only the part the dashboard shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlyForecast {
    /// Local timestamps of the forecast horizon, if the source provides them.
    pub time: Vec<String>,
    pub temperature: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub precipitation_probability: Vec<f64>,
    /// Meters.
    pub visibility: Vec<f64>,
}

/// Chart-ready series for one location, one per [`Metric`].
///
/// Built only by [`ForecastBundle::from_hourly`]; a new bundle always replaces
/// the previous one as a whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastBundle {
    pub(crate) starts_at: Option<NaiveDateTime>,
    pub(crate) temperature: Vec<HourlySample>,
    pub(crate) wind_speed: Vec<HourlySample>,
    pub(crate) precipitation: Vec<HourlySample>,
    pub(crate) visibility: Vec<HourlySample>,
}

impl ForecastBundle {
    pub fn series(&self, metric: Metric) -> &[HourlySample] {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::WindSpeed => &self.wind_speed,
            Metric::Precipitation => &self.precipitation,
            Metric::Visibility => &self.visibility,
        }
    }

    /// Value at hour 0, i.e. "now".
    pub fn current(&self, metric: Metric) -> Option<f64> {
        self.series(metric).first().map(|s| s.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, &[HourlySample])> {
        Metric::all().iter().map(move |m| (*m, self.series(*m)))
    }

    /// First timestamp of the upstream horizon, when it could be parsed.
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        self.starts_at
    }
}
