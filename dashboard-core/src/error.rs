use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single upstream call (geocoding or forecast).
///
/// Callers in this crate never surface these to the end user: the resolver
/// turns them into an empty candidate list and the forecast view keeps its
/// previous bundle. They are logged and otherwise only visible through the
/// fallible `try_*` entry points.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body read failure.
    #[error("Request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-success status.
    #[error("{service} request failed with status {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    /// Body was not the JSON shape we expect.
    #[error("Failed to parse {service} JSON: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A value inside the displayed window was `null`.
    #[error("{service} response has no {field} value for hour {hour}")]
    MissingValue {
        service: &'static str,
        field: &'static str,
        hour: usize,
    },

    #[error(
        "Invalid coordinates ({latitude}, {longitude}): latitude must be -90 to 90, longitude must be -180 to 180"
    )]
    InvalidCoordinates {
        latitude: f64,
        longitude: f64,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Only transport failures, rate limiting and server errors qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            FetchError::Decode { .. }
            | FetchError::MissingValue { .. }
            | FetchError::InvalidCoordinates { .. }
            | FetchError::Client(_) => false,
        }
    }
}
