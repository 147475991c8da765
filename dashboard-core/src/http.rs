//! Shared GET-and-decode plumbing for the upstream APIs.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{config::{Config, RetryConfig}, error::FetchError};

const USER_AGENT: &str = concat!("weather-dashboard/", env!("CARGO_PKG_VERSION"));

/// HTTP client with the configured per-request timeout.
pub fn client_from_config(config: &Config) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(config.timeout())
        .user_agent(USER_AGENT)
        .build()
        .map_err(FetchError::Client)
}

/// GET `url` with `query` and decode the JSON body, retrying transient failures.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    service: &'static str,
    url: &str,
    query: &[(&str, String)],
    retry: &RetryConfig,
) -> Result<T, FetchError> {
    let mut attempt = 0;

    loop {
        match get_json_once(http, service, url, query).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < retry.max_retries => {
                attempt += 1;
                let delay = retry.backoff(attempt);
                warn!(service, attempt, ?delay, error = %err, "Retrying request");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn get_json_once<T: DeserializeOwned>(
    http: &Client,
    service: &'static str,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, FetchError> {
    debug!(service, url, ?query, "Sending request");

    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| FetchError::Transport { service, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| FetchError::Transport { service, source })?;

    if !status.is_success() {
        return Err(FetchError::Status {
            service,
            status,
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|source| FetchError::Decode { service, source })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
