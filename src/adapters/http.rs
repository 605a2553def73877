//! Shared HTTP plumbing for the REST adapters
//!
//! Maps transport errors, non-2xx statuses and bad JSON onto [`SourceError`]
//! so the executor can decide what to retry.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};

use crate::ports::SourceError;

/// Error bodies are cut to this many characters in logs and errors
const MAX_ERROR_BODY: usize = 200;

/// Thin JSON client with a fixed request timeout
#[derive(Debug, Clone)]
pub struct JsonClient {
    http: Client,
    timeout: Duration,
}

impl JsonClient {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("token-vetter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url)
    }

    /// Send a request and decode the JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SourceError> {
        let body = self.send(request).await?;
        parse_json(&body)
    }

    /// Send a request, returning the raw body of a 2xx response
    pub async fn send(&self, request: RequestBuilder) -> Result<String, SourceError> {
        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport(e))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(status_error(status, &body))
        }
    }

    fn map_transport(&self, error: reqwest::Error) -> SourceError {
        if error.is_timeout() {
            SourceError::Timeout(self.timeout.as_millis() as u64)
        } else {
            // URLs may carry credentials (Telegram bot token)
            SourceError::Transport(error.without_url().to_string())
        }
    }
}

/// Decode a JSON body; syntax errors are treated as transport-level
pub fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))
}

pub fn status_error(status: StatusCode, body: &str) -> SourceError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return SourceError::RateLimited;
    }
    SourceError::HttpStatus {
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY).collect(),
    }
}

/// Join a base URL and a path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl NumberOrText {
    fn into_f64(self) -> Option<f64> {
        let value = match self {
            NumberOrText::Number(n) => Some(n),
            NumberOrText::Text(s) => s.trim().parse::<f64>().ok(),
            NumberOrText::Other(_) => None,
        };
        value.filter(|n| n.is_finite())
    }
}

/// Accepts `1.5`, `"1.5"` or `null`; anything unparseable becomes 0
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_f64(deserializer)?.unwrap_or(0.0))
}

/// Like [`lenient_f64`] but keeps "absent" distinct from zero
pub fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(raw.and_then(NumberOrText::into_f64))
}

/// Non-negative count from a number, numeric string or `null`; fractions are truncated
pub fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_opt_f64(deserializer)?.unwrap_or(0.0);
    Ok(if value > 0.0 { value as u64 } else { 0 })
}

/// Numeric series; `null` is empty and unparseable samples are dropped
pub fn lenient_f64_seq<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<NumberOrText>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|sample| sample.and_then(NumberOrText::into_f64))
        .collect())
}
