#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the collision speed dashboard backend.
//!
//! One method per endpoint. Every request is independent: no retries, no
//! backoff, and no timeout unless one is configured. Non-2xx responses are
//! turned into [`ClientError::Status`] carrying the backend's
//! `{"error": "..."}` message when it sends one.

use std::time::Duration;

use collision_speed_collision_models::{CollisionRecord, DateTimeRange};
use collision_speed_config::ApiConfig;
use collision_speed_speed_models::{HistogramData, ScatterData, SpeedTrends};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Errors that can occur while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with a non-2xx status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the raw body.
        message: String,
    },

    /// The configured base URL is unusable.
    #[error("invalid base URL: {message}")]
    InvalidUrl {
        /// Description of what went wrong.
        message: String,
    },
}

/// Response of `GET /api/google-maps-key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapsApiKey {
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

/// Which chart `GET /api/collisions/visualization` should serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum VisualizationType {
    Scatter,
    Histogram,
}

const MAPS_KEY_PATH: &str = "/api/google-maps-key";
const COLLISIONS_PATH: &str = "/api/collisions";
const VISUALIZATION_PATH: &str = "/api/collisions/visualization";
const ANALYZE_TRAFFIC_PATH: &str = "/api/analyze-traffic";

/// Typed client over a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    speed_trends_path: String,
}

impl ApiClient {
    /// Builds a client for the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the base URL is not an
    /// absolute `http`/`https` URL, or [`ClientError::Http`] if the
    /// underlying client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let url = reqwest::Url::parse(&config.base_url).map_err(|e| ClientError::InvalidUrl {
            message: format!("{}: {e}", config.base_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl {
                message: format!("{}: unsupported scheme '{}'", config.base_url, url.scheme()),
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            speed_trends_path: config.speed_trends_path.clone(),
        })
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Fetches the browser maps API key.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the body is malformed.
    pub async fn google_maps_key(&self) -> Result<MapsApiKey, ClientError> {
        self.get(MAPS_KEY_PATH, &[]).await
    }

    /// Lists collisions, optionally restricted to `range`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the body is malformed.
    pub async fn collisions(
        &self,
        range: Option<&DateTimeRange>,
    ) -> Result<Vec<CollisionRecord>, ClientError> {
        let query = range.map(DateTimeRange::query_pairs);
        let query = query.as_ref().map_or(&[][..], |pairs| &pairs[..]);
        let records: Vec<CollisionRecord> = self.get(COLLISIONS_PATH, query).await?;
        log::info!("Fetched {} collisions", records.len());
        Ok(records)
    }

    /// Fetches observed and predicted pre/post speed pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the body is malformed.
    pub async fn scatter(&self) -> Result<ScatterData, ClientError> {
        self.visualization(VisualizationType::Scatter).await
    }

    /// Fetches observed and predicted speed-change histograms.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the body is malformed.
    pub async fn histogram(&self) -> Result<HistogramData, ClientError> {
        self.visualization(VisualizationType::Histogram).await
    }

    /// Fetches the speed snapshots around one collision.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the body is malformed.
    pub async fn speed_trends(&self, record: &CollisionRecord) -> Result<SpeedTrends, ClientError> {
        let trends: SpeedTrends = self
            .get(&self.speed_trends_path, &speed_trends_query(record))
            .await?;
        log::info!(
            "Fetched speed trends for {}: {} observed, {} predicted snapshots",
            record.title(),
            trends.real_speed_trends.len(),
            trends.predicted_speed_trends.len()
        );
        Ok(trends)
    }

    /// Asks the backend to analyze traffic around `record`. The response is
    /// passed through untyped.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the body is not JSON.
    pub async fn analyze_traffic(
        &self,
        record: &CollisionRecord,
    ) -> Result<serde_json::Value, ClientError> {
        let url = self.endpoint(ANALYZE_TRAFFIC_PATH);
        log::debug!("POST {url}");
        let resp = self.http.post(&url).json(record).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        decode(status, &body)
    }

    async fn visualization<T: DeserializeOwned>(
        &self,
        kind: VisualizationType,
    ) -> Result<T, ClientError> {
        self.get(VISUALIZATION_PATH, &[("type", kind.as_ref().to_string())])
            .await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = self.endpoint(path);
        log::debug!("GET {url} {query:?}");
        let resp = self.http.get(&url).query(query).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        decode(status, &body)
    }
}

/// Query parameters for the speed-trend endpoint.
#[must_use]
pub fn speed_trends_query(record: &CollisionRecord) -> [(&'static str, String); 3] {
    [
        ("latitude", record.latitude.to_string()),
        ("longitude", record.longitude.to_string()),
        ("datetime", record.datetime_param()),
    ]
}

/// Decodes a response body, mapping non-2xx statuses to
/// [`ClientError::Status`].
///
/// # Errors
///
/// Returns [`ClientError::Status`] for non-2xx statuses and
/// [`ClientError::Json`] for bodies that do not decode into `T`.
pub fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::Status {
            status,
            message: error_message(body),
        });
    }
    Ok(serde_json::from_str(body)?)
}

/// Extracts the `error` field from a JSON error body, falling back to the
/// trimmed raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.to_string()
            }
        })
}
