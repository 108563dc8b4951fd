#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration for the collision speed dashboard.
//!
//! Defaults are baked into the binary from `config/default.toml` at compile
//! time. A user-supplied TOML file only needs the keys it changes; it is
//! merged over the defaults table before deserialization. Environment
//! variables are applied last.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use collision_speed_collision_models::{DateTimeRange, LatLng};
use serde::Deserialize;
use toml::Table;

/// Default configuration embedded at compile time.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Env var overriding [`ApiConfig::base_url`].
pub const API_URL_ENV: &str = "COLLISION_SPEED_API_URL";

/// Env var overriding [`ApiConfig::speed_trends_path`].
pub const TRENDS_PATH_ENV: &str = "COLLISION_SPEED_TRENDS_PATH";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The override file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Values parsed but are inconsistent.
    #[error("invalid configuration: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Backend API location.
    pub api: ApiConfig,
    /// Collision search bounds.
    pub search: SearchConfig,
    /// Map defaults.
    pub map: MapConfig,
}

/// Backend API location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `"http://localhost:5000"`.
    pub base_url: String,
    /// Path of the per-collision speed-trend endpoint.
    pub speed_trends_path: String,
    /// Per-request timeout. `None` means requests may wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Dates the collision dataset covers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchConfig {
    /// First searchable day.
    pub min_date: NaiveDate,
    /// Last searchable day.
    pub max_date: NaiveDate,
}

impl SearchConfig {
    /// The full searchable window, midnight of `min_date` to the last
    /// second of `max_date`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `max_date` precedes `min_date`.
    pub fn bounds(&self) -> Result<DateTimeRange, ConfigError> {
        DateTimeRange::days(self.min_date, self.max_date).map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })
    }
}

/// Map defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapConfig {
    /// Where the collision overview map starts.
    pub default_center: LatLng,
    /// Zoom of the collision overview map.
    pub overview_zoom: f64,
    /// Zoom both detail maps open at.
    pub detail_zoom: f64,
    /// Radius of each sensor circle in metres.
    pub marker_radius_m: f64,
    /// Initial radius filter around the collision in kilometres.
    pub nearby_radius_km: f64,
}

impl AppConfig {
    /// The embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded file is malformed.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str("")
    }

    /// Merges `overrides` over the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either document is malformed or the
    /// merged values fail validation.
    pub fn from_toml_str(overrides: &str) -> Result<Self, ConfigError> {
        let mut table: Table = toml::from_str(DEFAULT_CONFIG)?;
        let overlay: Table = toml::from_str(overrides)?;
        merge_tables(&mut table, overlay);

        let config: Self = toml::Value::Table(table).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration: embedded defaults, then the optional file at
    /// `path`, then environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or the
    /// final values fail validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let overrides = match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => String::new(),
        };

        let mut config = Self::from_toml_str(&overrides)?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies env-style overrides looked up through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            log::debug!("{API_URL_ENV} overrides api.base_url");
            self.api.base_url = url;
        }
        if let Some(path) = lookup(TRENDS_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            log::debug!("{TRENDS_PATH_ENV} overrides api.speed_trends_path");
            self.api.speed_trends_path = path;
        }
    }

    /// Checks cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(invalid("api.base_url is empty"));
        }
        if !self.api.speed_trends_path.starts_with('/') {
            return Err(invalid("api.speed_trends_path must start with '/'"));
        }
        self.search.bounds()?;
        if self.map.marker_radius_m <= 0.0 || self.map.marker_radius_m.is_nan() {
            return Err(invalid("map.marker_radius_m must be positive"));
        }
        if self.map.nearby_radius_km <= 0.0 || self.map.nearby_radius_km.is_nan() {
            return Err(invalid("map.nearby_radius_km must be positive"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid {
        message: message.to_string(),
    }
}

/// Recursively overlays `overlay` onto `base`; nested tables merge,
/// everything else replaces.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        let incoming = match value {
            toml::Value::Table(incoming) => incoming,
            other => {
                base.insert(key, other);
                continue;
            }
        };
        if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
            merge_tables(existing, incoming);
            continue;
        }
        base.insert(key, toml::Value::Table(incoming));
    }
}
