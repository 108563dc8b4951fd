#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collision record and coordinate key types.
//!
//! These are the shapes the backend serves for individual collisions and
//! the `"(lat, lng)"` string keys it uses to index speed readings. The
//! coordinate key parser lives here so that every consumer rejects
//! malformed keys the same way instead of plotting `NaN` positions.

mod serde_helpers;

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Format the backend expects for the `datetime` query parameter.
pub const DATETIME_PARAM_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Format of the `start_datetime` / `end_datetime` search parameters.
///
/// The backend slices these strings by character offset (month abbreviation
/// at 4..7, day at 8..10, year at 11..15, `HH:MM` at 16..21), so the layout
/// must not change.
pub const SEARCH_DATETIME_FORMAT: &str = "%a %b %d %Y %H:%M:%S";

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Creates a new position.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// Errors produced while parsing a `"(lat, lng)"` coordinate key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinateKeyError {
    /// The key has no `,` between the two components.
    #[error("coordinate key '{key}' has no separator")]
    MissingSeparator {
        /// The offending key.
        key: String,
    },

    /// One of the components is not a number.
    #[error("coordinate key '{key}' has non-numeric {component}")]
    NotNumeric {
        /// The offending key.
        key: String,
        /// Which component failed (`"latitude"` or `"longitude"`).
        component: &'static str,
    },

    /// A component parsed but is `NaN`/infinite or outside WGS84 bounds.
    #[error("coordinate key '{key}' has out-of-range {component}")]
    OutOfRange {
        /// The offending key.
        key: String,
        /// Which component failed (`"latitude"` or `"longitude"`).
        component: &'static str,
    },
}

/// A sensor position parsed from its `"(lat, lng)"` string form.
///
/// Equality is exact floating-point equality on the parsed pair. Two keys
/// that differ only in formatting (`"(34.1, -118.2)"` vs
/// `"(34.10, -118.20)"`) compare equal; keys whose numbers differ in the
/// last digit do not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateKey {
    position: LatLng,
}

impl CoordinateKey {
    /// Creates a key from an already-validated position.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self {
            position: LatLng::new(lat, lng),
        }
    }

    /// Parses a key such as `"(34.0522, -118.2437)"`.
    ///
    /// Surrounding parentheses are optional.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateKeyError`] if the key has no separator, either
    /// component is not a number, or a component is non-finite or outside
    /// latitude/longitude bounds.
    pub fn parse(key: &str) -> Result<Self, CoordinateKeyError> {
        let trimmed = key.trim();
        let inner = trimmed.strip_prefix('(').unwrap_or(trimmed);
        let inner = inner.strip_suffix(')').unwrap_or(inner);

        let Some((lat_str, lng_str)) = inner.split_once(',') else {
            return Err(CoordinateKeyError::MissingSeparator {
                key: key.to_string(),
            });
        };

        let lat = parse_component(key, lat_str, "latitude", 90.0)?;
        let lng = parse_component(key, lng_str, "longitude", 180.0)?;

        Ok(Self::new(lat, lng))
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.position.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.position.lng
    }

    /// The key as a map position.
    #[must_use]
    pub const fn position(&self) -> LatLng {
        self.position
    }
}

fn parse_component(
    key: &str,
    raw: &str,
    component: &'static str,
    limit: f64,
) -> Result<f64, CoordinateKeyError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| CoordinateKeyError::NotNumeric {
            key: key.to_string(),
            component,
        })?;

    if !value.is_finite() || value.abs() > limit {
        return Err(CoordinateKeyError::OutOfRange {
            key: key.to_string(),
            component,
        });
    }

    Ok(value)
}

impl FromStr for CoordinateKey {
    type Err = CoordinateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.position.lat, self.position.lng)
    }
}

impl From<CoordinateKey> for LatLng {
    fn from(key: CoordinateKey) -> Self {
        key.position
    }
}

impl Serialize for CoordinateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CoordinateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A single observed collision as served by `GET /api/collisions`.
///
/// The natural key is the full `(date, time, latitude, longitude)` tuple;
/// the backend assigns no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionRecord {
    /// Latitude in degrees.
    #[serde(deserialize_with = "serde_helpers::flexible_f64")]
    pub latitude: f64,
    /// Longitude in degrees.
    #[serde(deserialize_with = "serde_helpers::flexible_f64")]
    pub longitude: f64,
    /// Calendar date the collision occurred.
    #[serde(rename = "Date Occurred", with = "serde_helpers::calendar_date")]
    pub date: NaiveDate,
    /// Local clock time the collision occurred.
    #[serde(rename = "Time Occurred", with = "serde_helpers::clock_time")]
    pub time: NaiveTime,
}

impl CollisionRecord {
    /// The collision position.
    #[must_use]
    pub const fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Date and time combined.
    #[must_use]
    pub const fn occurred_at(&self) -> NaiveDateTime {
        NaiveDateTime::new(self.date, self.time)
    }

    /// The `datetime` query value for the speed-trend endpoint.
    #[must_use]
    pub fn datetime_param(&self) -> String {
        self.occurred_at().format(DATETIME_PARAM_FORMAT).to_string()
    }

    /// Marker tooltip text.
    #[must_use]
    pub fn title(&self) -> String {
        format!(
            "Date: {}, Time: {}",
            self.date.format("%Y-%m-%d"),
            self.time.format("%H:%M")
        )
    }
}

/// Error returned when a search range ends before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("search range ends ({end}) before it starts ({start})")]
pub struct InvalidRangeError {
    /// Requested start.
    pub start: NaiveDateTime,
    /// Requested end.
    pub end: NaiveDateTime,
}

/// An inclusive date-time window for collision searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateTimeRange {
    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRangeError`] if `end` is before `start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, InvalidRangeError> {
        if end < start {
            return Err(InvalidRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whole-day range from the start of `from` to the end of `to`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRangeError`] if `to` is before `from`.
    pub fn days(from: NaiveDate, to: NaiveDate) -> Result<Self, InvalidRangeError> {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Self::new(from.and_time(NaiveTime::MIN), to.and_time(end_of_day))
    }

    /// Range start.
    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Range end.
    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Whether the collision falls inside the range (both ends inclusive).
    #[must_use]
    pub fn contains(&self, record: &CollisionRecord) -> bool {
        let at = record.occurred_at();
        self.start <= at && at <= self.end
    }

    /// Narrows the range to the given bounds. Returns `None` when the
    /// range lies completely outside them.
    #[must_use]
    pub fn clamp(&self, bounds: &Self) -> Option<Self> {
        let start = self.start.max(bounds.start);
        let end = self.end.min(bounds.end);
        Self::new(start, end).ok()
    }

    /// Query parameters for `GET /api/collisions`.
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            (
                "start_datetime",
                self.start.format(SEARCH_DATETIME_FORMAT).to_string(),
            ),
            (
                "end_datetime",
                self.end.format(SEARCH_DATETIME_FORMAT).to_string(),
            ),
        ]
    }
}
