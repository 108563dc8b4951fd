#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Speed snapshot, histogram and chart series types.
//!
//! The backend serializes each speed snapshot as a flat JSON object: one
//! timestamp field plus one `"(lat, lng)"` key per sensor. [`SpeedSnapshot`]
//! turns that sparse matrix row into an explicit ordered list of readings,
//! parsing every coordinate key at the boundary and dropping the ones that
//! do not parse.

mod band;
mod clock;
mod histogram;
mod series;

use collision_speed_collision_models::CoordinateKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use band::SpeedBand;
pub use clock::normalize_clock_label;
pub use histogram::{HistogramBin, HistogramBucket, HistogramData, ReconciledHistogramRow};
pub use series::{
    AverageSpeedPoint, LocationComparisonPoint, LocationSpeedPoint, ScatterData, ScatterPoint,
    SpeedComparisonPoint,
};

/// Key the backend uses for the snapshot timestamp.
pub const TIMESTAMP_KEY: &str = "Date Occurred";

/// Alternative timestamp keys accepted when decoding snapshots.
const TIMESTAMP_ALIASES: &[&str] = &[TIMESTAMP_KEY, "datetime", "time"];

/// One sensor reading inside a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedReading {
    /// Sensor position.
    pub coordinate: CoordinateKey,
    /// Speed in km/h.
    pub speed: f64,
}

/// All sensor readings reported at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct SpeedSnapshot {
    /// Timestamp label exactly as the backend sent it.
    pub timestamp: String,
    /// Readings in the order the backend listed them.
    pub readings: Vec<SpeedReading>,
}

impl SpeedSnapshot {
    /// Creates a snapshot from already-parsed readings.
    #[must_use]
    pub fn new(timestamp: impl Into<String>, readings: Vec<SpeedReading>) -> Self {
        Self {
            timestamp: timestamp.into(),
            readings,
        }
    }

    /// Convenience constructor used heavily in tests and fixtures.
    #[must_use]
    pub fn from_pairs(timestamp: impl Into<String>, pairs: &[((f64, f64), f64)]) -> Self {
        Self::new(
            timestamp,
            pairs
                .iter()
                .map(|&((lat, lng), speed)| SpeedReading {
                    coordinate: CoordinateKey::new(lat, lng),
                    speed,
                })
                .collect(),
        )
    }

    /// Clock time as 24-hour `HH:MM`, falling back to the trimmed raw
    /// label when the timestamp is in an unknown format.
    #[must_use]
    pub fn time_label(&self) -> String {
        normalize_clock_label(&self.timestamp).unwrap_or_else(|| self.timestamp.trim().to_string())
    }

    /// Arithmetic mean of every reading, or `None` for an empty snapshot.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_speed(&self) -> Option<f64> {
        if self.readings.is_empty() {
            return None;
        }
        let total: f64 = self.readings.iter().map(|r| r.speed).sum();
        Some(total / self.readings.len() as f64)
    }

    /// Speed at exactly this coordinate, if the snapshot has it.
    #[must_use]
    pub fn speed_at(&self, coordinate: &CoordinateKey) -> Option<f64> {
        self.readings
            .iter()
            .find(|r| r.coordinate == *coordinate)
            .map(|r| r.speed)
    }
}

impl TryFrom<Map<String, Value>> for SpeedSnapshot {
    type Error = String;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut timestamp = None;
        let mut readings = Vec::with_capacity(object.len().saturating_sub(1));

        for (key, value) in object {
            if timestamp.is_none() && TIMESTAMP_ALIASES.contains(&key.as_str()) {
                match value {
                    Value::String(s) => timestamp = Some(s),
                    other => timestamp = Some(other.to_string()),
                }
                continue;
            }

            let Some(speed) = value.as_f64().filter(|v| v.is_finite()) else {
                log::debug!("Skipping non-numeric speed field '{key}': {value}");
                continue;
            };

            match CoordinateKey::parse(&key) {
                Ok(coordinate) => readings.push(SpeedReading { coordinate, speed }),
                Err(e) => log::debug!("Skipping speed field: {e}"),
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| format!("speed snapshot has no '{TIMESTAMP_KEY}' field"))?;

        Ok(Self {
            timestamp,
            readings,
        })
    }
}

impl From<SpeedSnapshot> for Map<String, Value> {
    fn from(snapshot: SpeedSnapshot) -> Self {
        let mut object = Self::new();
        object.insert(TIMESTAMP_KEY.to_string(), Value::String(snapshot.timestamp));
        for reading in snapshot.readings {
            let value = serde_json::Number::from_f64(reading.speed).map_or(Value::Null, Value::Number);
            object.insert(reading.coordinate.to_string(), value);
        }
        object
    }
}

/// Observed and predicted snapshots paired by list position.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPair {
    /// Observed snapshot.
    pub real: SpeedSnapshot,
    /// Model-predicted snapshot at the same list position.
    pub predicted: SpeedSnapshot,
}

impl SnapshotPair {
    /// Label shown on the timestamp selector; taken from the observed side.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.real.timestamp
    }
}

/// Response of the per-collision speed-trend endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedTrends {
    /// Observed snapshots around the collision time.
    #[serde(default)]
    pub real_speed_trends: Vec<SpeedSnapshot>,
    /// Predicted snapshots around the collision time.
    #[serde(default)]
    pub predicted_speed_trends: Vec<SpeedSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_flat_snapshot_object() {
        let json = serde_json::json!({
            "Date Occurred": "2012-03-01 08:05",
            "(34.1, -118.2)": 55.5,
            "(34.2, -118.3)": 61
        });
        let snapshot: SpeedSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.timestamp, "2012-03-01 08:05");
        assert_eq!(snapshot.readings.len(), 2);
        assert_eq!(
            snapshot.speed_at(&CoordinateKey::new(34.2, -118.3)),
            Some(61.0)
        );
    }

    #[test]
    fn drops_malformed_keys_and_non_numeric_values() {
        let json = serde_json::json!({
            "Date Occurred": "2012-03-01 08:05",
            "(abc, -118.2)": 40.0,
            "(34.1, -118.2)": "fast",
            "(34.3, -118.4)": null,
            "(34.5, -118.5)": 30.0
        });
        let snapshot: SpeedSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.readings.len(), 1);
        assert!(snapshot.readings.iter().all(|r| r.speed.is_finite()));
    }

    #[test]
    fn rejects_snapshot_without_timestamp() {
        let json = serde_json::json!({ "(34.1, -118.2)": 55.0 });
        assert!(serde_json::from_value::<SpeedSnapshot>(json).is_err());
    }

    #[test]
    fn accepts_time_alias() {
        let json = serde_json::json!({ "time": "08:00", "(34.1, -118.2)": 10.0 });
        let snapshot: SpeedSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.time_label(), "08:00");
    }

    #[test]
    fn serializes_back_to_flat_object() {
        let snapshot = SpeedSnapshot::from_pairs("2012-03-01 08:05", &[((34.1, -118.2), 55.5)]);
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["Date Occurred"], "2012-03-01 08:05");
        assert_eq!(value["(34.1, -118.2)"], 55.5);
    }

    #[test]
    fn mean_speed_of_empty_snapshot_is_none() {
        let snapshot = SpeedSnapshot::new("08:00", Vec::new());
        assert!(snapshot.mean_speed().is_none());
    }

    #[test]
    fn mean_speed_averages_readings() {
        let snapshot =
            SpeedSnapshot::from_pairs("08:00", &[((34.0, -118.0), 10.0), ((34.1, -118.1), 20.0)]);
        let mean = snapshot.mean_speed().unwrap();
        assert!((mean - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_trend_arrays_default_to_empty() {
        let trends: SpeedTrends = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(trends.real_speed_trends.is_empty());
        assert!(trends.predicted_speed_trends.is_empty());
    }
}
