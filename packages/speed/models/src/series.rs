//! Chart-ready series rows. Field names serialize in `camelCase` to match
//! the data keys the chart layer binds to.

use serde::{Deserialize, Serialize};

/// One point of the before/after speed scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    /// Mean speed before the collision (km/h).
    pub pre_speed: f64,
    /// Mean speed after the collision (km/h).
    pub post_speed: f64,
    /// Dataset label attached by the backend, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Response of `GET /api/collisions/visualization?type=scatter`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScatterData {
    /// Observed before/after pairs.
    #[serde(default)]
    pub scatter_real_data: Vec<ScatterPoint>,
    /// Predicted before/after pairs.
    #[serde(default)]
    pub scatter_predicted_data: Vec<ScatterPoint>,
}

/// Average speed across all sensors at one clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageSpeedPoint {
    /// `HH:MM` label.
    pub time: String,
    /// Mean speed in km/h.
    pub avg_speed: f64,
}

/// Speed at one sensor at one clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSpeedPoint {
    /// `HH:MM` label.
    pub time: String,
    /// Speed in km/h.
    pub speed: f64,
}

/// Observed vs. predicted average speed at one clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedComparisonPoint {
    /// `HH:MM` label, taken from the observed series.
    pub time: String,
    /// Observed average speed.
    pub real_average_speed: f64,
    /// Predicted average speed.
    pub predicted_average_speed: f64,
}

/// Observed vs. predicted speed at the selected sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationComparisonPoint {
    /// `HH:MM` label.
    pub time: String,
    /// Observed speed, if the sensor reported in the observed snapshot.
    pub real_speed: Option<f64>,
    /// Predicted speed, if the sensor is present in the predicted snapshot.
    pub predicted_speed: Option<f64>,
}
