//! Scatter plot and histogram overview.

use collision_speed_analytics::reconcile_histogram;
use collision_speed_client::{ApiClient, ClientError, MapsApiKey};
use collision_speed_speed_models::{HistogramData, ReconciledHistogramRow, ScatterData};
use serde::Serialize;

/// The landing view: before/after scatter plot and speed-change histogram.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewState {
    scatter: ScatterData,
    histogram: Vec<ReconciledHistogramRow>,
    #[serde(skip)]
    maps_key: Option<String>,
}

impl OverviewState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn scatter(&self) -> &ScatterData {
        &self.scatter
    }

    #[must_use]
    pub fn histogram(&self) -> &[ReconciledHistogramRow] {
        &self.histogram
    }

    #[must_use]
    pub fn maps_key(&self) -> Option<&str> {
        self.maps_key.as_deref()
    }

    /// Replaces the scatter series. A failed fetch is logged and the
    /// previous series kept. Returns whether the state changed.
    pub fn apply_scatter(&mut self, result: Result<ScatterData, ClientError>) -> bool {
        match result {
            Ok(scatter) => {
                log::debug!(
                    "Scatter: {} observed, {} predicted points",
                    scatter.scatter_real_data.len(),
                    scatter.scatter_predicted_data.len()
                );
                self.scatter = scatter;
                true
            }
            Err(e) => {
                log::error!("Error fetching scatter data: {e}");
                false
            }
        }
    }

    /// Reconciles and replaces the histogram. A failed fetch is logged and
    /// the previous rows kept.
    pub fn apply_histogram(&mut self, result: Result<HistogramData, ClientError>) -> bool {
        match result {
            Ok(data) => {
                self.histogram = reconcile_histogram(&data);
                log::debug!("Histogram: {} aligned buckets", self.histogram.len());
                true
            }
            Err(e) => {
                log::error!("Error fetching histogram data: {e}");
                false
            }
        }
    }

    /// Stores the maps API key. A failed fetch is logged and the previous
    /// key kept.
    pub fn apply_maps_key(&mut self, result: Result<MapsApiKey, ClientError>) -> bool {
        match result {
            Ok(key) => {
                self.maps_key = Some(key.api_key);
                true
            }
            Err(e) => {
                log::error!("Error fetching Google Maps API key: {e}");
                false
            }
        }
    }

    /// Fetches scatter and histogram concurrently; each result updates only
    /// its own chart.
    pub async fn refresh(&mut self, client: &ApiClient) {
        let (scatter, histogram) = futures::future::join(client.scatter(), client.histogram()).await;
        self.apply_scatter(scatter);
        self.apply_histogram(histogram);
    }
}

#[cfg(test)]
mod tests {
    use collision_speed_speed_models::{HistogramBin, ScatterPoint};

    use super::*;

    fn failure() -> ClientError {
        ClientError::Status {
            status: 500,
            message: "boom".to_string(),
        }
    }

    fn scatter() -> ScatterData {
        ScatterData {
            scatter_real_data: vec![ScatterPoint {
                pre_speed: 60.0,
                post_speed: 35.0,
                source: None,
            }],
            scatter_predicted_data: Vec::new(),
        }
    }

    #[test]
    fn applies_histogram_as_reconciled_rows() {
        let mut state = OverviewState::new();
        let data = HistogramData {
            histogram_real_data: vec![HistogramBin {
                range: 10.0,
                count: 2,
            }],
            histogram_predicted_data: vec![HistogramBin {
                range: -10.0,
                count: 3,
            }],
        };

        assert!(state.apply_histogram(Ok(data)));

        let ranges: Vec<&str> = state.histogram().iter().map(|r| r.range.as_str()).collect();
        assert_eq!(ranges, vec!["-10 to 0", "10 to 20"]);
    }

    #[test]
    fn failed_fetch_keeps_previous_values() {
        let mut state = OverviewState::new();
        state.apply_scatter(Ok(scatter()));
        state.apply_maps_key(Ok(MapsApiKey {
            api_key: "key".to_string(),
        }));

        assert!(!state.apply_scatter(Err(failure())));
        assert!(!state.apply_histogram(Err(failure())));
        assert!(!state.apply_maps_key(Err(failure())));

        assert_eq!(state.scatter(), &scatter());
        assert!(state.histogram().is_empty());
        assert_eq!(state.maps_key(), Some("key"));
    }

    #[test]
    fn serializes_chart_data_without_key() {
        let mut state = OverviewState::new();
        state.apply_scatter(Ok(scatter()));
        state.apply_maps_key(Ok(MapsApiKey {
            api_key: "secret".to_string(),
        }));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["scatter"]["scatter_real_data"][0]["preSpeed"], 60.0);
        assert!(json.get("mapsKey").is_none());
    }
}
