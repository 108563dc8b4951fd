//! Speed-change histogram buckets, wire and labelled.

use serde::{Deserialize, Serialize};

/// Bucket width in km/h used by the backend's speed-change histogram.
pub const BUCKET_WIDTH: f64 = 10.0;

/// A histogram bucket as served by the backend: numeric lower bound plus
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Lower bound of the `[range, range + 10)` km/h interval.
    pub range: f64,
    /// Number of collisions whose speed change fell into the bucket.
    pub count: u64,
}

impl HistogramBin {
    /// Converts the numeric bucket into its `"<start> to <end>"` label form.
    #[must_use]
    pub fn labeled(&self) -> HistogramBucket {
        // `-0` would otherwise render as "-0 to 10".
        let start = if self.range == 0.0 { 0.0 } else { self.range };
        let end = start + BUCKET_WIDTH;
        let end = if end == 0.0 { 0.0 } else { end };
        HistogramBucket {
            range: format!("{start} to {end}"),
            count: self.count,
        }
    }
}

/// A labelled histogram bucket, e.g. `"10 to 20"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// Range label of the form `"<start> to <start + 10>"`.
    pub range: String,
    /// Bucket count.
    pub count: u64,
}

impl HistogramBucket {
    /// Creates a labelled bucket.
    #[must_use]
    pub fn new(range: impl Into<String>, count: u64) -> Self {
        Self {
            range: range.into(),
            count,
        }
    }
}

/// One aligned row of the paired real/predicted bar chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledHistogramRow {
    /// Range label.
    pub range: String,
    /// Count in the observed distribution (0 if absent).
    pub real_count: u64,
    /// Count in the predicted distribution (0 if absent).
    pub predicted_count: u64,
}

/// Response of `GET /api/collisions/visualization?type=histogram`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramData {
    /// Observed speed-change buckets.
    #[serde(default)]
    pub histogram_real_data: Vec<HistogramBin>,
    /// Predicted speed-change buckets.
    #[serde(default)]
    pub histogram_predicted_data: Vec<HistogramBin>,
}
