//! Observed vs. predicted speed-change histogram reconciliation.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use collision_speed_speed_models::{
    HistogramBin, HistogramBucket, HistogramData, ReconciledHistogramRow,
};

/// Converts backend bins into `"<start> to <end>"` labelled buckets.
#[must_use]
pub fn label_buckets(bins: &[HistogramBin]) -> Vec<HistogramBucket> {
    bins.iter().map(HistogramBin::labeled).collect()
}

/// Parses the numeric lower bound from a `"<start> to <end>"` label.
///
/// Returns `None` when the text before `" to "` is not a finite number.
#[must_use]
pub fn parse_lower_bound(label: &str) -> Option<f64> {
    let start = label.split_once(" to ").map_or(label, |(start, _)| start);
    start
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Merges two independently keyed distributions into one aligned series.
///
/// The output has one row per distinct range label across both inputs,
/// with `0` for whichever side lacks the range. Rows ascend by the numeric
/// lower bound parsed from the label; labels that do not parse go last in
/// the order they were first seen. A label repeated within one input keeps
/// its last count.
#[must_use]
pub fn reconcile(
    real: &[HistogramBucket],
    predicted: &[HistogramBucket],
) -> Vec<ReconciledHistogramRow> {
    let mut order: Vec<&str> = Vec::with_capacity(real.len() + predicted.len());
    let mut real_counts: BTreeMap<&str, u64> = BTreeMap::new();
    let mut predicted_counts: BTreeMap<&str, u64> = BTreeMap::new();

    for bucket in real {
        if !real_counts.contains_key(bucket.range.as_str()) {
            order.push(&bucket.range);
        }
        real_counts.insert(&bucket.range, bucket.count);
    }
    for bucket in predicted {
        let range = bucket.range.as_str();
        if !real_counts.contains_key(range) && !predicted_counts.contains_key(range) {
            order.push(range);
        }
        predicted_counts.insert(range, bucket.count);
    }

    let mut keyed: Vec<(Option<f64>, ReconciledHistogramRow)> = order
        .into_iter()
        .map(|range| {
            let bound = parse_lower_bound(range);
            if bound.is_none() {
                log::warn!("Histogram range '{range}' has no numeric lower bound");
            }
            let row = ReconciledHistogramRow {
                range: range.to_string(),
                real_count: real_counts.get(range).copied().unwrap_or(0),
                predicted_count: predicted_counts.get(range).copied().unwrap_or(0),
            };
            (bound, row)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    keyed.into_iter().map(|(_, row)| row).collect()
}

/// Labels and reconciles a histogram endpoint response in one step.
#[must_use]
pub fn reconcile_histogram(data: &HistogramData) -> Vec<ReconciledHistogramRow> {
    reconcile(
        &label_buckets(&data.histogram_real_data),
        &label_buckets(&data.histogram_predicted_data),
    )
}
