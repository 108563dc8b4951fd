//! Speed time-series aggregation over paired observed/predicted snapshots.

use std::collections::BTreeMap;

use collision_speed_collision_models::CoordinateKey;
use collision_speed_speed_models::{
    AverageSpeedPoint, LocationComparisonPoint, LocationSpeedPoint, SnapshotPair, SpeedComparisonPoint,
    SpeedSnapshot,
};

/// Pairs observed and predicted snapshots by list position.
///
/// Assumes both backends sample at the same cadence: the pairs are *not*
/// checked for matching timestamps. When the lists differ in length the
/// tail of the longer one is dropped.
#[must_use]
pub fn pair_snapshots(real: Vec<SpeedSnapshot>, predicted: Vec<SpeedSnapshot>) -> Vec<SnapshotPair> {
    if real.len() != predicted.len() {
        log::debug!(
            "Truncating speed trends to {} pairs (real={}, predicted={})",
            real.len().min(predicted.len()),
            real.len(),
            predicted.len()
        );
    }

    real.into_iter()
        .zip(predicted)
        .map(|(real, predicted)| SnapshotPair { real, predicted })
        .collect()
}

/// Average speed per clock time.
///
/// Each snapshot is reduced to the mean of its readings, then snapshots
/// sharing an `HH:MM` label are averaged together. This is a mean of means,
/// not a reading-weighted mean: a snapshot with two sensors counts as much
/// as one with twenty. Rows appear in the order their label first occurs.
/// Snapshots without readings are skipped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_by_time(snapshots: &[SpeedSnapshot]) -> Vec<AverageSpeedPoint> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for snapshot in snapshots {
        let Some(mean) = snapshot.mean_speed() else {
            continue;
        };
        let label = snapshot.time_label();
        let entry = groups.entry(label.clone()).or_insert_with(|| {
            order.push(label);
            (0.0, 0)
        });
        entry.0 += mean;
        entry.1 += 1;
    }

    order
        .into_iter()
        .filter_map(|time| {
            let (total, n) = groups.get(&time).copied()?;
            Some(AverageSpeedPoint {
                time,
                avg_speed: total / n as f64,
            })
        })
        .collect()
}

/// Speed series for one sensor, in snapshot order.
///
/// Only snapshots carrying exactly `coordinate` contribute. Matching is
/// exact on the parsed floating-point pair; a coordinate that never
/// appears yields an empty series.
#[must_use]
pub fn filter_by_location(
    snapshots: &[SpeedSnapshot],
    coordinate: &CoordinateKey,
) -> Vec<LocationSpeedPoint> {
    snapshots
        .iter()
        .filter_map(|snapshot| {
            snapshot.speed_at(coordinate).map(|speed| LocationSpeedPoint {
                time: snapshot.time_label(),
                speed,
            })
        })
        .collect()
}

/// Joins two average series on their time label into rows for the
/// comparison line chart.
///
/// Rows follow the observed series' order. A label present on only one
/// side has no row, so a snapshot skipped on one side never shifts the
/// pairing of later rows.
#[must_use]
pub fn compare_averages(
    real: &[AverageSpeedPoint],
    predicted: &[AverageSpeedPoint],
) -> Vec<SpeedComparisonPoint> {
    let predicted: BTreeMap<&str, f64> = predicted
        .iter()
        .map(|p| (p.time.as_str(), p.avg_speed))
        .collect();

    real.iter()
        .filter_map(|real| {
            let Some(&predicted_average_speed) = predicted.get(real.time.as_str()) else {
                log::debug!("No predicted average at {}", real.time);
                return None;
            };
            Some(SpeedComparisonPoint {
                time: real.time.clone(),
                real_average_speed: real.avg_speed,
                predicted_average_speed,
            })
        })
        .collect()
}

/// Observed vs. predicted speed at one sensor for every pair where at
/// least one side reports it.
#[must_use]
pub fn compare_location(
    pairs: &[SnapshotPair],
    coordinate: &CoordinateKey,
) -> Vec<LocationComparisonPoint> {
    pairs
        .iter()
        .filter_map(|pair| {
            let real_speed = pair.real.speed_at(coordinate);
            let predicted_speed = pair.predicted.speed_at(coordinate);
            if real_speed.is_none() && predicted_speed.is_none() {
                return None;
            }
            Some(LocationComparisonPoint {
                time: pair.real.time_label(),
                real_speed,
                predicted_speed,
            })
        })
        .collect()
}
