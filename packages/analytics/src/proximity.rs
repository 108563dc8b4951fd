//! Great-circle radius filtering of sensor readings.

use collision_speed_collision_models::LatLng;
use collision_speed_speed_models::SpeedSnapshot;
use geo::{Distance, Haversine, Point};

/// Haversine distance between two positions in kilometres.
#[must_use]
pub fn distance_km(a: LatLng, b: LatLng) -> f64 {
    let a = Point::new(a.lng, a.lat);
    let b = Point::new(b.lng, b.lat);
    Haversine.distance(a, b) / 1000.0
}

/// Whether `point` lies within `radius_km` of `center` (inclusive).
#[must_use]
pub fn within_radius(center: LatLng, point: LatLng, radius_km: f64) -> bool {
    distance_km(center, point) <= radius_km
}

/// Copies of `snapshots` keeping only readings within `radius_km` of
/// `center`.
///
/// Snapshots are never dropped, even when every reading falls outside the
/// radius, so observed and predicted lists keep their positional pairing.
#[must_use]
pub fn filter_by_radius(snapshots: &[SpeedSnapshot], center: LatLng, radius_km: f64) -> Vec<SpeedSnapshot> {
    snapshots
        .iter()
        .map(|snapshot| {
            let readings = snapshot
                .readings
                .iter()
                .filter(|r| within_radius(center, r.coordinate.position(), radius_km))
                .copied()
                .collect();
            SpeedSnapshot::new(snapshot.timestamp.clone(), readings)
        })
        .collect()
}
