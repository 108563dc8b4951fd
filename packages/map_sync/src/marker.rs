//! Sensor circles and the collision pin drawn on each speed map.

use collision_speed_collision_models::{CoordinateKey, LatLng};
use collision_speed_speed_models::{SpeedBand, SpeedSnapshot};
use serde::Serialize;

/// Circle radius in metres.
pub const DEFAULT_MARKER_RADIUS_M: f64 = 200.0;
/// Circle fill opacity.
pub const FILL_OPACITY: f64 = 0.5;
/// Circle stroke opacity.
pub const STROKE_OPACITY: f64 = 0.8;
/// Stroke weight of an unselected circle.
pub const STROKE_WEIGHT: u8 = 1;
/// Stroke weight of the selected sensor's circle.
pub const SELECTED_STROKE_WEIGHT: u8 = 3;

/// One sensor circle on a speed map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleMarker {
    /// Sensor position.
    pub coordinate: CoordinateKey,
    /// Reading in km/h.
    pub speed: f64,
    /// Colour band of the reading.
    pub band: SpeedBand,
    /// CSS hex colour used for both fill and stroke.
    pub color: &'static str,
    /// Radius in metres.
    pub radius_m: f64,
    /// Fill opacity.
    pub fill_opacity: f64,
    /// Stroke opacity.
    pub stroke_opacity: f64,
    /// Stroke weight in pixels.
    pub stroke_weight: u8,
    /// Whether this is the selected sensor.
    pub selected: bool,
}

impl CircleMarker {
    #[must_use]
    pub fn new(coordinate: CoordinateKey, speed: f64, radius_m: f64, selected: bool) -> Self {
        let band = SpeedBand::for_speed(speed);
        Self {
            coordinate,
            speed,
            band,
            color: band.color(),
            radius_m,
            fill_opacity: FILL_OPACITY,
            stroke_opacity: STROKE_OPACITY,
            stroke_weight: if selected {
                SELECTED_STROKE_WEIGHT
            } else {
                STROKE_WEIGHT
            },
            selected,
        }
    }
}

/// Everything drawn on one map for one timestamp: the collision pin plus
/// a circle per sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerLayer {
    /// Collision pin position.
    pub collision: LatLng,
    /// One circle per reading inside the radius filter.
    pub circles: Vec<CircleMarker>,
}

impl MarkerLayer {
    /// Builds the layer for `snapshot`, marking `selected` if present.
    #[must_use]
    pub fn build(
        collision: LatLng,
        snapshot: &SpeedSnapshot,
        radius_m: f64,
        selected: Option<&CoordinateKey>,
    ) -> Self {
        let circles = snapshot
            .readings
            .iter()
            .map(|r| CircleMarker::new(r.coordinate, r.speed, radius_m, selected == Some(&r.coordinate)))
            .collect();
        Self { collision, circles }
    }

    /// The circle for `coordinate`, if drawn.
    #[must_use]
    pub fn circle_at(&self, coordinate: &CoordinateKey) -> Option<&CircleMarker> {
        self.circles.iter().find(|c| c.coordinate == *coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_circle_by_speed_band() {
        let marker = CircleMarker::new(CoordinateKey::new(34.0, -118.0), 95.0, 200.0, false);
        assert_eq!(marker.color, "#0000FF");
        assert_eq!(marker.stroke_weight, STROKE_WEIGHT);
        assert!((marker.fill_opacity - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn selected_circle_has_heavier_stroke() {
        let selected = CoordinateKey::new(34.1, -118.1);
        let snapshot = SpeedSnapshot::from_pairs(
            "08:00",
            &[((34.0, -118.0), 25.0), ((34.1, -118.1), 45.0)],
        );
        let layer = MarkerLayer::build(LatLng::new(34.05, -118.05), &snapshot, 200.0, Some(&selected));

        assert_eq!(layer.circles.len(), 2);
        let circle = layer.circle_at(&selected).unwrap();
        assert!(circle.selected);
        assert_eq!(circle.stroke_weight, SELECTED_STROKE_WEIGHT);
        assert_eq!(circle.color, "#FFA500");
        assert_eq!(layer.circles[0].stroke_weight, STROKE_WEIGHT);
    }
}
