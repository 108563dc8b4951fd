//! Map sides, viewports and the widget seam the controller drives.

use collision_speed_collision_models::LatLng;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Tolerance below which two zoom levels are considered equal.
const ZOOM_EPSILON: f64 = 1e-9;

/// Which of the two side-by-side maps an event came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MapSide {
    /// Map showing observed speeds.
    Observed,
    /// Map showing model-predicted speeds.
    Predicted,
}

impl MapSide {
    /// The other map.
    #[must_use]
    pub const fn paired(self) -> Self {
        match self {
            Self::Observed => Self::Predicted,
            Self::Predicted => Self::Observed,
        }
    }
}

/// Center and zoom of one map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Map center.
    pub center: LatLng,
    /// Zoom level.
    pub zoom: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }
}

/// A view-change event raised by a map widget.
///
/// Center and zoom changes arrive separately; each is copied on its own so
/// a zoom never drags a stale center along with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ViewChange {
    /// The map was moved.
    Center(LatLng),
    /// The map was zoomed.
    Zoom(f64),
}

impl ViewChange {
    /// Whether applying this change to `viewport` would leave it as is.
    #[must_use]
    pub fn is_noop_for(&self, viewport: &Viewport) -> bool {
        match self {
            Self::Center(center) => *center == viewport.center,
            Self::Zoom(zoom) => (zoom - viewport.zoom).abs() < ZOOM_EPSILON,
        }
    }
}

/// The seam between the controller and a concrete map widget.
///
/// Real widgets raise a change event whenever their view is set, including
/// programmatic updates. Setters return that event so the controller can
/// feed it back through its own handler exactly as the widget would.
pub trait MapView {
    /// Current center and zoom.
    fn viewport(&self) -> Viewport;

    /// Moves the map. Returns the change event the widget raises, if any.
    fn set_center(&mut self, center: LatLng) -> Option<ViewChange>;

    /// Zooms the map. Returns the change event the widget raises, if any.
    fn set_zoom(&mut self, zoom: f64) -> Option<ViewChange>;
}

/// A map with no rendering surface; records its viewport and raises a
/// change event whenever a setter actually moves it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMap {
    viewport: Viewport,
}

impl HeadlessMap {
    #[must_use]
    pub const fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }
}

impl MapView for HeadlessMap {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_center(&mut self, center: LatLng) -> Option<ViewChange> {
        let change = ViewChange::Center(center);
        if change.is_noop_for(&self.viewport) {
            return None;
        }
        self.viewport.center = center;
        Some(change)
    }

    fn set_zoom(&mut self, zoom: f64) -> Option<ViewChange> {
        let change = ViewChange::Zoom(zoom);
        if change.is_noop_for(&self.viewport) {
            return None;
        }
        self.viewport.zoom = zoom;
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paired_side_flips() {
        assert_eq!(MapSide::Observed.paired(), MapSide::Predicted);
        assert_eq!(MapSide::Predicted.paired(), MapSide::Observed);
        assert_eq!(MapSide::Observed.to_string(), "OBSERVED");
    }

    #[test]
    fn headless_map_raises_event_only_on_change() {
        let start = Viewport::new(LatLng::new(34.0, -118.0), 13.0);
        let mut map = HeadlessMap::new(start);

        assert_eq!(map.set_zoom(13.0), None);
        assert_eq!(map.set_zoom(15.0), Some(ViewChange::Zoom(15.0)));

        let center = LatLng::new(34.1, -118.1);
        assert_eq!(map.set_center(center), Some(ViewChange::Center(center)));
        assert_eq!(map.set_center(center), None);
        assert_eq!(map.viewport(), Viewport::new(center, 15.0));
    }
}
