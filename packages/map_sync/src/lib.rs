#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Keeps the observed and predicted speed maps in lock-step and owns the
//! single sensor selection that drives the per-location speed series.
//!
//! Map widgets raise a change event for *every* view update, including the
//! ones the controller itself makes on the paired map. Without a guard,
//! copying A's center to B would raise B's event, which would copy back to
//! A, and so on. [`DualMapController`] sets a [`SyncFlag`] before touching
//! the paired map and ignores any event that arrives while it is set. The
//! flag is cleared by a drop guard so a panicking widget cannot leave the
//! maps permanently unsynchronized.

mod guard;
mod marker;
mod view;

use collision_speed_analytics::proximity::within_radius;
use collision_speed_analytics::{aggregate_by_time, compare_averages, compare_location, filter_by_radius};
use collision_speed_collision_models::{CoordinateKey, LatLng};
use collision_speed_speed_models::{
    LocationComparisonPoint, SnapshotPair, SpeedComparisonPoint, SpeedSnapshot,
};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

pub use guard::{SyncFlag, SyncGuard};
pub use marker::{
    CircleMarker, DEFAULT_MARKER_RADIUS_M, FILL_OPACITY, MarkerLayer, SELECTED_STROKE_WEIGHT,
    STROKE_OPACITY, STROKE_WEIGHT,
};
pub use view::{HeadlessMap, MapSide, MapView, ViewChange, Viewport};

/// Zoom both detail maps open at.
pub const DEFAULT_DETAIL_ZOOM: f64 = 13.0;

/// Radius filter applied when a session opens, in kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Where the controller is in its interaction cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ControllerState {
    /// Maps in sync, nothing selected.
    Idle,
    /// A view change is being copied to the paired map. Only observable
    /// from inside a [`MapView`] setter, through
    /// [`DualMapController::sync_flag`].
    Panning,
    /// One sensor is selected.
    MarkerSelected,
}

/// What [`DualMapController::on_view_changed`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Copied to the paired map.
    Propagated,
    /// Arrived while a sync was in progress; ignored.
    Suppressed,
    /// The paired map already matched.
    Unchanged,
}

/// Counters for diagnosing sync behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Events copied to the paired map.
    pub propagated: u64,
    /// Events ignored because a sync was in flight.
    pub suppressed: u64,
    /// Events the paired map already matched.
    pub unchanged: u64,
}

/// Values a controller is opened with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// Zoom both maps open at.
    pub zoom: f64,
    /// Sensor circle radius in metres.
    pub marker_radius_m: f64,
    /// Initial radius filter around the collision in kilometres.
    pub radius_km: f64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_DETAIL_ZOOM,
            marker_radius_m: DEFAULT_MARKER_RADIUS_M,
            radius_km: DEFAULT_RADIUS_KM,
        }
    }
}

/// Two maps, one viewport, at most one selected sensor.
#[derive(Debug)]
pub struct DualMapController<M: MapView> {
    observed: M,
    predicted: M,
    collision: LatLng,
    marker_radius_m: f64,
    radius_km: f64,
    selection: Option<CoordinateKey>,
    syncing: SyncFlag,
    stats: SyncStats,
}

impl<M: MapView> DualMapController<M> {
    /// Takes ownership of both maps and centres them on `collision`.
    pub fn new(observed: M, predicted: M, collision: LatLng, settings: ControllerSettings) -> Self {
        let mut controller = Self {
            observed,
            predicted,
            collision,
            marker_radius_m: settings.marker_radius_m,
            radius_km: settings.radius_km,
            selection: None,
            syncing: SyncFlag::new(),
            stats: SyncStats::default(),
        };
        controller.reset_viewport(Viewport::new(collision, settings.zoom));
        controller
    }

    /// Sets both maps to `viewport` under the sync guard.
    pub fn reset_viewport(&mut self, viewport: Viewport) {
        let _guard = self.syncing.engage();
        for side in [MapSide::Observed, MapSide::Predicted] {
            let map = self.map_mut(side);
            let echoes = [map.set_center(viewport.center), map.set_zoom(viewport.zoom)];
            for echo in echoes.into_iter().flatten() {
                self.on_view_changed(side, echo);
            }
        }
    }

    /// Handles a view-change event raised by the map on `source`.
    ///
    /// Center and zoom are copied independently to the paired map. Events
    /// raised while a copy is in flight, including the paired map's echo of
    /// the copy itself, are suppressed.
    pub fn on_view_changed(&mut self, source: MapSide, change: ViewChange) -> SyncOutcome {
        if self.syncing.is_set() {
            self.stats.suppressed += 1;
            log::trace!("Suppressed {source} view change during sync: {change:?}");
            return SyncOutcome::Suppressed;
        }

        let target = source.paired();
        if change.is_noop_for(&self.map(target).viewport()) {
            self.stats.unchanged += 1;
            return SyncOutcome::Unchanged;
        }

        let guard = self.syncing.engage();
        let echo = match change {
            ViewChange::Center(center) => self.map_mut(target).set_center(center),
            ViewChange::Zoom(zoom) => self.map_mut(target).set_zoom(zoom),
        };
        if let Some(echo) = echo {
            self.on_view_changed(target, echo);
        }
        drop(guard);

        self.stats.propagated += 1;
        log::trace!("Copied {source} view change to {target}: {change:?}");
        SyncOutcome::Propagated
    }

    /// Handles a click on the circle for `coordinate`.
    ///
    /// Clicking the selected sensor again clears the selection; clicking
    /// any other sensor replaces it. A sensor outside the radius filter has
    /// no circle, so it is rejected and the selection left as is. Returns
    /// the selection now in effect.
    pub fn click_marker(&mut self, coordinate: CoordinateKey) -> Option<CoordinateKey> {
        if !within_radius(self.collision, coordinate.position(), self.radius_km) {
            log::warn!(
                "Ignoring selection of {coordinate}: outside {} km of the collision",
                self.radius_km
            );
            return self.selection;
        }

        self.selection = if self.selection == Some(coordinate) {
            None
        } else {
            Some(coordinate)
        };
        log::debug!(
            "Sensor selection: {}",
            self.selection
                .map_or_else(|| "none".to_string(), |c| c.to_string())
        );
        self.selection
    }

    /// Handles a click on the map background.
    pub fn click_empty_map(&mut self) {
        if self.selection.take().is_some() {
            log::debug!("Sensor selection cleared");
        }
    }

    /// Changes the radius filter around the collision.
    ///
    /// A selection that falls outside the new radius is cleared.
    /// Non-positive or NaN radii are ignored.
    pub fn set_radius_km(&mut self, radius_km: f64) {
        if radius_km.is_nan() || radius_km <= 0.0 {
            log::warn!("Ignoring invalid radius {radius_km} km");
            return;
        }
        self.radius_km = radius_km;

        if let Some(selected) = self.selection
            && !within_radius(self.collision, selected.position(), radius_km)
        {
            log::debug!("Selected sensor {selected} is outside {radius_km} km, clearing");
            self.selection = None;
        }
    }

    #[must_use]
    pub fn state(&self) -> ControllerState {
        if self.syncing.is_set() {
            ControllerState::Panning
        } else if self.selection.is_some() {
            ControllerState::MarkerSelected
        } else {
            ControllerState::Idle
        }
    }

    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.syncing.is_set()
    }

    /// Shared handle to the sync flag, for widgets that need to tell a
    /// programmatic update from a user one while their setter runs.
    #[must_use]
    pub fn sync_flag(&self) -> SyncFlag {
        self.syncing.clone()
    }

    #[must_use]
    pub const fn selection(&self) -> Option<CoordinateKey> {
        self.selection
    }

    #[must_use]
    pub const fn radius_km(&self) -> f64 {
        self.radius_km
    }

    #[must_use]
    pub const fn collision(&self) -> LatLng {
        self.collision
    }

    #[must_use]
    pub const fn stats(&self) -> SyncStats {
        self.stats
    }

    #[must_use]
    pub const fn map(&self, side: MapSide) -> &M {
        match side {
            MapSide::Observed => &self.observed,
            MapSide::Predicted => &self.predicted,
        }
    }

    /// Direct access for the widget event loop. Changes made through this
    /// must be reported back via [`Self::on_view_changed`].
    pub const fn map_mut(&mut self, side: MapSide) -> &mut M {
        match side {
            MapSide::Observed => &mut self.observed,
            MapSide::Predicted => &mut self.predicted,
        }
    }

    #[must_use]
    pub fn viewport(&self, side: MapSide) -> Viewport {
        self.map(side).viewport()
    }

    /// Circles to draw on `side` for `pair`, limited to the radius filter,
    /// with the selected sensor styled heavier.
    #[must_use]
    pub fn markers(&self, side: MapSide, pair: &SnapshotPair) -> MarkerLayer {
        let snapshot = match side {
            MapSide::Observed => &pair.real,
            MapSide::Predicted => &pair.predicted,
        };
        let nearby = filter_by_radius(std::slice::from_ref(snapshot), self.collision, self.radius_km);
        let nearby = nearby
            .into_iter()
            .next()
            .unwrap_or_else(|| SpeedSnapshot::new(snapshot.timestamp.clone(), Vec::new()));
        MarkerLayer::build(
            self.collision,
            &nearby,
            self.marker_radius_m,
            self.selection.as_ref(),
        )
    }

    /// Observed vs. predicted speed at the selected sensor; empty when
    /// nothing is selected.
    #[must_use]
    pub fn selected_series(&self, pairs: &[SnapshotPair]) -> Vec<LocationComparisonPoint> {
        self.selection
            .map_or_else(Vec::new, |coordinate| compare_location(pairs, &coordinate))
    }

    /// Average-speed comparison over sensors inside the radius filter,
    /// joined on clock time.
    #[must_use]
    pub fn average_series(&self, pairs: &[SnapshotPair]) -> Vec<SpeedComparisonPoint> {
        let real: Vec<SpeedSnapshot> = pairs.iter().map(|p| p.real.clone()).collect();
        let predicted: Vec<SpeedSnapshot> = pairs.iter().map(|p| p.predicted.clone()).collect();

        let real = aggregate_by_time(&filter_by_radius(&real, self.collision, self.radius_km));
        let predicted =
            aggregate_by_time(&filter_by_radius(&predicted, self.collision, self.radius_km));

        compare_averages(&real, &predicted)
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use collision_speed_analytics::pair_snapshots;

    use super::*;

    const COLLISION: LatLng = LatLng::new(34.0522, -118.2437);
    const NEAR: (f64, f64) = (34.0530, -118.2440);
    const FAR: (f64, f64) = (34.0195, -118.4912);

    /// Headless map that counts setter calls and can be told to panic.
    #[derive(Debug)]
    struct TestMap {
        inner: HeadlessMap,
        set_calls: usize,
        fail: bool,
        /// Flag to sample from inside setters, and what it read.
        watch: Option<SyncFlag>,
        saw_syncing: Vec<bool>,
    }

    impl TestMap {
        fn new() -> Self {
            Self {
                inner: HeadlessMap::new(Viewport::new(LatLng::new(0.0, 0.0), 1.0)),
                set_calls: 0,
                fail: false,
                watch: None,
                saw_syncing: Vec::new(),
            }
        }
    }

    impl MapView for TestMap {
        fn viewport(&self) -> Viewport {
            self.inner.viewport()
        }

        fn set_center(&mut self, center: LatLng) -> Option<ViewChange> {
            assert!(!self.fail, "map widget failed");
            self.set_calls += 1;
            if let Some(flag) = &self.watch {
                self.saw_syncing.push(flag.is_set());
            }
            self.inner.set_center(center)
        }

        fn set_zoom(&mut self, zoom: f64) -> Option<ViewChange> {
            assert!(!self.fail, "map widget failed");
            self.set_calls += 1;
            self.inner.set_zoom(zoom)
        }
    }

    fn controller() -> DualMapController<TestMap> {
        DualMapController::new(
            TestMap::new(),
            TestMap::new(),
            COLLISION,
            ControllerSettings::default(),
        )
    }

    /// Simulates the user moving one map: the widget updates itself and
    /// raises its event.
    fn user_pan(c: &mut DualMapController<TestMap>, side: MapSide, center: LatLng) -> SyncOutcome {
        let change = c.map_mut(side).set_center(center).unwrap();
        c.on_view_changed(side, change)
    }

    fn user_zoom(c: &mut DualMapController<TestMap>, side: MapSide, zoom: f64) -> SyncOutcome {
        let change = c.map_mut(side).set_zoom(zoom).unwrap();
        c.on_view_changed(side, change)
    }

    #[test]
    fn opens_both_maps_on_collision_at_detail_zoom() {
        let c = controller();
        let expected = Viewport::new(COLLISION, DEFAULT_DETAIL_ZOOM);
        assert_eq!(c.viewport(MapSide::Observed), expected);
        assert_eq!(c.viewport(MapSide::Predicted), expected);
        assert!(!c.is_syncing());
        assert_eq!(c.state(), ControllerState::Idle);
        assert_eq!(c.stats().suppressed, 4);
        assert_eq!(c.stats().propagated, 0);
    }

    #[test]
    fn pan_copies_center_and_clears_flag() {
        let mut c = controller();
        let target = LatLng::new(34.06, -118.25);

        assert_eq!(user_pan(&mut c, MapSide::Observed, target), SyncOutcome::Propagated);

        assert_eq!(c.viewport(MapSide::Predicted).center, target);
        assert_eq!(
            c.viewport(MapSide::Observed),
            c.viewport(MapSide::Predicted)
        );
        assert!(!c.is_syncing());
    }

    #[test]
    fn echo_from_paired_map_is_suppressed_not_recursed() {
        let mut c = controller();
        let before = c.stats();
        let predicted_calls = c.map(MapSide::Predicted).set_calls;
        let observed_calls = c.map(MapSide::Observed).set_calls;

        user_pan(&mut c, MapSide::Predicted, LatLng::new(34.07, -118.26));

        assert_eq!(c.stats().propagated, before.propagated + 1);
        assert_eq!(c.stats().suppressed, before.suppressed + 1);
        // One user setter on the predicted map, one copy onto the observed map.
        assert_eq!(c.map(MapSide::Predicted).set_calls, predicted_calls + 1);
        assert_eq!(c.map(MapSide::Observed).set_calls, observed_calls + 1);
    }

    #[test]
    fn zoom_copies_only_zoom() {
        let mut c = controller();
        let stray = LatLng::new(34.2, -118.4);
        // Move the observed center without reporting it.
        let _ = c.map_mut(MapSide::Observed).set_center(stray);

        assert_eq!(user_zoom(&mut c, MapSide::Observed, 16.0), SyncOutcome::Propagated);

        let predicted = c.viewport(MapSide::Predicted);
        assert!((predicted.zoom - 16.0).abs() < f64::EPSILON);
        assert_eq!(predicted.center, COLLISION);
    }

    #[test]
    fn change_already_matching_paired_map_is_unchanged() {
        let mut c = controller();
        let outcome = c.on_view_changed(MapSide::Observed, ViewChange::Zoom(DEFAULT_DETAIL_ZOOM));
        assert_eq!(outcome, SyncOutcome::Unchanged);
        assert_eq!(c.stats().unchanged, 1);
    }

    #[test]
    fn sequential_pans_on_both_sides_stay_in_sync() {
        let mut c = controller();
        user_pan(&mut c, MapSide::Observed, LatLng::new(34.1, -118.3));
        user_zoom(&mut c, MapSide::Predicted, 15.0);
        user_pan(&mut c, MapSide::Predicted, LatLng::new(34.0, -118.2));
        user_zoom(&mut c, MapSide::Observed, 12.0);

        assert_eq!(
            c.viewport(MapSide::Observed),
            c.viewport(MapSide::Predicted)
        );
        assert_eq!(c.stats().propagated, 4);
        assert!(!c.is_syncing());
    }

    #[test]
    fn panicking_widget_does_not_leave_flag_set() {
        let mut c = controller();
        c.map_mut(MapSide::Predicted).fail = true;

        let result = catch_unwind(AssertUnwindSafe(|| {
            user_pan(&mut c, MapSide::Observed, LatLng::new(34.1, -118.1))
        }));

        assert!(result.is_err());
        assert!(!c.is_syncing());
        assert_eq!(c.state(), ControllerState::Idle);

        c.map_mut(MapSide::Predicted).fail = false;
        let target = LatLng::new(34.2, -118.2);
        assert_eq!(user_pan(&mut c, MapSide::Observed, target), SyncOutcome::Propagated);
        assert_eq!(c.viewport(MapSide::Predicted).center, target);
    }

    #[test]
    fn marker_click_toggles_and_replaces() {
        let mut c = controller();
        let k = CoordinateKey::new(NEAR.0, NEAR.1);
        let k2 = CoordinateKey::new(34.054, -118.245);

        assert_eq!(c.click_marker(k), Some(k));
        assert_eq!(c.state(), ControllerState::MarkerSelected);

        assert_eq!(c.click_marker(k), None);
        assert_eq!(c.state(), ControllerState::Idle);

        c.click_marker(k);
        assert_eq!(c.click_marker(k2), Some(k2));
        assert_eq!(c.selection(), Some(k2));
    }

    #[test]
    fn empty_map_click_clears_selection() {
        let mut c = controller();
        c.click_marker(CoordinateKey::new(NEAR.0, NEAR.1));
        c.click_empty_map();
        assert_eq!(c.selection(), None);
        assert_eq!(c.state(), ControllerState::Idle);
    }

    #[test]
    fn panning_keeps_selection() {
        let mut c = controller();
        let k = CoordinateKey::new(NEAR.0, NEAR.1);
        c.click_marker(k);
        user_pan(&mut c, MapSide::Observed, LatLng::new(34.1, -118.3));
        assert_eq!(c.selection(), Some(k));
    }

    #[test]
    fn shrinking_radius_clears_selection_outside_it() {
        let mut c = controller();
        c.set_radius_km(50.0);
        c.click_marker(CoordinateKey::new(FAR.0, FAR.1));

        c.set_radius_km(5.0);

        assert_eq!(c.selection(), None);
        assert!((c.radius_km() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_radius_is_ignored() {
        let mut c = controller();
        c.set_radius_km(0.0);
        c.set_radius_km(f64::NAN);
        assert!((c.radius_km() - DEFAULT_RADIUS_KM).abs() < f64::EPSILON);
    }

    #[test]
    fn markers_follow_radius_and_selection_on_both_maps() {
        let mut c = controller();
        let near = CoordinateKey::new(NEAR.0, NEAR.1);
        let pair = SnapshotPair {
            real: SpeedSnapshot::from_pairs("08:00", &[(NEAR, 95.0), (FAR, 20.0)]),
            predicted: SpeedSnapshot::from_pairs("08:00", &[(NEAR, 35.0), (FAR, 25.0)]),
        };
        c.click_marker(near);

        let observed = c.markers(MapSide::Observed, &pair);
        let predicted = c.markers(MapSide::Predicted, &pair);

        assert_eq!(observed.collision, COLLISION);
        assert_eq!(observed.circles.len(), 1);
        assert_eq!(predicted.circles.len(), 1);
        assert!(observed.circles[0].selected);
        assert!(predicted.circles[0].selected);
        assert_eq!(observed.circles[0].color, "#0000FF");
        assert_eq!(predicted.circles[0].color, "#FF4500");
        assert!((observed.circles[0].radius_m - DEFAULT_MARKER_RADIUS_M).abs() < f64::EPSILON);
    }

    #[test]
    fn series_follow_selection_and_radius() {
        let mut c = controller();
        let pairs = pair_snapshots(
            vec![
                SpeedSnapshot::from_pairs("08:00", &[(NEAR, 40.0), (FAR, 100.0)]),
                SpeedSnapshot::from_pairs("08:05", &[(NEAR, 20.0)]),
            ],
            vec![
                SpeedSnapshot::from_pairs("08:00", &[(NEAR, 42.0), (FAR, 90.0)]),
                SpeedSnapshot::from_pairs("08:05", &[(NEAR, 30.0)]),
            ],
        );

        assert!(c.selected_series(&pairs).is_empty());

        c.click_marker(CoordinateKey::new(NEAR.0, NEAR.1));
        let selected = c.selected_series(&pairs);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[1].real_speed, Some(20.0));
        assert_eq!(selected[1].predicted_speed, Some(30.0));

        let averages = c.average_series(&pairs);
        assert_eq!(averages.len(), 2);
        // FAR is outside the 5 km radius.
        assert!((averages[0].real_average_speed - 40.0).abs() < f64::EPSILON);
        assert!((averages[0].predicted_average_speed - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn paired_setter_sees_sync_in_progress() {
        let mut c = controller();
        let flag = c.sync_flag();
        c.map_mut(MapSide::Predicted).watch = Some(flag.clone());
        c.map_mut(MapSide::Observed).watch = Some(flag);

        user_pan(&mut c, MapSide::Observed, LatLng::new(34.1, -118.3));

        // The user's own move ran unguarded; the copy ran while panning.
        assert_eq!(c.map(MapSide::Observed).saw_syncing, vec![false]);
        assert_eq!(c.map(MapSide::Predicted).saw_syncing, vec![true]);
        assert_eq!(c.state(), ControllerState::Idle);
    }

    #[test]
    fn sensor_outside_radius_cannot_be_selected() {
        let mut c = controller();
        let far = CoordinateKey::new(FAR.0, FAR.1);

        assert_eq!(c.click_marker(far), None);
        assert_eq!(c.state(), ControllerState::Idle);

        let near = CoordinateKey::new(NEAR.0, NEAR.1);
        c.click_marker(near);
        assert_eq!(c.click_marker(far), Some(near));
        assert_eq!(c.selection(), Some(near));
    }

    #[test]
    fn averages_stay_aligned_when_one_side_has_an_empty_snapshot() {
        let real: Vec<SpeedSnapshot> = serde_json::from_value(serde_json::json!([
            { "Date Occurred": "2012-03-15 08:00", "(34.053, -118.244)": null },
            { "Date Occurred": "2012-03-15 08:05", "(34.053, -118.244)": 20.0 },
            { "Date Occurred": "2012-03-15 08:10", "(34.053, -118.244)": 30.0 }
        ]))
        .unwrap();
        let predicted = vec![
            SpeedSnapshot::from_pairs("2012-03-15 08:00", &[(NEAR, 60.0)]),
            SpeedSnapshot::from_pairs("2012-03-15 08:05", &[(NEAR, 22.0)]),
            SpeedSnapshot::from_pairs("2012-03-15 08:10", &[(NEAR, 31.0)]),
        ];
        let c = controller();

        let rows = c.average_series(&pair_snapshots(real, predicted));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time, "08:05");
        assert!((rows[0].real_average_speed - 20.0).abs() < f64::EPSILON);
        assert!((rows[0].predicted_average_speed - 22.0).abs() < f64::EPSILON);
        assert_eq!(rows[1].time, "08:10");
        assert!((rows[1].predicted_average_speed - 31.0).abs() < f64::EPSILON);
    }
}
