//! The per-collision detail view with its two synchronized maps.

use collision_speed_analytics::pair_snapshots;
use collision_speed_client::ClientError;
use collision_speed_collision_models::{CollisionRecord, CoordinateKey};
use collision_speed_map_sync::{
    ControllerSettings, DualMapController, HeadlessMap, MapSide, MapView, MarkerLayer,
};
use collision_speed_speed_models::{
    LocationComparisonPoint, SnapshotPair, SpeedComparisonPoint, SpeedTrends,
};
use serde::Serialize;

/// Identifies one opening of the detail view. Ids only ever grow, so a
/// response tagged with an older id belongs to a closed session.
pub type SessionId = u64;

/// The per-collision detail view: two synchronized speed maps, a timestamp
/// selector and the comparison charts.
#[derive(Debug)]
pub struct DetailSession<M: MapView = HeadlessMap> {
    id: SessionId,
    collision: CollisionRecord,
    loading: bool,
    pairs: Vec<SnapshotPair>,
    selected_index: usize,
    controller: DualMapController<M>,
}

impl<M: MapView> DetailSession<M> {
    /// Opens a session in the loading state, with both maps centred on the
    /// collision.
    pub fn new(
        id: SessionId,
        collision: CollisionRecord,
        observed: M,
        predicted: M,
        settings: ControllerSettings,
    ) -> Self {
        let controller = DualMapController::new(observed, predicted, collision.location(), settings);
        Self {
            id,
            collision,
            loading: true,
            pairs: Vec::new(),
            selected_index: 0,
            controller,
        }
    }

    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub const fn collision(&self) -> &CollisionRecord {
        &self.collision
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn pairs(&self) -> &[SnapshotPair] {
        &self.pairs
    }

    /// Stores fetched trends, pairing observed and predicted snapshots by
    /// position, and selects the first timestamp.
    pub fn apply_trends(&mut self, trends: SpeedTrends) {
        self.pairs = pair_snapshots(trends.real_speed_trends, trends.predicted_speed_trends);
        self.selected_index = 0;
        self.loading = false;
        log::info!(
            "Session {}: {} speed snapshots for {}",
            self.id,
            self.pairs.len(),
            self.collision.title()
        );
    }

    /// Records a failed fetch. The session stops loading and keeps whatever
    /// it had.
    pub fn fail(&mut self, error: &ClientError) {
        self.loading = false;
        log::error!("Error fetching speed data: {error}");
    }

    /// Timestamp labels for the selector, in snapshot order.
    #[must_use]
    pub fn timestamps(&self) -> Vec<&str> {
        self.pairs.iter().map(SnapshotPair::label).collect()
    }

    #[must_use]
    pub const fn selected_index(&self) -> usize {
        self.selected_index
    }

    /// Selects the timestamp at `index`. Out-of-range indices are ignored.
    pub fn select_timestamp(&mut self, index: usize) -> bool {
        if index >= self.pairs.len() {
            log::warn!(
                "Ignoring timestamp index {index}; session has {} snapshots",
                self.pairs.len()
            );
            return false;
        }
        self.selected_index = index;
        true
    }

    #[must_use]
    pub fn selected_pair(&self) -> Option<&SnapshotPair> {
        self.pairs.get(self.selected_index)
    }

    #[must_use]
    pub const fn controller(&self) -> &DualMapController<M> {
        &self.controller
    }

    pub const fn controller_mut(&mut self) -> &mut DualMapController<M> {
        &mut self.controller
    }

    /// Markers for the selected timestamp on `side`.
    #[must_use]
    pub fn markers(&self, side: MapSide) -> Option<MarkerLayer> {
        self.selected_pair()
            .map(|pair| self.controller.markers(side, pair))
    }

    /// Observed vs. predicted average speed within the radius filter.
    #[must_use]
    pub fn average_series(&self) -> Vec<SpeedComparisonPoint> {
        self.controller.average_series(&self.pairs)
    }

    /// Observed vs. predicted speed at the selected sensor.
    #[must_use]
    pub fn selected_series(&self) -> Vec<LocationComparisonPoint> {
        self.controller.selected_series(&self.pairs)
    }

    /// Serializable snapshot of everything the view renders.
    #[must_use]
    pub fn summary(&self) -> DetailSummary {
        DetailSummary {
            session_id: self.id,
            collision: self.collision.clone(),
            loading: self.loading,
            timestamps: self.timestamps().into_iter().map(String::from).collect(),
            selected_timestamp: self.selected_pair().map(|p| p.label().to_string()),
            radius_km: self.controller.radius_km(),
            selected_location: self.controller.selection(),
            observed_markers: self.markers(MapSide::Observed),
            predicted_markers: self.markers(MapSide::Predicted),
            average_speeds: self.average_series(),
            location_speeds: self.selected_series(),
        }
    }
}

/// Everything the detail view renders, in one serializable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailSummary {
    /// Session the summary was taken from.
    pub session_id: SessionId,
    /// Collision the view is opened on.
    pub collision: CollisionRecord,
    /// Whether speed trends are still being fetched.
    pub loading: bool,
    /// Timestamp selector labels, in snapshot order.
    pub timestamps: Vec<String>,
    /// Label of the snapshot the markers are drawn for.
    pub selected_timestamp: Option<String>,
    /// Radius filter around the collision in kilometres.
    pub radius_km: f64,
    /// Selected sensor, if any.
    pub selected_location: Option<CoordinateKey>,
    /// Observed map layer for the selected timestamp.
    pub observed_markers: Option<MarkerLayer>,
    /// Predicted map layer for the selected timestamp.
    pub predicted_markers: Option<MarkerLayer>,
    /// Observed vs. predicted average speed per clock time.
    pub average_speeds: Vec<SpeedComparisonPoint>,
    /// Observed vs. predicted speed at the selected sensor.
    pub location_speeds: Vec<LocationComparisonPoint>,
}

#[cfg(test)]
mod tests {
    use collision_speed_collision_models::LatLng;
    use collision_speed_map_sync::Viewport;
    use collision_speed_speed_models::SpeedSnapshot;

    use super::*;

    const SENSOR: (f64, f64) = (34.0530, -118.2440);

    fn collision() -> CollisionRecord {
        serde_json::from_value(serde_json::json!({
            "latitude": 34.0522,
            "longitude": -118.2437,
            "Date Occurred": "2012-03-15",
            "Time Occurred": "08:30"
        }))
        .unwrap()
    }

    fn session() -> DetailSession {
        let blank = HeadlessMap::new(Viewport::new(LatLng::new(0.0, 0.0), 1.0));
        DetailSession::new(
            7,
            collision(),
            blank.clone(),
            blank,
            ControllerSettings::default(),
        )
    }

    fn trends() -> SpeedTrends {
        SpeedTrends {
            real_speed_trends: vec![
                SpeedSnapshot::from_pairs("2012-03-15 08:25", &[(SENSOR, 60.0)]),
                SpeedSnapshot::from_pairs("2012-03-15 08:30", &[(SENSOR, 30.0)]),
                SpeedSnapshot::from_pairs("2012-03-15 08:35", &[(SENSOR, 20.0)]),
            ],
            predicted_speed_trends: vec![
                SpeedSnapshot::from_pairs("2012-03-15 08:25", &[(SENSOR, 58.0)]),
                SpeedSnapshot::from_pairs("2012-03-15 08:30", &[(SENSOR, 50.0)]),
            ],
        }
    }

    #[test]
    fn opens_loading_with_maps_on_collision() {
        let session = session();
        assert!(session.is_loading());
        assert!(session.markers(MapSide::Observed).is_none());
        let viewport = session.controller().viewport(MapSide::Predicted);
        assert_eq!(viewport.center, collision().location());
        assert!((viewport.zoom - 13.0).abs() < f64::EPSILON);
    }

    #[test]
    fn applies_trends_paired_and_truncated() {
        let mut session = session();
        session.apply_trends(trends());

        assert!(!session.is_loading());
        assert_eq!(
            session.timestamps(),
            vec!["2012-03-15 08:25", "2012-03-15 08:30"]
        );
        assert_eq!(session.selected_index(), 0);
        assert_eq!(session.average_series().len(), 2);
    }

    #[test]
    fn failure_stops_loading_with_no_data() {
        let mut session = session();
        session.fail(&ClientError::Status {
            status: 404,
            message: "No data".to_string(),
        });
        assert!(!session.is_loading());
        assert!(session.pairs().is_empty());
        assert!(session.average_series().is_empty());
    }

    #[test]
    fn timestamp_selection_drives_markers() {
        let mut session = session();
        session.apply_trends(trends());

        assert!(session.select_timestamp(1));
        assert!(!session.select_timestamp(2));
        assert_eq!(session.selected_index(), 1);

        let markers = session.markers(MapSide::Predicted).unwrap();
        assert_eq!(markers.circles.len(), 1);
        assert!((markers.circles[0].speed - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn marker_selection_feeds_location_series() {
        let mut session = session();
        session.apply_trends(trends());
        assert!(session.selected_series().is_empty());

        session
            .controller_mut()
            .click_marker(CoordinateKey::new(SENSOR.0, SENSOR.1));

        let series = session.selected_series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].time, "08:30");
        assert_eq!(series[1].real_speed, Some(30.0));
        assert_eq!(series[1].predicted_speed, Some(50.0));

        let summary = session.summary();
        assert_eq!(summary.session_id, 7);
        assert_eq!(summary.selected_timestamp.as_deref(), Some("2012-03-15 08:25"));
        assert!(summary.observed_markers.unwrap().circles[0].selected);
    }
}
