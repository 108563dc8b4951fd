//! Collision search, selection and detail session lifecycle.

use collision_speed_client::{ApiClient, ClientError};
use collision_speed_collision_models::{CollisionRecord, DateTimeRange, LatLng};
use collision_speed_config::{AppConfig, ConfigError};
use collision_speed_map_sync::{ControllerSettings, HeadlessMap, MapView, Viewport};
use collision_speed_speed_models::SpeedTrends;

use crate::detail::{DetailSession, SessionId};

/// The collision analyzer: date-range search, collision map with one
/// selected collision, and at most one open detail session.
#[derive(Debug)]
pub struct AnalyzerState<M: MapView = HeadlessMap> {
    bounds: DateTimeRange,
    search: DateTimeRange,
    collisions: Vec<CollisionRecord>,
    selected: Option<usize>,
    map_center: LatLng,
    overview_zoom: f64,
    settings: ControllerSettings,
    next_session_id: SessionId,
    detail: Option<DetailSession<M>>,
}

impl<M: MapView> AnalyzerState<M> {
    /// Initial state: whole searchable range, map on the default center.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configured search bounds are
    /// inverted.
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        let bounds = config.search.bounds()?;
        Ok(Self {
            bounds,
            search: bounds,
            collisions: Vec::new(),
            selected: None,
            map_center: config.map.default_center,
            overview_zoom: config.map.overview_zoom,
            settings: ControllerSettings {
                zoom: config.map.detail_zoom,
                marker_radius_m: config.map.marker_radius_m,
                radius_km: config.map.nearby_radius_km,
            },
            next_session_id: 1,
            detail: None,
        })
    }

    #[must_use]
    pub const fn search_range(&self) -> DateTimeRange {
        self.search
    }

    /// Changes the search range, clamped to the searchable bounds. A range
    /// entirely outside the bounds is rejected and the current one kept.
    /// Returns the range now in effect.
    pub fn set_search_range(&mut self, range: DateTimeRange) -> DateTimeRange {
        match range.clamp(&self.bounds) {
            Some(clamped) => {
                if clamped != range {
                    log::debug!(
                        "Search range clamped to {} .. {}",
                        clamped.start(),
                        clamped.end()
                    );
                }
                self.search = clamped;
            }
            None => log::warn!(
                "Search range {} .. {} is outside {} .. {}; keeping current range",
                range.start(),
                range.end(),
                self.bounds.start(),
                self.bounds.end()
            ),
        }
        self.search
    }

    #[must_use]
    pub fn collisions(&self) -> &[CollisionRecord] {
        &self.collisions
    }

    /// Replaces the collision list and clears the selection. A failed fetch
    /// is logged and the previous list kept.
    pub fn apply_collisions(&mut self, result: Result<Vec<CollisionRecord>, ClientError>) -> bool {
        match result {
            Ok(collisions) => {
                self.collisions = collisions;
                self.selected = None;
                true
            }
            Err(e) => {
                log::error!("Error fetching collision data: {e}");
                false
            }
        }
    }

    /// Fetches collisions for the current search range.
    pub async fn search(&mut self, client: &ApiClient) -> bool {
        let result = client.collisions(Some(&self.search)).await;
        self.apply_collisions(result)
    }

    /// Selects the collision at `index` and recentres the map on it.
    pub fn select_collision(&mut self, index: usize) -> Option<&CollisionRecord> {
        let record = self.collisions.get(index)?;
        self.map_center = record.location();
        self.selected = Some(index);
        Some(record)
    }

    /// Closes the collision info window.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    #[must_use]
    pub fn selected_collision(&self) -> Option<&CollisionRecord> {
        self.selected.and_then(|i| self.collisions.get(i))
    }

    #[must_use]
    pub const fn map_viewport(&self) -> Viewport {
        Viewport::new(self.map_center, self.overview_zoom)
    }

    /// Opens the detail view for the selected collision, replacing any
    /// session already open. Returns the new session id, or `None` when no
    /// collision is selected.
    pub fn open_detail(&mut self, observed: M, predicted: M) -> Option<SessionId> {
        let collision = self.selected_collision()?.clone();
        let id = self.next_session_id;
        self.next_session_id += 1;

        if let Some(previous) = self.detail.take() {
            log::debug!("Replacing detail session {}", previous.id());
        }
        log::info!("Opening detail session {id} for {}", collision.title());
        self.detail = Some(DetailSession::new(
            id,
            collision,
            observed,
            predicted,
            self.settings,
        ));
        Some(id)
    }

    pub fn close_detail(&mut self) {
        if let Some(session) = self.detail.take() {
            log::debug!("Closed detail session {}", session.id());
        }
    }

    #[must_use]
    pub const fn detail(&self) -> Option<&DetailSession<M>> {
        self.detail.as_ref()
    }

    pub const fn detail_mut(&mut self) -> Option<&mut DetailSession<M>> {
        self.detail.as_mut()
    }

    /// Delivers a speed-trend response to session `id`. Responses for a
    /// session that has since been closed or replaced are discarded.
    /// Returns whether the response was applied.
    pub fn apply_speed_trends(
        &mut self,
        id: SessionId,
        result: Result<SpeedTrends, ClientError>,
    ) -> bool {
        let Some(session) = self.detail.as_mut().filter(|s| s.id() == id) else {
            log::debug!("Discarding speed trends for closed session {id}");
            return false;
        };
        match result {
            Ok(trends) => {
                session.apply_trends(trends);
                true
            }
            Err(e) => {
                session.fail(&e);
                false
            }
        }
    }

    /// Fetches speed trends for the open session, if any.
    pub async fn load_detail(&mut self, client: &ApiClient) -> bool {
        let Some((id, collision)) = self
            .detail
            .as_ref()
            .map(|s| (s.id(), s.collision().clone()))
        else {
            return false;
        };
        let result = client.speed_trends(&collision).await;
        self.apply_speed_trends(id, result)
    }
}

impl AnalyzerState<HeadlessMap> {
    /// Opens the detail view on two headless maps.
    pub fn open_headless_detail(&mut self) -> Option<SessionId> {
        let blank = HeadlessMap::new(self.map_viewport());
        self.open_detail(blank.clone(), blank)
    }
}
