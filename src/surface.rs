//! Map surface composition
//!
//! One `MapSurface` capability covers every rendering backend; the view
//! logic for locating, tracking, marker sync, and route display is written
//! once against it. `StaticSurface` is both the offline/degraded fallback
//! view and the backend used in tests.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::geo::{format_distance, format_duration};
use crate::location::{LocationError, LocationProvider, SubscriptionId};
use crate::markers::{CategoryFilter, Marker, MarkerManager};
use crate::models::{Coordinate, LocationFix, PointOfInterest, Route};
use crate::routing::RouteResolver;
use crate::ZooTrailError;

/// A rendering backend failed; the view substitutes a static fallback
#[derive(Error, Debug, Clone)]
#[error("Render failed: {message}")]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Rendering capability required of a map backend.
///
/// Marker and route operations are only invoked once `is_ready` reports
/// true; backends signal readiness after their tile layer has loaded.
pub trait MapSurface: Send {
    /// Begin loading the surface (tiles, styles)
    fn mount(&mut self) -> Result<(), RenderError>;

    fn is_ready(&self) -> bool;

    fn add_marker(&mut self, marker: &Marker) -> Result<(), RenderError>;

    fn remove_marker(&mut self, poi_id: &str) -> Result<(), RenderError>;

    /// Draw or move the pulsing user-location marker
    fn draw_user_marker(&mut self, fix: &LocationFix) -> Result<(), RenderError>;

    /// Draw the route path, replacing any previous one
    fn draw_route(&mut self, route: &Route) -> Result<(), RenderError>;

    fn clear_route(&mut self) -> Result<(), RenderError>;

    /// Fly the viewport to the given center and zoom
    fn fly_to(&mut self, center: Coordinate, zoom: f64) -> Result<(), RenderError>;
}

#[derive(Default)]
struct StaticSurfaceInner {
    ready: bool,
    markers: Vec<Marker>,
    user: Option<LocationFix>,
    route: Option<Route>,
    viewport: Option<(Coordinate, f64)>,
}

/// Text-only surface: the degraded fallback view when a rendering backend
/// fails, and the backend the test suite observes.
///
/// Clones share state, so a test can keep a probe while the view owns the
/// surface.
#[derive(Clone, Default)]
pub struct StaticSurface {
    inner: Arc<Mutex<StaticSurfaceInner>>,
}

impl StaticSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.inner.lock().unwrap().markers.len()
    }

    #[must_use]
    pub fn has_marker(&self, poi_id: &str) -> bool {
        self.marker(poi_id).is_some()
    }

    #[must_use]
    pub fn marker(&self, poi_id: &str) -> Option<Marker> {
        self.inner
            .lock()
            .unwrap()
            .markers
            .iter()
            .find(|m| m.poi_id == poi_id)
            .cloned()
    }

    #[must_use]
    pub fn route(&self) -> Option<Route> {
        self.inner.lock().unwrap().route.clone()
    }

    #[must_use]
    pub fn user_fix(&self) -> Option<LocationFix> {
        self.inner.lock().unwrap().user.clone()
    }

    #[must_use]
    pub fn viewport(&self) -> Option<(Coordinate, f64)> {
        self.inner.lock().unwrap().viewport
    }

    /// Render the placeholder list view
    #[must_use]
    pub fn render_text(&self) -> String {
        let inner = self.inner.lock().unwrap();
        let mut out = String::from("Map unavailable, showing nearby points:\n");
        if let Some(user) = &inner.user {
            out.push_str(&format!("You are at {}\n", user.coordinate.format()));
        }
        for marker in &inner.markers {
            out.push_str(&format!(
                "• {} ({})\n",
                marker.name,
                marker.coordinate.format()
            ));
        }
        if let Some(route) = &inner.route {
            out.push_str(&format!(
                "Route: {} / {}\n",
                format_distance(route.distance_m),
                format_duration(route.duration_s)
            ));
        }
        out
    }
}

impl MapSurface for StaticSurface {
    fn mount(&mut self) -> Result<(), RenderError> {
        self.inner.lock().unwrap().ready = true;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.inner.lock().unwrap().ready
    }

    fn add_marker(&mut self, marker: &Marker) -> Result<(), RenderError> {
        self.inner.lock().unwrap().markers.push(marker.clone());
        Ok(())
    }

    fn remove_marker(&mut self, poi_id: &str) -> Result<(), RenderError> {
        self.inner
            .lock()
            .unwrap()
            .markers
            .retain(|m| m.poi_id != poi_id);
        Ok(())
    }

    fn draw_user_marker(&mut self, fix: &LocationFix) -> Result<(), RenderError> {
        self.inner.lock().unwrap().user = Some(fix.clone());
        Ok(())
    }

    fn draw_route(&mut self, route: &Route) -> Result<(), RenderError> {
        self.inner.lock().unwrap().route = Some(route.clone());
        Ok(())
    }

    fn clear_route(&mut self) -> Result<(), RenderError> {
        self.inner.lock().unwrap().route = None;
        Ok(())
    }

    fn fly_to(&mut self, center: Coordinate, zoom: f64) -> Result<(), RenderError> {
        self.inner.lock().unwrap().viewport = Some((center, zoom));
        Ok(())
    }
}

/// View lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Locating,
    Located,
    Tracking,
    Error,
}

/// Composes the location provider, route resolver, and marker manager over
/// one map surface.
pub struct MapView {
    surface: Box<dyn MapSurface>,
    markers: MarkerManager,
    provider: Arc<LocationProvider>,
    resolver: Arc<RouteResolver>,
    state: ViewState,
    last_error: Option<LocationError>,
    default_center: Coordinate,
    default_zoom: f64,
    pois: Vec<PointOfInterest>,
    filter: CategoryFilter,
    selected: Option<String>,
    /// A sync was requested before the surface reported ready
    pending_sync: bool,
    /// Newest tracked fix awaiting the next refresh tick
    latest_fix: Arc<Mutex<Option<LocationFix>>>,
    subscription: Option<SubscriptionId>,
}

impl MapView {
    #[must_use]
    pub fn new(
        surface: Box<dyn MapSurface>,
        markers: MarkerManager,
        provider: Arc<LocationProvider>,
        resolver: Arc<RouteResolver>,
        default_center: Coordinate,
        default_zoom: f64,
    ) -> Self {
        Self {
            surface,
            markers,
            provider,
            resolver,
            state: ViewState::Idle,
            last_error: None,
            default_center,
            default_zoom,
            pois: Vec::new(),
            filter: CategoryFilter::All,
            selected: None,
            pending_sync: false,
            latest_fix: Arc::new(Mutex::new(None)),
            subscription: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> ViewState {
        self.state
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&LocationError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The marker manager, e.g. to register a click handler
    #[must_use]
    pub fn markers(&self) -> &MarkerManager {
        &self.markers
    }

    pub fn markers_mut(&mut self) -> &mut MarkerManager {
        &mut self.markers
    }

    /// Mount the surface. A backend that fails to mount is replaced with
    /// the static fallback view instead of crashing the screen.
    pub fn mount(&mut self) {
        if let Err(e) = self.surface.mount() {
            tracing::error!("map surface failed to mount: {e}");
            self.degrade_to_static();
        }
        if self.surface.is_ready() {
            self.flush_pending();
        }
    }

    /// Called by the embedding layer when the surface reports tile load
    /// complete. Applies any sync requested while loading.
    pub fn on_surface_ready(&mut self) {
        self.flush_pending();
    }

    /// Replace the POI dataset and rebuild markers
    pub fn set_pois(&mut self, pois: Vec<PointOfInterest>) {
        self.pois = pois;
        self.resync_markers();
    }

    /// Change the category filter and rebuild markers
    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
        self.resync_markers();
    }

    /// Obtain an initial position, falling back to the last-known or the
    /// default location. The returned fix's origin tells the caller whether
    /// a "using default location" notice is warranted.
    pub async fn locate(&mut self) -> LocationFix {
        self.state = ViewState::Locating;
        self.last_error = None;
        let _ = self.provider.request_permission().await;

        match self.provider.current_fix().await {
            Ok(fix) => {
                self.state = ViewState::Located;
                self.draw_user(&fix);
                fix
            }
            Err(e) => {
                tracing::warn!(code = e.code(), "locate failed: {e}");
                self.last_error = Some(e);
                self.state = ViewState::Error;
                let fallback = match self.provider.last_known_fix().await {
                    Some(fix) => fix,
                    None => LocationFix::fallback(self.default_center),
                };
                self.draw_user(&fallback);
                fallback
            }
        }
    }

    /// Retry after a location failure; only meaningful from the error state
    pub async fn retry(&mut self) -> Option<LocationFix> {
        if self.state == ViewState::Error {
            Some(self.locate().await)
        } else {
            None
        }
    }

    /// Begin continuous tracking of the user marker
    pub async fn start_tracking(&mut self) -> Result<(), LocationError> {
        self.provider.start_tracking().await?;
        if self.subscription.is_none() {
            let latest = Arc::clone(&self.latest_fix);
            let id = self.provider.subscribe(move |fix| {
                *latest.lock().unwrap() = Some(fix.clone());
            });
            self.subscription = Some(id);
        }
        self.state = ViewState::Tracking;
        Ok(())
    }

    pub async fn stop_tracking(&mut self) {
        self.provider.stop_tracking().await;
        if let Some(id) = self.subscription.take() {
            self.provider.unsubscribe(id);
        }
        if self.state == ViewState::Tracking {
            self.state = ViewState::Located;
        }
    }

    /// Draw the newest tracked fix, if one arrived since the last tick.
    /// Called by the embedding layer on each UI tick.
    pub fn refresh_user_marker(&mut self) {
        let fix = self.latest_fix.lock().unwrap().take();
        if let Some(fix) = fix {
            self.draw_user(&fix);
        }
    }

    /// Select a destination POI: highlight its marker and draw a route to
    /// it from the current (best-effort) position.
    pub async fn select_destination(&mut self, poi_id: &str) -> crate::Result<Route> {
        let poi = self
            .pois
            .iter()
            .find(|p| p.id == poi_id)
            .ok_or_else(|| ZooTrailError::validation(format!("unknown POI id: {poi_id}")))?;
        let destination = self.markers.landmarks().resolve(&poi.location).ok_or_else(|| {
            ZooTrailError::validation(format!("POI '{}' has no resolvable location", poi.name))
        })?;

        self.selected = Some(poi_id.to_string());
        self.resync_markers();

        let origin = self.provider.best_effort_fix(self.default_center).await;
        let route = self
            .resolver
            .resolve_route(origin.coordinate, destination)
            .await;

        // A selection made while resolving supersedes this route
        if self.selected.as_deref() == Some(poi_id) {
            if route.is_approximate() {
                tracing::info!("walking route unavailable; showing direct line");
            }
            self.draw_route(&route);
        }
        Ok(route)
    }

    /// Drop the selection and its route overlay
    pub fn clear_selection(&mut self) {
        self.selected = None;
        if self.surface.is_ready() {
            if let Err(e) = self.surface.clear_route() {
                tracing::warn!("failed to clear route: {e}");
            }
        }
        self.resync_markers();
    }

    /// Fly the viewport back to the default center and zoom
    pub fn recenter(&mut self) {
        if let Err(e) = self.surface.fly_to(self.default_center, self.default_zoom) {
            tracing::warn!("recenter failed: {e}");
            self.degrade_to_static();
        }
    }

    fn flush_pending(&mut self) {
        if self.pending_sync {
            self.pending_sync = false;
            self.resync_markers();
        }
    }

    fn resync_markers(&mut self) {
        if !self.surface.is_ready() {
            self.pending_sync = true;
            return;
        }
        let result = self.markers.sync(
            self.surface.as_mut(),
            &self.pois,
            &self.filter,
            self.selected.as_deref(),
        );
        if let Err(e) = result {
            tracing::error!("marker sync failed: {e}");
            self.degrade_to_static();
            // The fallback surface accepts every draw call
            let _ = self.markers.sync(
                self.surface.as_mut(),
                &self.pois,
                &self.filter,
                self.selected.as_deref(),
            );
        }
    }

    fn draw_user(&mut self, fix: &LocationFix) {
        if !self.surface.is_ready() {
            return;
        }
        if let Err(e) = self.surface.draw_user_marker(fix) {
            tracing::warn!("failed to draw user marker: {e}");
        }
    }

    fn draw_route(&mut self, route: &Route) {
        if !self.surface.is_ready() {
            return;
        }
        if let Err(e) = self.surface.draw_route(route) {
            tracing::warn!("failed to draw route: {e}");
        }
    }

    /// Swap the backend for the static fallback view
    fn degrade_to_static(&mut self) {
        let mut fallback = StaticSurface::new();
        let _ = fallback.mount();
        self.surface = Box::new(fallback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_surface_ready_after_mount() {
        let mut surface = StaticSurface::new();
        assert!(!surface.is_ready());
        surface.mount().unwrap();
        assert!(surface.is_ready());
    }

    #[test]
    fn test_static_surface_clones_share_state() {
        let mut surface = StaticSurface::new();
        let probe = surface.clone();
        surface.mount().unwrap();
        surface
            .fly_to(
                Coordinate {
                    latitude: 5.589934,
                    longitude: -0.116755,
                },
                17.0,
            )
            .unwrap();
        assert!(probe.is_ready());
        assert_eq!(probe.viewport().unwrap().1, 17.0);
    }

    #[test]
    fn test_render_text_lists_markers_and_route() {
        let mut surface = StaticSurface::new();
        surface.mount().unwrap();
        surface
            .add_marker(&Marker {
                poi_id: "lion".to_string(),
                name: "African Lion".to_string(),
                coordinate: Coordinate {
                    latitude: 5.59,
                    longitude: -0.117,
                },
                style: crate::markers::MarkerStyle {
                    color: "#2e7d32",
                    selected: false,
                    health_dot: None,
                },
            })
            .unwrap();
        surface
            .draw_route(&Route::direct_line(
                Coordinate {
                    latitude: 5.589934,
                    longitude: -0.116755,
                },
                Coordinate {
                    latitude: 5.59,
                    longitude: -0.117,
                },
                1.4,
            ))
            .unwrap();

        let text = surface.render_text();
        assert!(text.contains("African Lion"));
        assert!(text.contains("Route:"));
    }
}
