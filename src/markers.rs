//! Marker lifecycle management
//!
//! Keeps the set of rendered map markers consistent with the POI dataset and
//! the active category filter. Rebuilds are wholesale: every change removes
//! all markers and recreates the matching set. Dataset sizes are tens of
//! POIs, so the flicker is acceptable and there is no incremental diffing
//! to get wrong.

use std::sync::Arc;

use crate::models::{HealthStatus, LandmarkTable, PoiCategory, PointOfInterest};
use crate::surface::{MapSurface, RenderError};

/// Category filter applied to the POI dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(PoiCategory),
}

impl CategoryFilter {
    #[must_use]
    pub fn matches(&self, category: PoiCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(only) => *only == category,
        }
    }

    /// Parse `"all"` or a category name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s == "all" {
            return Some(CategoryFilter::All);
        }
        PoiCategory::parse(s).map(CategoryFilter::Only)
    }
}

/// Visual state of a marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStyle {
    /// Category color
    pub color: &'static str,
    /// Highlight ring for the selected POI
    pub selected: bool,
    /// Health-status dot color, animals only
    pub health_dot: Option<&'static str>,
}

/// A marker as handed to the map surface
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub poi_id: String,
    pub name: String,
    pub coordinate: crate::models::Coordinate,
    pub style: MarkerStyle,
}

fn category_color(category: PoiCategory) -> &'static str {
    match category {
        PoiCategory::Animal => "#2e7d32",
        PoiCategory::Event => "#7b1fa2",
        PoiCategory::Facility => "#1565c0",
    }
}

fn health_color(health: HealthStatus) -> &'static str {
    match health {
        HealthStatus::Healthy => "#43a047",
        HealthStatus::Recovering => "#ffb300",
        HealthStatus::Critical => "#e53935",
    }
}

/// Result of a marker rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Markers now on the surface
    pub rendered: usize,
    /// POIs skipped because their symbolic location did not resolve
    pub skipped_unresolved: usize,
}

type SelectionHandler = Box<dyn Fn(&str) + Send + Sync>;

/// Owns the rendered-marker set for one map surface
pub struct MarkerManager {
    landmarks: Arc<LandmarkTable>,
    rendered: Vec<String>,
    on_select: Option<SelectionHandler>,
}

impl MarkerManager {
    #[must_use]
    pub fn new(landmarks: Arc<LandmarkTable>) -> Self {
        Self {
            landmarks,
            rendered: Vec::new(),
            on_select: None,
        }
    }

    #[must_use]
    pub fn landmarks(&self) -> &LandmarkTable {
        &self.landmarks
    }

    /// Register the callback invoked when a marker is clicked
    pub fn set_selection_handler(&mut self, handler: impl Fn(&str) + Send + Sync + 'static) {
        self.on_select = Some(Box::new(handler));
    }

    /// Forward a marker click to the selection callback. Selection state
    /// lives one level up, in the map composition.
    pub fn handle_click(&self, poi_id: &str) {
        if let Some(handler) = &self.on_select {
            handler(poi_id);
        }
    }

    /// Rebuild the marker set: remove everything currently rendered, then
    /// add one marker per POI matching the filter.
    pub fn sync(
        &mut self,
        surface: &mut dyn MapSurface,
        pois: &[PointOfInterest],
        filter: &CategoryFilter,
        selected: Option<&str>,
    ) -> Result<SyncOutcome, RenderError> {
        self.clear(surface)?;

        let mut skipped_unresolved = 0;
        for poi in pois.iter().filter(|p| filter.matches(p.category)) {
            let Some(coordinate) = self.landmarks.resolve(&poi.location) else {
                tracing::warn!(poi = %poi.id, "skipping POI with unresolved location");
                skipped_unresolved += 1;
                continue;
            };

            let marker = Marker {
                poi_id: poi.id.clone(),
                name: poi.name.clone(),
                coordinate,
                style: MarkerStyle {
                    color: category_color(poi.category),
                    selected: selected == Some(poi.id.as_str()),
                    health_dot: poi.health.map(health_color),
                },
            };
            surface.add_marker(&marker)?;
            self.rendered.push(poi.id.clone());
        }

        Ok(SyncOutcome {
            rendered: self.rendered.len(),
            skipped_unresolved,
        })
    }

    /// Remove every marker this manager has rendered
    pub fn clear(&mut self, surface: &mut dyn MapSurface) -> Result<(), RenderError> {
        for poi_id in self.rendered.drain(..) {
            surface.remove_marker(&poi_id)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn rendered_count(&self) -> usize {
        self.rendered.len()
    }
}
