//! Companion HTTP API
//!
//! Serves the POI directory and walking-route resolution to the visitor
//! app. Route requests carry the device position as query parameters; the
//! response always contains a usable route, flagged approximate when the
//! routing service was unavailable.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use crate::geo::{bearing_deg, format_distance, format_duration};
use crate::markers::CategoryFilter;
use crate::models::{Coordinate, LandmarkTable, PointOfInterest, Route};
use crate::routing::RouteResolver;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RouteResolver>,
    pub pois: Arc<Vec<PointOfInterest>>,
    pub landmarks: Arc<LandmarkTable>,
    pub default_center: Coordinate,
}

#[derive(Serialize, Deserialize)]
pub struct ApiPoi {
    pub id: String,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub health: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ApiRoute {
    pub distance_m: f64,
    pub duration_s: f64,
    pub distance_text: String,
    pub duration_text: String,
    /// True when the route is a straight-line approximation
    pub approximate: bool,
    pub bearing_deg: f64,
    pub instructions: Vec<String>,
    /// Path as (latitude, longitude) pairs
    pub geometry: Vec<[f64; 2]>,
}

impl ApiRoute {
    fn from_route(route: &Route, origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            distance_m: route.distance_m,
            duration_s: route.duration_s,
            distance_text: format_distance(route.distance_m),
            duration_text: format_duration(route.duration_s),
            approximate: route.is_approximate(),
            bearing_deg: bearing_deg(
                origin.latitude,
                origin.longitude,
                destination.latitude,
                destination.longitude,
            ),
            instructions: route.instructions.clone(),
            geometry: route
                .geometry
                .iter()
                .map(|c| [c.latitude, c.longitude])
                .collect(),
        }
    }
}

#[derive(Deserialize)]
pub struct PoiQuery {
    /// Category name or "all"
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct RouteQuery {
    /// Device latitude; omitted when the visitor has no fix
    pub from_lat: Option<f64>,
    /// Device longitude; omitted when the visitor has no fix
    pub from_lon: Option<f64>,
    /// Destination POI id
    pub to: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/pois", get(get_pois))
        .route("/route", get(get_route))
        .with_state(state)
}

async fn get_pois(
    State(state): State<AppState>,
    Query(query): Query<PoiQuery>,
) -> Result<Json<Vec<ApiPoi>>, StatusCode> {
    let filter = match query.category.as_deref() {
        None => CategoryFilter::All,
        Some(s) => CategoryFilter::parse(s).ok_or(StatusCode::BAD_REQUEST)?,
    };

    let pois: Vec<ApiPoi> = state
        .pois
        .iter()
        .filter(|poi| filter.matches(poi.category))
        .filter_map(|poi| {
            let coordinate = state.landmarks.resolve(&poi.location)?;
            Some(ApiPoi {
                id: poi.id.clone(),
                name: poi.name.clone(),
                category: poi.category.as_str().to_string(),
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
                health: poi.health.map(|h| {
                    match h {
                        crate::models::HealthStatus::Healthy => "healthy",
                        crate::models::HealthStatus::Recovering => "recovering",
                        crate::models::HealthStatus::Critical => "critical",
                    }
                    .to_string()
                }),
            })
        })
        .collect();

    Ok(Json(pois))
}

async fn get_route(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<ApiRoute>, StatusCode> {
    // Without a device fix the route starts from the default center
    let origin = match (query.from_lat, query.from_lon) {
        (Some(lat), Some(lon)) => {
            Coordinate::new(lat, lon).map_err(|_| StatusCode::BAD_REQUEST)?
        }
        _ => state.default_center,
    };

    let poi = state
        .pois
        .iter()
        .find(|p| p.id == query.to)
        .ok_or(StatusCode::NOT_FOUND)?;
    let destination = state
        .landmarks
        .resolve(&poi.location)
        .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;

    let route = state.resolver.resolve_route(origin, destination).await;
    Ok(Json(ApiRoute::from_route(&route, origin, destination)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::haversine_distance_m;
    use crate::models::RouteSource;

    #[test]
    fn test_api_route_projection() {
        let origin = Coordinate {
            latitude: 5.589934,
            longitude: -0.116755,
        };
        let destination = Coordinate {
            latitude: 5.590623,
            longitude: -0.117204,
        };
        let route = Route::direct_line(origin, destination, 1.4);
        let api = ApiRoute::from_route(&route, origin, destination);

        assert!(api.approximate);
        assert_eq!(api.geometry.len(), 2);
        assert_eq!(api.geometry[0], [origin.latitude, origin.longitude]);
        assert!((0.0..360.0).contains(&api.bearing_deg));
        assert!(!api.distance_text.is_empty());
        assert_eq!(api.instructions.len(), 1);
        assert_eq!(route.source, RouteSource::DirectLine);
    }

    #[test]
    fn test_distance_sanity_for_projection() {
        let origin = Coordinate {
            latitude: 5.589934,
            longitude: -0.116755,
        };
        let destination = Coordinate {
            latitude: 5.590623,
            longitude: -0.117204,
        };
        let d = haversine_distance_m(
            origin.latitude,
            origin.longitude,
            destination.latitude,
            destination.longitude,
        );
        // Entrance to aviary is a short walk, not kilometers
        assert!(d > 30.0 && d < 300.0, "got {d}");
    }
}
