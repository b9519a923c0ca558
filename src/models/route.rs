//! Walkable routes between a visitor position and a point of interest

use serde::{Deserialize, Serialize};

use crate::geo::{format_distance, format_duration, haversine_distance_m};

use super::Coordinate;

/// How a route was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteSource {
    /// Turn-by-turn route from the external walking-route service
    Resolved,
    /// Straight-line approximation synthesized when the service is unavailable
    DirectLine,
}

/// An ordered path with total distance, duration and textual instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Path geometry in traversal order
    pub geometry: Vec<Coordinate>,
    /// Total distance in meters
    pub distance_m: f64,
    /// Total duration in seconds
    pub duration_s: f64,
    /// One instruction per maneuver, in traversal order
    pub instructions: Vec<String>,
    pub source: RouteSource,
}

impl Route {
    /// Synthesize a two-point straight-line route.
    ///
    /// Distance is the great-circle distance between the endpoints and the
    /// duration assumes a steady walking pace.
    #[must_use]
    pub fn direct_line(origin: Coordinate, destination: Coordinate, walking_speed_ms: f64) -> Self {
        let distance_m = haversine_distance_m(
            origin.latitude,
            origin.longitude,
            destination.latitude,
            destination.longitude,
        );
        let duration_s = if walking_speed_ms > 0.0 {
            distance_m / walking_speed_ms
        } else {
            0.0
        };
        Self {
            geometry: vec![origin, destination],
            distance_m,
            duration_s,
            instructions: vec!["Walk directly toward your destination".to_string()],
            source: RouteSource::DirectLine,
        }
    }

    /// Whether this route is a straight-line approximation rather than a
    /// resolved walking path
    #[must_use]
    pub fn is_approximate(&self) -> bool {
        self.source == RouteSource::DirectLine
    }

    /// Short display summary, e.g. `"1.2km · 14m 17s"`
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} · {}",
            format_distance(self.distance_m),
            format_duration(self.duration_s)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALKING_SPEED_MS: f64 = 1.4;

    fn origin() -> Coordinate {
        Coordinate {
            latitude: 5.589934,
            longitude: -0.116755,
        }
    }

    fn destination() -> Coordinate {
        Coordinate {
            latitude: 5.5902,
            longitude: -0.1171,
        }
    }

    #[test]
    fn test_direct_line_geometry_is_two_points() {
        let route = Route::direct_line(origin(), destination(), WALKING_SPEED_MS);
        assert_eq!(route.geometry, vec![origin(), destination()]);
        assert_eq!(route.source, RouteSource::DirectLine);
        assert!(route.is_approximate());
    }

    #[test]
    fn test_direct_line_duration_matches_walking_speed() {
        let route = Route::direct_line(origin(), destination(), WALKING_SPEED_MS);
        assert!(route.distance_m > 0.0);
        assert!((route.duration_s - route.distance_m / WALKING_SPEED_MS).abs() < 1e-9);
        assert_eq!(route.instructions.len(), 1);
    }

    #[test]
    fn test_summary_formatting() {
        let route = Route {
            geometry: vec![origin(), destination()],
            distance_m: 1234.0,
            duration_s: 125.0,
            instructions: vec![],
            source: RouteSource::Resolved,
        };
        assert_eq!(route.summary(), "1.2km · 2m 5s");
    }
}
