//! `ZooTrail` - Zoo visitor companion navigation backend
//!
//! This library provides the location and navigation subsystem of the zoo
//! companion application: visitor positioning with graceful degradation,
//! walking-route resolution with a direct-line fallback, and marker/route
//! composition over swappable map surfaces.

pub mod api;
pub mod cache;
pub mod config;
pub mod directory;
pub mod error;
pub mod geo;
pub mod location;
pub mod markers;
pub mod models;
pub mod routing;
pub mod surface;
pub mod web;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use config::ZooTrailConfig;
pub use error::ZooTrailError;
pub use geo::{bearing_deg, format_distance, format_duration, haversine_distance_m};
pub use location::{
    FixStore, GeolocationBackend, LocationError, LocationProvider, PermissionStatus,
    SimulatedBackend,
};
pub use markers::{CategoryFilter, MarkerManager};
pub use models::{
    Coordinate, FixOrigin, HealthStatus, LandmarkTable, LocationFix, PoiCategory, PoiLocation,
    PointOfInterest, Route, RouteSource,
};
pub use routing::RouteResolver;
pub use surface::{MapSurface, MapView, StaticSurface, ViewState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ZooTrailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
