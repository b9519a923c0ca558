//! Data models for the ZooTrail application
//!
//! This module contains the core domain models organized by concern:
//! - Coordinate: Geographic coordinates and captured location fixes
//! - Poi: Points of interest shown on the map and their location variants
//! - Route: Walkable paths with distance, duration and instructions

pub mod coordinate;
pub mod poi;
pub mod route;

// Re-export all public types for convenient access
pub use coordinate::{Coordinate, FixOrigin, LocationFix};
pub use poi::{HealthStatus, LandmarkTable, PoiCategory, PoiLocation, PointOfInterest};
pub use route::{Route, RouteSource};
