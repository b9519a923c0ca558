//! Great-circle distance, bearing, and display formatting helpers
//!
//! Pure functions shared by the route resolver, the marker manager, and the
//! web API responses.

use haversine::{distance, Location as SpherePoint, Units};

/// Great-circle distance between two points in meters.
#[must_use]
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let from = SpherePoint {
        latitude: lat1,
        longitude: lon1,
    };
    let to = SpherePoint {
        latitude: lat2,
        longitude: lon2,
    };
    distance(from, to, Units::Kilometers) * 1000.0
}

/// Initial bearing (forward azimuth) from the first point toward the second,
/// in compass degrees `[0, 360)`.
#[must_use]
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    (y.atan2(x).to_degrees() + 360.0).rem_euclid(360.0)
}

/// Format a distance for display: meters below 1km, kilometers above.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0}m", meters)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}

/// Format a duration for display, e.g. `125` -> `"2m 5s"`.
/// Values under a minute show seconds only.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    if total < 60 {
        format!("{total}s")
    } else {
        format!("{}m {}s", total / 60, total % 60)
    }
}
