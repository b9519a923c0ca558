//! Geographic coordinates and captured location fixes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ZooTrailError;

/// A geographic point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, validating the latitude/longitude ranges
    pub fn new(latitude: f64, longitude: f64) -> crate::Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ZooTrailError::validation(format!(
                "latitude {latitude} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ZooTrailError::validation(format!(
                "longitude {longitude} out of range [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Format coordinate as a display string
    #[must_use]
    pub fn format(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }
}

/// Where a location fix came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixOrigin {
    /// Fresh reading from the device's location sensor
    Live,
    /// Last-known reading recovered from memory or the durable store
    Cached,
    /// Hardcoded fallback position (e.g. the zoo entrance)
    Default,
}

/// A single captured device-location reading.
///
/// Immutable once captured; a new reading produces a new fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    /// Reported horizontal accuracy in meters, when the platform provides it
    pub accuracy_m: Option<f64>,
    pub captured_at: DateTime<Utc>,
    pub origin: FixOrigin,
}

impl LocationFix {
    /// A fix freshly captured from the location sensor
    #[must_use]
    pub fn live(coordinate: Coordinate, accuracy_m: Option<f64>, captured_at: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            accuracy_m,
            captured_at,
            origin: FixOrigin::Live,
        }
    }

    /// A fallback fix at a well-known default position
    #[must_use]
    pub fn fallback(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            accuracy_m: None,
            captured_at: Utc::now(),
            origin: FixOrigin::Default,
        }
    }

    /// The same reading re-tagged with a different origin
    #[must_use]
    pub fn with_origin(mut self, origin: FixOrigin) -> Self {
        self.origin = origin;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(5.589934, -0.116755).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(-90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, 180.5).is_err());
    }

    #[test]
    fn test_coordinate_rounding() {
        let c = Coordinate {
            latitude: 5.589_934,
            longitude: -0.116_755,
        };
        let (lat, lon) = c.rounded(2);
        assert_eq!(lat, 5.59);
        assert_eq!(lon, -0.12);
    }

    #[test]
    fn test_fix_origin_retag() {
        let c = Coordinate {
            latitude: 5.59,
            longitude: -0.12,
        };
        let fix = LocationFix::live(c, Some(8.0), Utc::now());
        assert_eq!(fix.origin, FixOrigin::Live);
        let cached = fix.with_origin(FixOrigin::Cached);
        assert_eq!(cached.origin, FixOrigin::Cached);
        assert_eq!(cached.coordinate, c);
    }
}
