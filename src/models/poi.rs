//! Points of interest and landmark name resolution
//!
//! POIs are read-only input owned by the directory data service; the
//! navigation subsystem renders them as markers and routes toward them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Marker category of a point of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiCategory {
    Animal,
    Event,
    Facility,
}

impl PoiCategory {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PoiCategory::Animal => "animal",
            PoiCategory::Event => "event",
            PoiCategory::Facility => "facility",
        }
    }

    /// Parse a category from its lowercase name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "animal" => Some(PoiCategory::Animal),
            "event" => Some(PoiCategory::Event),
            "facility" => Some(PoiCategory::Facility),
            _ => None,
        }
    }
}

/// Health status of an animal, used only for marker styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Recovering,
    Critical,
}

/// A POI location is either an explicit coordinate or a symbolic landmark
/// name that must be resolved against the landmark table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PoiLocation {
    Coordinate(Coordinate),
    Named(String),
}

/// Any mappable entity (animal, event, facility) shown as a marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    pub location: PoiLocation,
    pub category: PoiCategory,
    /// Present for animals only
    pub health: Option<HealthStatus>,
}

impl PointOfInterest {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        location: PoiLocation,
        category: PoiCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location,
            category,
            health: None,
        }
    }

    #[must_use]
    pub fn with_health(mut self, health: HealthStatus) -> Self {
        self.health = Some(health);
        self
    }
}

/// Lookup table mapping symbolic landmark names to coordinates.
///
/// Resolution fails explicitly (`None`) when a name is unknown; callers
/// decide how to surface an unresolved POI.
#[derive(Debug, Clone, Default)]
pub struct LandmarkTable {
    entries: HashMap<String, Coordinate>,
}

impl LandmarkTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, coordinate: Coordinate) {
        self.entries.insert(name.into(), coordinate);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a POI location to a concrete coordinate
    #[must_use]
    pub fn resolve(&self, location: &PoiLocation) -> Option<Coordinate> {
        match location {
            PoiLocation::Coordinate(c) => Some(*c),
            PoiLocation::Named(name) => self.entries.get(name).copied(),
        }
    }
}

impl FromIterator<(String, Coordinate)> for LandmarkTable {
    fn from_iter<I: IntoIterator<Item = (String, Coordinate)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LandmarkTable {
        let mut t = LandmarkTable::new();
        t.insert(
            "Aviary",
            Coordinate {
                latitude: 5.5902,
                longitude: -0.1171,
            },
        );
        t
    }

    #[test]
    fn test_resolve_explicit_coordinate() {
        let t = table();
        let c = Coordinate {
            latitude: 5.59,
            longitude: -0.12,
        };
        assert_eq!(t.resolve(&PoiLocation::Coordinate(c)), Some(c));
    }

    #[test]
    fn test_resolve_known_name() {
        let t = table();
        let resolved = t.resolve(&PoiLocation::Named("Aviary".to_string()));
        assert!(resolved.is_some());
        assert_eq!(resolved.unwrap().latitude, 5.5902);
    }

    #[test]
    fn test_resolve_unknown_name_is_explicit_failure() {
        let t = table();
        assert_eq!(t.resolve(&PoiLocation::Named("Unknown Hall".to_string())), None);
    }

    #[test]
    fn test_category_parse_roundtrip() {
        for cat in [PoiCategory::Animal, PoiCategory::Event, PoiCategory::Facility] {
            assert_eq!(PoiCategory::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(PoiCategory::parse("gift-shop"), None);
    }
}
