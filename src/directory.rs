//! Seeded zoo directory data
//!
//! The POI dataset and landmark table are owned by the directory service;
//! the navigation subsystem treats them as read-only input. This module
//! ships the embedded seed used by the companion API and the demo flow.

use std::sync::LazyLock;

use serde::Deserialize;

use crate::models::{Coordinate, LandmarkTable, PointOfInterest};

const SEED: &str = include_str!("zoo_seed.json");

#[derive(Debug, Deserialize)]
struct SeedLandmark {
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    landmarks: Vec<SeedLandmark>,
    pois: Vec<PointOfInterest>,
}

static SEED_FILE: LazyLock<SeedFile> =
    LazyLock::new(|| serde_json::from_str(SEED).expect("embedded seed data is valid JSON"));

/// Landmark lookup table for POIs whose location is a symbolic name
#[must_use]
pub fn landmark_table() -> LandmarkTable {
    SEED_FILE
        .landmarks
        .iter()
        .map(|l| {
            (
                l.name.clone(),
                Coordinate {
                    latitude: l.latitude,
                    longitude: l.longitude,
                },
            )
        })
        .collect()
}

/// The seeded POI dataset
#[must_use]
pub fn seed_pois() -> Vec<PointOfInterest> {
    SEED_FILE.pois.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PoiCategory;

    #[test]
    fn test_every_seeded_poi_resolves() {
        let table = landmark_table();
        for poi in seed_pois() {
            assert!(
                table.resolve(&poi.location).is_some(),
                "POI '{}' does not resolve",
                poi.id
            );
        }
    }

    #[test]
    fn test_seed_covers_all_categories() {
        let pois = seed_pois();
        for category in [PoiCategory::Animal, PoiCategory::Event, PoiCategory::Facility] {
            assert!(pois.iter().any(|p| p.category == category));
        }
    }

    #[test]
    fn test_seed_ids_are_unique() {
        let pois = seed_pois();
        let mut ids: Vec<_> = pois.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), pois.len());
    }

    #[test]
    fn test_animals_carry_health_status() {
        for poi in seed_pois() {
            if poi.category == PoiCategory::Animal {
                assert!(poi.health.is_some(), "animal '{}' has no health", poi.id);
            }
        }
    }
}
