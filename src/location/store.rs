//! Durable last-known-location store
//!
//! A single key in the persistent cache holds the most recent fix so a cold
//! start (or a failed fetch) can recover an approximate position.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::PersistentCache;
use crate::models::{FixOrigin, LocationFix};
use crate::Result;

const LAST_FIX_KEY: &str = "location:last_fix";

/// Readings older than a week are not worth recovering
const LAST_FIX_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone)]
pub struct FixStore {
    cache: Arc<PersistentCache>,
}

impl FixStore {
    #[must_use]
    pub fn new(cache: Arc<PersistentCache>) -> Self {
        Self { cache }
    }

    /// Persist the latest fix, replacing any previous one
    pub async fn save(&self, fix: &LocationFix) -> Result<()> {
        self.cache.put(LAST_FIX_KEY, fix.clone(), LAST_FIX_TTL).await
    }

    /// Recover the persisted fix, re-tagged as cached
    pub async fn load(&self) -> Result<Option<LocationFix>> {
        let fix: Option<LocationFix> = self.cache.get(LAST_FIX_KEY).await?;
        Ok(fix.map(|f| f.with_origin(FixOrigin::Cached)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use chrono::Utc;
    use rand::Rng;

    fn temp_store() -> FixStore {
        let suffix: u64 = rand::rng().random();
        let path = std::env::temp_dir().join(format!("zootrail-fixstore-test-{suffix}"));
        FixStore::new(Arc::new(PersistentCache::open(path).unwrap()))
    }

    #[tokio::test]
    async fn test_empty_store_loads_none() {
        let store = temp_store();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_saved_fix_loads_as_cached() {
        let store = temp_store();
        let fix = LocationFix::live(
            Coordinate {
                latitude: 5.589934,
                longitude: -0.116755,
            },
            Some(12.0),
            Utc::now(),
        );
        store.save(&fix).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.coordinate, fix.coordinate);
        assert_eq!(loaded.origin, FixOrigin::Cached);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_fix() {
        let store = temp_store();
        let older = LocationFix::live(
            Coordinate {
                latitude: 5.58,
                longitude: -0.11,
            },
            None,
            Utc::now(),
        );
        let newer = LocationFix::live(
            Coordinate {
                latitude: 5.60,
                longitude: -0.12,
            },
            None,
            Utc::now(),
        );
        store.save(&older).await.unwrap();
        store.save(&newer).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.coordinate, newer.coordinate);
    }
}
