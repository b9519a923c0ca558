//! Durable key/value cache with per-entry TTL
//!
//! Backs the last-known-location store and the resolved-route cache. One
//! instance is opened at startup and shared by injection; values are
//! serialized with postcard.

use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::task;

use crate::{Result, ZooTrailError};

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

pub struct PersistentCache {
    // Keyspace must outlive the partition handle
    _keyspace: Keyspace,
    store: PartitionHandle,
}

fn get_from_store(store: &PartitionHandle, key: &[u8]) -> Result<Option<Vec<u8>>> {
    let value = store
        .get(key)
        .map_err(|e| ZooTrailError::cache(format!("read failed: {e}")))?;
    Ok(value.map(|v| v.to_vec()))
}

impl PersistentCache {
    /// Open (or create) the cache at the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let keyspace = Config::new(path.as_ref())
            .open()
            .map_err(|e| ZooTrailError::cache(format!("failed to open cache database: {e}")))?;
        let store = keyspace
            .open_partition("cache", PartitionCreateOptions::default())
            .map_err(|e| ZooTrailError::cache(format!("failed to open cache partition: {e}")))?;
        Ok(PersistentCache {
            _keyspace: keyspace,
            store,
        })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or_else(|| ZooTrailError::cache("TTL overflow"))?
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ZooTrailError::cache(e.to_string()))?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes =
            postcard::to_stdvec(&entry).map_err(|e| ZooTrailError::cache(e.to_string()))?;

        task::spawn_blocking(move || {
            store
                .insert(key, bytes)
                .map_err(|e| ZooTrailError::cache(format!("write failed: {e}")))
        })
        .await
        .map_err(|e| ZooTrailError::cache(e.to_string()))??;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(&store, &key_bytes))
                .await
                .map_err(|e| ZooTrailError::cache(e.to_string()))??;

        if let Some(bytes) = maybe_bytes {
            let entry: StoredEntry<T> =
                postcard::from_bytes(&bytes).map_err(|e| ZooTrailError::cache(e.to_string()))?;
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|e| ZooTrailError::cache(e.to_string()))?
                .as_secs();

            if now < entry.expires_at {
                tracing::debug!("Key found and still fresh");
                Ok(Some(entry.value))
            } else {
                tracing::debug!("Key found but expired");
                self.remove(key).await?;
                Ok(None)
            }
        } else {
            tracing::debug!("Key not found");
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || {
            store
                .remove(key)
                .map_err(|e| ZooTrailError::cache(format!("remove failed: {e}")))
        })
        .await
        .map_err(|e| ZooTrailError::cache(e.to_string()))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn temp_cache() -> PersistentCache {
        let suffix: u64 = rand::rng().random();
        let path = std::env::temp_dir().join(format!("zootrail-cache-test-{suffix}"));
        PersistentCache::open(path).expect("open temp cache")
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let cache = temp_cache();
        cache
            .put("answer", 42u64, Duration::from_secs(60))
            .await
            .unwrap();
        let got: Option<u64> = cache.get("answer").await.unwrap();
        assert_eq!(got, Some(42));
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss() {
        let cache = temp_cache();
        cache
            .put("ephemeral", 1u64, Duration::from_secs(0))
            .await
            .unwrap();
        let got: Option<u64> = cache.get("ephemeral").await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let cache = temp_cache();
        let got: Option<u64> = cache.get("nope").await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let cache = temp_cache();
        cache
            .put("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.remove("k").await.unwrap();
        cache.remove("k").await.unwrap();
        let got: Option<String> = cache.get("k").await.unwrap();
        assert_eq!(got, None);
    }
}
