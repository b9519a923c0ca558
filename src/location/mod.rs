//! Location provider
//!
//! Obtains and streams the visitor's position, abstracting over platform
//! geolocation sources, with graceful degradation to the last-known or
//! default position. One provider instance is constructed at application
//! start and injected into every consumer; its fix cache and tracking
//! session are private to that instance.

pub mod backend;
pub mod error;
pub mod simulated;
pub mod store;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::models::{Coordinate, FixOrigin, LocationFix};

pub use backend::{FixRequest, GeolocationBackend, PermissionStatus, RawPosition, WatchHandle};
pub use error::LocationError;
pub use simulated::SimulatedBackend;
pub use store::FixStore;

type FixObserver = Arc<dyn Fn(&LocationFix) + Send + Sync>;
type ErrorObserver = Arc<dyn Fn(&LocationError) + Send + Sync>;

/// Handle returned by `subscribe`, used to remove the observer again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Most recent applied fix, guarded by the sequence number of the request
/// that produced it
struct CurrentFix {
    seq: u64,
    fix: Option<LocationFix>,
}

/// An active continuous-location subscription
struct TrackingSession {
    watch: Option<WatchHandle>,
    pump: JoinHandle<()>,
}

/// State shared between the provider and its tracking pump task
#[derive(Clone)]
struct SharedState {
    current: Arc<Mutex<CurrentFix>>,
    issue_seq: Arc<AtomicU64>,
    fix_observers: Arc<Mutex<HashMap<u64, FixObserver>>>,
    error_observers: Arc<Mutex<HashMap<u64, ErrorObserver>>>,
    store: FixStore,
}

impl SharedState {
    fn next_seq(&self) -> u64 {
        self.issue_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Make a fix current unless a later-issued request already applied.
    /// Returns whether the fix was applied.
    async fn apply_fix(&self, seq: u64, fix: LocationFix) -> bool {
        {
            let mut current = self.current.lock().unwrap();
            if seq < current.seq {
                tracing::debug!(seq, latest = current.seq, "discarding stale fix");
                return false;
            }
            current.seq = seq;
            current.fix = Some(fix.clone());
        }

        if let Err(e) = self.store.save(&fix).await {
            tracing::warn!("failed to persist fix: {e}");
        }

        // Snapshot observers so callbacks run without the registry locked
        let observers: Vec<FixObserver> =
            self.fix_observers.lock().unwrap().values().cloned().collect();
        for observer in observers {
            observer(&fix);
        }
        true
    }

    fn notify_error(&self, error: &LocationError) {
        let observers: Vec<ErrorObserver> = self
            .error_observers
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect();
        for observer in observers {
            observer(error);
        }
    }
}

pub struct LocationProvider {
    backend: Arc<dyn GeolocationBackend>,
    single_request: FixRequest,
    tracking_request: FixRequest,
    shared: SharedState,
    next_observer_id: AtomicU64,
    session: tokio::sync::Mutex<Option<TrackingSession>>,
}

fn fix_from_raw(raw: RawPosition) -> LocationFix {
    LocationFix::live(
        Coordinate {
            latitude: raw.latitude,
            longitude: raw.longitude,
        },
        raw.accuracy_m,
        raw.captured_at,
    )
}

impl LocationProvider {
    #[must_use]
    pub fn new(backend: Arc<dyn GeolocationBackend>, store: FixStore) -> Self {
        Self {
            backend,
            single_request: FixRequest::single(),
            tracking_request: FixRequest::tracking(),
            shared: SharedState {
                current: Arc::new(Mutex::new(CurrentFix { seq: 0, fix: None })),
                issue_seq: Arc::new(AtomicU64::new(0)),
                fix_observers: Arc::new(Mutex::new(HashMap::new())),
                error_observers: Arc::new(Mutex::new(HashMap::new())),
                store,
            },
            next_observer_id: AtomicU64::new(1),
            session: tokio::sync::Mutex::new(None),
        }
    }

    /// Override the default fix/tracking request parameters
    #[must_use]
    pub fn with_requests(mut self, single: FixRequest, tracking: FixRequest) -> Self {
        self.single_request = single;
        self.tracking_request = tracking;
        self
    }

    /// Check consent, prompting only when it has not been granted yet.
    /// Never errors; permission failures are recoverable, not exceptional.
    pub async fn request_permission(&self) -> PermissionStatus {
        match self.backend.check_permission().await {
            PermissionStatus::Granted => PermissionStatus::Granted,
            _ => self.backend.request_permission().await,
        }
    }

    /// Request a single high-accuracy fix.
    ///
    /// On success the fix becomes the in-memory last-known fix and is
    /// persisted for cold-start recovery. Failures carry a typed error code.
    #[instrument(skip(self))]
    pub async fn current_fix(&self) -> Result<LocationFix, LocationError> {
        let seq = self.shared.next_seq();
        // The deadline is enforced here as well, in case a platform backend
        // ignores the requested timeout
        let raw = tokio::time::timeout(
            self.single_request.timeout,
            self.backend.current_position(&self.single_request),
        )
        .await
        .map_err(|_| {
            LocationError::Timeout(format!(
                "no fix within {}s",
                self.single_request.timeout.as_secs()
            ))
        })??;
        let fix = fix_from_raw(raw);
        self.shared.apply_fix(seq, fix.clone()).await;
        Ok(fix)
    }

    /// Live fix if possible, else last-known, else the default position.
    /// Never fails; the returned fix's origin tells the caller how
    /// approximate it is.
    pub async fn best_effort_fix(&self, default_center: Coordinate) -> LocationFix {
        match self.current_fix().await {
            Ok(fix) => fix,
            Err(e) => {
                tracing::warn!(code = e.code(), "live fix unavailable: {e}");
                match self.last_known_fix().await {
                    Some(fix) => fix,
                    None => LocationFix::fallback(default_center),
                }
            }
        }
    }

    /// The most recent fix from memory, falling back to the durable store
    pub async fn last_known_fix(&self) -> Option<LocationFix> {
        let in_memory = { self.shared.current.lock().unwrap().fix.clone() };
        if let Some(fix) = in_memory {
            return Some(fix.with_origin(FixOrigin::Cached));
        }
        match self.shared.store.load().await {
            Ok(fix) => fix,
            Err(e) => {
                tracing::warn!("failed to read persisted fix: {e}");
                None
            }
        }
    }

    /// Begin continuous tracking. An already-running session is cancelled
    /// first so at most one subscription is ever active.
    pub async fn start_tracking(&self) -> Result<(), LocationError> {
        let mut session = self.session.lock().await;
        if let Some(mut previous) = session.take() {
            if let Some(watch) = previous.watch.take() {
                watch.cancel();
            }
            previous.pump.abort();
        }

        let (tx, mut rx) = mpsc::channel(16);
        let watch = self
            .backend
            .watch_position(&self.tracking_request, tx)
            .await?;

        let shared = self.shared.clone();
        let pump = tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                match update {
                    Ok(raw) => {
                        let seq = shared.next_seq();
                        let fix = fix_from_raw(raw);
                        shared.apply_fix(seq, fix).await;
                    }
                    Err(err) => shared.notify_error(&err),
                }
            }
        });

        *session = Some(TrackingSession {
            watch: Some(watch),
            pump,
        });
        Ok(())
    }

    /// Cancel any active tracking session. Idempotent; safe to call when
    /// not tracking.
    pub async fn stop_tracking(&self) {
        let mut session = self.session.lock().await;
        if let Some(mut active) = session.take() {
            if let Some(watch) = active.watch.take() {
                watch.cancel();
            }
            active.pump.abort();
        }
    }

    pub async fn is_tracking(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Register an observer for applied fixes
    pub fn subscribe(
        &self,
        on_fix: impl Fn(&LocationFix) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_observer_id.fetch_add(1, Ordering::SeqCst);
        self.shared
            .fix_observers
            .lock()
            .unwrap()
            .insert(id, Arc::new(on_fix));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.shared.fix_observers.lock().unwrap().remove(&id.0);
    }

    /// Register an observer for tracking errors
    pub fn subscribe_errors(
        &self,
        on_error: impl Fn(&LocationError) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_observer_id.fetch_add(1, Ordering::SeqCst);
        self.shared
            .error_observers
            .lock()
            .unwrap()
            .insert(id, Arc::new(on_error));
        SubscriptionId(id)
    }

    pub fn unsubscribe_errors(&self, id: SubscriptionId) {
        self.shared.error_observers.lock().unwrap().remove(&id.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PersistentCache;
    use rand::Rng;
    use std::time::Duration;

    fn temp_cache_path() -> std::path::PathBuf {
        let suffix: u64 = rand::rng().random();
        std::env::temp_dir().join(format!("zootrail-provider-test-{suffix}"))
    }

    fn provider_with(backend: SimulatedBackend) -> (Arc<LocationProvider>, Arc<SimulatedBackend>) {
        let backend = Arc::new(backend);
        let cache = Arc::new(PersistentCache::open(temp_cache_path()).unwrap());
        let provider = Arc::new(LocationProvider::new(
            Arc::clone(&backend) as Arc<dyn GeolocationBackend>,
            FixStore::new(cache),
        ));
        (provider, backend)
    }

    #[tokio::test]
    async fn test_permission_short_circuits_when_granted() {
        let (provider, _) = provider_with(SimulatedBackend::granted(vec![]));
        assert_eq!(provider.request_permission().await, PermissionStatus::Granted);
    }

    #[tokio::test]
    async fn test_denied_fix_carries_code_1() {
        let (provider, _) = provider_with(SimulatedBackend::denied());
        assert_eq!(provider.request_permission().await, PermissionStatus::Denied);
        let err = provider.current_fix().await.unwrap_err();
        assert_eq!(err.code(), 1);
    }

    #[tokio::test]
    async fn test_current_fix_updates_last_known() {
        let (provider, _) = provider_with(SimulatedBackend::granted(vec![RawPosition::at(
            5.589934, -0.116755,
        )]));
        let fix = provider.current_fix().await.unwrap();
        assert_eq!(fix.origin, FixOrigin::Live);

        let last = provider.last_known_fix().await.unwrap();
        assert_eq!(last.coordinate, fix.coordinate);
        assert_eq!(last.origin, FixOrigin::Cached);
    }

    #[tokio::test]
    async fn test_best_effort_falls_back_to_default() {
        let (provider, _) = provider_with(SimulatedBackend::denied());
        let default_center = Coordinate {
            latitude: 5.589934,
            longitude: -0.116755,
        };
        let fix = provider.best_effort_fix(default_center).await;
        assert_eq!(fix.origin, FixOrigin::Default);
        assert_eq!(fix.coordinate, default_center);
    }

    #[tokio::test]
    async fn test_stale_fix_is_discarded() {
        let (provider, _) = provider_with(SimulatedBackend::granted(vec![]));
        let earlier = provider.shared.next_seq();
        let later = provider.shared.next_seq();

        let fix_a = LocationFix::fallback(Coordinate {
            latitude: 1.0,
            longitude: 1.0,
        });
        let fix_b = LocationFix::fallback(Coordinate {
            latitude: 2.0,
            longitude: 2.0,
        });

        // The later-issued request resolves first; the earlier one must not
        // overwrite it.
        assert!(provider.shared.apply_fix(later, fix_b.clone()).await);
        assert!(!provider.shared.apply_fix(earlier, fix_a).await);

        let current = provider.shared.current.lock().unwrap().fix.clone().unwrap();
        assert_eq!(current.coordinate, fix_b.coordinate);
    }

    struct StalledBackend;

    #[async_trait::async_trait]
    impl GeolocationBackend for StalledBackend {
        async fn check_permission(&self) -> PermissionStatus {
            PermissionStatus::Granted
        }
        async fn request_permission(&self) -> PermissionStatus {
            PermissionStatus::Granted
        }
        async fn current_position(
            &self,
            _request: &FixRequest,
        ) -> Result<RawPosition, LocationError> {
            std::future::pending().await
        }
        async fn watch_position(
            &self,
            _request: &FixRequest,
            _updates: tokio::sync::mpsc::Sender<Result<RawPosition, LocationError>>,
        ) -> Result<WatchHandle, LocationError> {
            Err(LocationError::Unsupported("no watch support".into()))
        }
    }

    #[tokio::test]
    async fn test_unresponsive_backend_times_out_with_code_3() {
        let cache = Arc::new(PersistentCache::open(temp_cache_path()).unwrap());
        let provider = LocationProvider::new(Arc::new(StalledBackend), FixStore::new(cache))
            .with_requests(
                FixRequest {
                    timeout: Duration::from_millis(50),
                    max_age: Duration::from_secs(60),
                    high_accuracy: true,
                },
                FixRequest::tracking(),
            );
        let err = provider.current_fix().await.unwrap_err();
        assert_eq!(err.code(), 3);
    }

    #[tokio::test]
    async fn test_stop_tracking_twice_is_idempotent() {
        let (provider, backend) = provider_with(SimulatedBackend::granted(vec![]));
        provider.stop_tracking().await;
        provider.stop_tracking().await;
        assert!(!provider.is_tracking().await);
        assert_eq!(backend.active_watches(), 0);
    }

    #[tokio::test]
    async fn test_restart_replaces_active_session() {
        let (provider, backend) = provider_with(SimulatedBackend::granted(vec![
            RawPosition::at(5.59, -0.11),
            RawPosition::at(5.60, -0.12),
        ]));
        provider.start_tracking().await.unwrap();
        provider.start_tracking().await.unwrap();

        assert_eq!(backend.watch_starts(), 2);
        assert_eq!(backend.watch_cancels(), 1);
        assert_eq!(backend.active_watches(), 1);

        provider.stop_tracking().await;
        assert_eq!(backend.active_watches(), 0);
    }

    #[tokio::test]
    async fn test_tracking_updates_reach_subscribers() {
        let (provider, _) = provider_with(SimulatedBackend::granted(vec![
            RawPosition::at(5.59, -0.11),
            RawPosition::at(5.60, -0.12),
        ]));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = provider.subscribe(move |fix| {
            sink.lock().unwrap().push(fix.coordinate);
        });

        provider.start_tracking().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        provider.stop_tracking().await;

        let collected = seen.lock().unwrap().clone();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[1].latitude, 5.60);

        provider.unsubscribe(id);
    }

    #[tokio::test]
    async fn test_unsubscribed_observer_is_not_called() {
        let (provider, _) = provider_with(SimulatedBackend::granted(vec![RawPosition::at(
            5.59, -0.11,
        )]));

        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let id = provider.subscribe(move |_| {
            *sink.lock().unwrap() += 1;
        });
        provider.unsubscribe(id);

        provider.current_fix().await.unwrap();
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tracking_errors_reach_error_subscribers() {
        let backend = SimulatedBackend::granted(vec![]);
        backend.push_error(LocationError::Timeout("no fix within 10s".into()));
        let (provider, _) = provider_with(backend);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        provider.subscribe_errors(move |err| {
            sink.lock().unwrap().push(err.code());
        });

        provider.start_tracking().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        provider.stop_tracking().await;

        assert_eq!(seen.lock().unwrap().clone(), vec![3]);
    }
}
