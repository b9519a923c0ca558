//! Scripted geolocation backend
//!
//! Plays back a fixed sequence of readings. Stands in for a real device
//! sensor in tests and in environments without one.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::backend::{FixRequest, GeolocationBackend, PermissionStatus, RawPosition, WatchHandle};
use super::LocationError;

/// A geolocation backend that replays a script of readings
pub struct SimulatedBackend {
    permission: Mutex<PermissionStatus>,
    /// Whether a permission prompt is answered with consent
    grant_on_request: bool,
    script: Mutex<VecDeque<Result<RawPosition, LocationError>>>,
    /// Delay between watch updates
    watch_interval: Duration,
    watch_starts: Arc<AtomicUsize>,
    watch_cancels: Arc<AtomicUsize>,
}

impl SimulatedBackend {
    /// Backend with consent already granted and the given readings queued
    #[must_use]
    pub fn granted(readings: Vec<RawPosition>) -> Self {
        Self {
            permission: Mutex::new(PermissionStatus::Granted),
            grant_on_request: true,
            script: Mutex::new(readings.into_iter().map(Ok).collect()),
            watch_interval: Duration::from_millis(10),
            watch_starts: Arc::new(AtomicUsize::new(0)),
            watch_cancels: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Backend whose permission prompt is declined
    #[must_use]
    pub fn denied() -> Self {
        Self {
            permission: Mutex::new(PermissionStatus::Prompt),
            grant_on_request: false,
            script: Mutex::new(VecDeque::new()),
            watch_interval: Duration::from_millis(10),
            watch_starts: Arc::new(AtomicUsize::new(0)),
            watch_cancels: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue a transient error to be delivered in sequence
    pub fn push_error(&self, error: LocationError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// Queue an additional reading
    pub fn push_reading(&self, position: RawPosition) {
        self.script.lock().unwrap().push_back(Ok(position));
    }

    /// Number of watch subscriptions ever started
    #[must_use]
    pub fn watch_starts(&self) -> usize {
        self.watch_starts.load(Ordering::SeqCst)
    }

    /// Number of watch subscriptions cancelled
    #[must_use]
    pub fn watch_cancels(&self) -> usize {
        self.watch_cancels.load(Ordering::SeqCst)
    }

    /// Watch subscriptions currently running
    #[must_use]
    pub fn active_watches(&self) -> usize {
        self.watch_starts() - self.watch_cancels()
    }

    fn next_scripted(&self) -> Option<Result<RawPosition, LocationError>> {
        self.script.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl GeolocationBackend for SimulatedBackend {
    async fn check_permission(&self) -> PermissionStatus {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> PermissionStatus {
        let mut permission = self.permission.lock().unwrap();
        if *permission == PermissionStatus::Prompt {
            *permission = if self.grant_on_request {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            };
        }
        *permission
    }

    async fn current_position(&self, _request: &FixRequest) -> Result<RawPosition, LocationError> {
        if *self.permission.lock().unwrap() != PermissionStatus::Granted {
            return Err(LocationError::PermissionDenied(
                "location access has not been granted".to_string(),
            ));
        }
        match self.next_scripted() {
            Some(result) => result,
            None => Err(LocationError::PositionUnavailable(
                "no scripted readings remain".to_string(),
            )),
        }
    }

    async fn watch_position(
        &self,
        _request: &FixRequest,
        updates: mpsc::Sender<Result<RawPosition, LocationError>>,
    ) -> Result<WatchHandle, LocationError> {
        if *self.permission.lock().unwrap() != PermissionStatus::Granted {
            return Err(LocationError::PermissionDenied(
                "location access has not been granted".to_string(),
            ));
        }

        self.watch_starts.fetch_add(1, Ordering::SeqCst);

        // Drain the script up front so the playback task owns its updates.
        let mut queued: VecDeque<_> = {
            let mut script = self.script.lock().unwrap();
            std::mem::take(&mut *script)
        };
        let interval = self.watch_interval;

        let task = tokio::spawn(async move {
            while let Some(item) = queued.pop_front() {
                tokio::time::sleep(interval).await;
                if updates.send(item).await.is_err() {
                    break;
                }
            }
        });

        let cancels = Arc::clone(&self.watch_cancels);
        Ok(WatchHandle::new(move || {
            task.abort();
            cancels.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_denied_backend_reports_code_1() {
        let backend = SimulatedBackend::denied();
        assert_eq!(backend.request_permission().await, PermissionStatus::Denied);
        let err = backend
            .current_position(&FixRequest::single())
            .await
            .unwrap_err();
        assert_eq!(err.code(), 1);
    }

    #[tokio::test]
    async fn test_script_is_played_in_order() {
        let backend =
            SimulatedBackend::granted(vec![RawPosition::at(5.59, -0.11), RawPosition::at(5.60, -0.12)]);
        let first = backend
            .current_position(&FixRequest::single())
            .await
            .unwrap();
        assert_eq!(first.latitude, 5.59);
        let second = backend
            .current_position(&FixRequest::single())
            .await
            .unwrap();
        assert_eq!(second.latitude, 5.60);
    }

    #[tokio::test]
    async fn test_exhausted_script_is_position_unavailable() {
        let backend = SimulatedBackend::granted(vec![]);
        let err = backend
            .current_position(&FixRequest::single())
            .await
            .unwrap_err();
        assert_eq!(err.code(), 2);
    }

    #[tokio::test]
    async fn test_watch_delivers_updates_until_cancelled() {
        let backend = SimulatedBackend::granted(vec![
            RawPosition::at(5.59, -0.11),
            RawPosition::at(5.60, -0.12),
        ]);
        let (tx, mut rx) = mpsc::channel(8);
        let handle = backend
            .watch_position(&FixRequest::tracking(), tx)
            .await
            .unwrap();
        assert_eq!(backend.active_watches(), 1);

        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first.latitude, 5.59);

        handle.cancel();
        assert_eq!(backend.active_watches(), 0);
    }
}
