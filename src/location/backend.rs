//! Platform geolocation seam
//!
//! The provider talks to the device's location sensor through this trait so
//! native, browser, and simulated sources are interchangeable.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::LocationError;

/// Outcome of a permission check or request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Consent has not been asked for yet
    Prompt,
}

/// Parameters for a single fix or a continuous watch
#[derive(Debug, Clone)]
pub struct FixRequest {
    /// Give up if no fix arrives within this deadline
    pub timeout: Duration,
    /// Accept an OS-cached fix no older than this
    pub max_age: Duration,
    pub high_accuracy: bool,
}

impl FixRequest {
    /// Defaults for a one-shot fix: generous deadline, tolerate a cached fix
    #[must_use]
    pub fn single() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_age: Duration::from_secs(60),
            high_accuracy: true,
        }
    }

    /// Defaults for continuous tracking: favor freshness per update
    #[must_use]
    pub fn tracking() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_age: Duration::from_secs(5),
            high_accuracy: true,
        }
    }

    /// Single-fix parameters from configuration
    #[must_use]
    pub fn single_from(config: &crate::config::LocationConfig) -> Self {
        Self {
            timeout: Duration::from_secs(u64::from(config.fix_timeout_seconds)),
            max_age: Duration::from_secs(u64::from(config.fix_max_age_seconds)),
            high_accuracy: true,
        }
    }

    /// Tracking parameters from configuration
    #[must_use]
    pub fn tracking_from(config: &crate::config::LocationConfig) -> Self {
        Self {
            timeout: Duration::from_secs(u64::from(config.track_timeout_seconds)),
            max_age: Duration::from_secs(u64::from(config.track_max_age_seconds)),
            high_accuracy: true,
        }
    }
}

/// A raw position reading as delivered by the platform
#[derive(Debug, Clone, PartialEq)]
pub struct RawPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

impl RawPosition {
    /// A reading at the given point, captured now
    #[must_use]
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            captured_at: Utc::now(),
        }
    }
}

/// Cancellation handle for an active watch subscription
pub struct WatchHandle {
    cancel: Box<dyn FnOnce() + Send>,
}

impl WatchHandle {
    #[must_use]
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    /// Stop the underlying platform subscription
    pub fn cancel(self) {
        (self.cancel)();
    }
}

/// Abstraction over the device's location sensor.
///
/// Permission calls never error; backends map any platform failure to
/// `Denied` so a broken permission dialog degrades instead of crashing.
#[async_trait]
pub trait GeolocationBackend: Send + Sync {
    /// Current consent state without prompting the user
    async fn check_permission(&self) -> PermissionStatus;

    /// Prompt for consent if it has not been granted yet
    async fn request_permission(&self) -> PermissionStatus;

    /// Request a single fix
    async fn current_position(&self, request: &FixRequest) -> Result<RawPosition, LocationError>;

    /// Begin a continuous subscription delivering readings (or transient
    /// errors) on `updates` until the returned handle is cancelled.
    async fn watch_position(
        &self,
        request: &FixRequest,
        updates: mpsc::Sender<Result<RawPosition, LocationError>>,
    ) -> Result<WatchHandle, LocationError>;
}
