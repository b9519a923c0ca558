//! Walking-route resolution
//!
//! Fetches a turn-by-turn pedestrian route from an external routing service.
//! Any failure falls back to a synthesized straight-line route, so callers
//! always get a usable path; the route's source tag tells them when the
//! result is approximate. Resolved routes are cached with a jittered TTL.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use thiserror::Error;
use tracing::instrument;

use crate::cache::PersistentCache;
use crate::config::RoutingConfig;
use crate::models::{Coordinate, Route, RouteSource};

#[derive(Error, Debug)]
enum RoutingError {
    #[error("routing request failed: {0}")]
    Network(String),

    #[error("routing service returned status {0}")]
    Status(u16),

    #[error("routing service returned no routes")]
    EmptyRoute,

    #[error("failed to parse routing response: {0}")]
    Parse(String),
}

pub struct RouteResolver {
    http: ClientWithMiddleware,
    base_url: String,
    walking_speed_ms: f64,
    cache_ttl: Duration,
    cache: Option<Arc<PersistentCache>>,
}

impl RouteResolver {
    /// Build a resolver from configuration. The HTTP client carries an
    /// explicit request deadline and retries transient failures with
    /// exponential backoff.
    pub fn new(config: &RoutingConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(concat!("ZooTrail/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::ZooTrailError::general(format!("HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let http = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            walking_speed_ms: config.walking_speed_ms,
            cache_ttl: Duration::from_secs(u64::from(config.cache_ttl_hours) * 60 * 60),
            cache: None,
        })
    }

    /// Cache resolved routes in the given persistent cache
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<PersistentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Produce a walkable route between two points. Never fails: when the
    /// routing service is unavailable the result is a straight-line
    /// approximation tagged `RouteSource::DirectLine`.
    #[instrument(skip(self))]
    pub async fn resolve_route(&self, origin: Coordinate, destination: Coordinate) -> Route {
        let key = route_cache_key(&origin, &destination);

        if let Some(cache) = &self.cache {
            match cache.get::<Route>(&key).await {
                Ok(Some(route)) => return route,
                Ok(None) => {}
                Err(e) => tracing::debug!("route cache read failed: {e}"),
            }
        }

        match self.fetch_route(origin, destination).await {
            Ok(route) => {
                if let Some(cache) = &self.cache {
                    // Jitter the TTL so cached routes do not all expire at once
                    let jitter: f32 = rand::rng().random_range(0.9..1.1);
                    let ttl = Duration::from_secs(
                        (self.cache_ttl.as_secs() as f32 * jitter) as u64,
                    );
                    if let Err(e) = cache.put(&key, route.clone(), ttl).await {
                        tracing::debug!("route cache write failed: {e}");
                    }
                }
                route
            }
            Err(e) => {
                tracing::warn!("walking route unavailable, using direct line: {e}");
                Route::direct_line(origin, destination, self.walking_speed_ms)
            }
        }
    }

    async fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Route, RoutingError> {
        tracing::debug!("Calling the routing API");
        let url = format!(
            "{}/route/v1/walking/{},{};{},{}?overview=full&geometries=geojson&steps=true",
            self.base_url,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude,
        );

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RoutingError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RoutingError::Status(response.status().as_u16()));
        }

        let response: osrm::RouteResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::Parse(e.to_string()))?;

        route_from_response(response)
    }
}

/// Cache key from endpoints rounded to ~1m precision
fn route_cache_key(origin: &Coordinate, destination: &Coordinate) -> String {
    let (olat, olon) = origin.rounded(5);
    let (dlat, dlon) = destination.rounded(5);
    format!("route:{olat:.5}:{olon:.5}-{dlat:.5}:{dlon:.5}")
}

fn route_from_response(response: osrm::RouteResponse) -> Result<Route, RoutingError> {
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(RoutingError::EmptyRoute)?;

    // GeoJSON positions are (lon, lat) pairs
    let geometry: Vec<Coordinate> = route
        .geometry
        .coordinates
        .iter()
        .map(|pair| Coordinate {
            latitude: pair[1],
            longitude: pair[0],
        })
        .collect();

    if geometry.len() < 2 {
        return Err(RoutingError::EmptyRoute);
    }

    let instructions: Vec<String> = route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .enumerate()
        .map(|(i, step)| {
            let text = step
                .maneuver
                .instruction
                .clone()
                .unwrap_or_else(|| "Continue".to_string());
            format!("{}. {}", i + 1, text)
        })
        .collect();

    Ok(Route {
        geometry,
        distance_m: route.distance,
        duration_s: route.duration,
        instructions,
        source: RouteSource::Resolved,
    })
}

/// Routing service response structures
mod osrm {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct RouteResponse {
        #[serde(default)]
        pub routes: Vec<OsrmRoute>,
    }

    #[derive(Debug, Deserialize)]
    pub struct OsrmRoute {
        pub geometry: Geometry,
        pub distance: f64,
        pub duration: f64,
        #[serde(default)]
        pub legs: Vec<Leg>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        pub coordinates: Vec<[f64; 2]>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Leg {
        #[serde(default)]
        pub steps: Vec<Step>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Step {
        pub maneuver: Maneuver,
    }

    #[derive(Debug, Deserialize)]
    pub struct Maneuver {
        #[serde(default)]
        pub instruction: Option<String>,
    }
}
