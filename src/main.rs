use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use zootrail::api::AppState;
use zootrail::cache::PersistentCache;
use zootrail::config::ZooTrailConfig;
use zootrail::routing::RouteResolver;
use zootrail::{directory, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ZooTrailConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(version = zootrail::VERSION, "Starting ZooTrail");

    let cache = Arc::new(
        PersistentCache::open(&config.cache.location)
            .with_context(|| format!("Failed to open cache at {}", config.cache.location))?,
    );

    let resolver = Arc::new(RouteResolver::new(&config.routing)?.with_cache(Arc::clone(&cache)));

    let state = AppState {
        resolver,
        pois: Arc::new(directory::seed_pois()),
        landmarks: Arc::new(directory::landmark_table()),
        default_center: config.default_center(),
    };

    web::run(state, config.map.port).await
}
