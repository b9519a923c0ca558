//! Configuration management for the `ZooTrail` application
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings.

use crate::ZooTrailError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::Coordinate;

/// Root configuration structure for the `ZooTrail` application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZooTrailConfig {
    /// Walking-route service configuration
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Geolocation timing configuration
    #[serde(default)]
    pub location: LocationConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Map viewport defaults
    #[serde(default)]
    pub map: MapConfig,
}

/// Walking-route service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Base URL of the routing service
    #[serde(default = "default_routing_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_routing_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_routing_max_retries")]
    pub max_retries: u32,
    /// Assumed pace for synthesized direct-line routes, meters per second
    #[serde(default = "default_walking_speed")]
    pub walking_speed_ms: f64,
    /// Resolved-route cache TTL in hours
    #[serde(default = "default_route_cache_ttl")]
    pub cache_ttl_hours: u32,
}

/// Geolocation timing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Deadline for a single fix, seconds
    #[serde(default = "default_fix_timeout")]
    pub fix_timeout_seconds: u32,
    /// Acceptable age of an OS-cached fix for a single request, seconds
    #[serde(default = "default_fix_max_age")]
    pub fix_max_age_seconds: u32,
    /// Per-update deadline while tracking, seconds
    #[serde(default = "default_track_timeout")]
    pub track_timeout_seconds: u32,
    /// Acceptable fix age while tracking, seconds
    #[serde(default = "default_track_max_age")]
    pub track_max_age_seconds: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Map viewport defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Default viewport center latitude (zoo entrance)
    #[serde(default = "default_center_latitude")]
    pub default_latitude: f64,
    /// Default viewport center longitude (zoo entrance)
    #[serde(default = "default_center_longitude")]
    pub default_longitude: f64,
    /// Default viewport zoom
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,
    /// Port the companion API listens on
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_routing_base_url() -> String {
    "https://router.project-osrm.org".to_string()
}

fn default_routing_timeout() -> u32 {
    10
}

fn default_routing_max_retries() -> u32 {
    2
}

fn default_walking_speed() -> f64 {
    1.4
}

fn default_route_cache_ttl() -> u32 {
    24
}

fn default_fix_timeout() -> u32 {
    15
}

fn default_fix_max_age() -> u32 {
    60
}

fn default_track_timeout() -> u32 {
    10
}

fn default_track_max_age() -> u32 {
    5
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("zootrail").display().to_string())
        .unwrap_or_else(|| ".zootrail-cache".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_center_latitude() -> f64 {
    5.589934
}

fn default_center_longitude() -> f64 {
    -0.116755
}

fn default_zoom() -> f64 {
    16.0
}

fn default_port() -> u16 {
    8080
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: default_routing_base_url(),
            timeout_seconds: default_routing_timeout(),
            max_retries: default_routing_max_retries(),
            walking_speed_ms: default_walking_speed(),
            cache_ttl_hours: default_route_cache_ttl(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fix_timeout_seconds: default_fix_timeout(),
            fix_max_age_seconds: default_fix_max_age(),
            track_timeout_seconds: default_track_timeout(),
            track_max_age_seconds: default_track_max_age(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_latitude: default_center_latitude(),
            default_longitude: default_center_longitude(),
            default_zoom: default_zoom(),
            port: default_port(),
        }
    }
}

impl Default for ZooTrailConfig {
    fn default() -> Self {
        Self {
            routing: RoutingConfig::default(),
            location: LocationConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl ZooTrailConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with ZOOTRAIL_ prefix
        builder = builder.add_source(
            Environment::with_prefix("ZOOTRAIL")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: ZooTrailConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zootrail").join("config.toml"))
    }

    /// The default viewport center as a coordinate
    #[must_use]
    pub fn default_center(&self) -> Coordinate {
        Coordinate {
            latitude: self.map.default_latitude,
            longitude: self.map.default_longitude,
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.routing.timeout_seconds == 0 || self.routing.timeout_seconds > 120 {
            return Err(ZooTrailError::config(
                "Routing timeout must be between 1 and 120 seconds",
            )
            .into());
        }

        if self.routing.max_retries > 10 {
            return Err(ZooTrailError::config("Routing max retries cannot exceed 10").into());
        }

        if self.routing.walking_speed_ms <= 0.0 || self.routing.walking_speed_ms > 5.0 {
            return Err(ZooTrailError::config(
                "Walking speed must be between 0 and 5 m/s",
            )
            .into());
        }

        if self.routing.cache_ttl_hours > 168 {
            return Err(
                ZooTrailError::config("Route cache TTL cannot exceed 168 hours (1 week)").into(),
            );
        }

        if self.location.fix_timeout_seconds == 0 || self.location.fix_timeout_seconds > 120 {
            return Err(ZooTrailError::config(
                "Fix timeout must be between 1 and 120 seconds",
            )
            .into());
        }

        if !(-90.0..=90.0).contains(&self.map.default_latitude) {
            return Err(
                ZooTrailError::config("Default latitude must be within [-90, 90]").into(),
            );
        }

        if !(-180.0..=180.0).contains(&self.map.default_longitude) {
            return Err(
                ZooTrailError::config("Default longitude must be within [-180, 180]").into(),
            );
        }

        if !(1.0..=22.0).contains(&self.map.default_zoom) {
            return Err(ZooTrailError::config("Default zoom must be within [1, 22]").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ZooTrailError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ZooTrailError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.routing.base_url.starts_with("http://")
            && !self.routing.base_url.starts_with("https://")
        {
            return Err(ZooTrailError::config(
                "Routing base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}
