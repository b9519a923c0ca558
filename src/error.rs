//! Error types and handling for the `ZooTrail` application

use thiserror::Error;

/// Main error type for the `ZooTrail` application
#[derive(Error, Debug)]
pub enum ZooTrailError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Map surface rendering errors
    #[error("Render error: {message}")]
    Render { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl ZooTrailError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ZooTrailError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            ZooTrailError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            ZooTrailError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            ZooTrailError::Render { .. } => {
                "The map could not be displayed. Showing a simplified view instead.".to_string()
            }
            ZooTrailError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            ZooTrailError::General { message } => message.clone(),
        }
    }
}
