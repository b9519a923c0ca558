use thiserror::Error;

/// Typed geolocation failure, mirroring the platform error codes surfaced
/// to the UI layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied: {0}")]
    PermissionDenied(String),

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Location request timed out: {0}")]
    Timeout(String),

    #[error("Geolocation not supported: {0}")]
    Unsupported(String),
}

impl LocationError {
    /// Numeric platform error code
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            LocationError::Unsupported(_) => 0,
            LocationError::PermissionDenied(_) => 1,
            LocationError::PositionUnavailable(_) => 2,
            LocationError::Timeout(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LocationError::Unsupported("no sensor".into()).code(), 0);
        assert_eq!(LocationError::PermissionDenied("declined".into()).code(), 1);
        assert_eq!(
            LocationError::PositionUnavailable("no signal".into()).code(),
            2
        );
        assert_eq!(LocationError::Timeout("15s elapsed".into()).code(), 3);
    }

    #[test]
    fn test_error_messages_are_human_readable() {
        let err = LocationError::PermissionDenied("user declined the prompt".into());
        assert!(err.to_string().contains("permission denied"));
        assert!(err.to_string().contains("user declined the prompt"));
    }
}
