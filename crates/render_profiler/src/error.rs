//! Error types for the render profiler.

use thiserror::Error;

/// Errors that can occur while configuring the profiler or exporting data.
///
/// Recording itself never fails: unknown keys and inactive recordings are
/// silently ignored.
#[derive(Debug, Error)]
pub enum ProfilerError {
    /// Failed to serialize props or a recording dump
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unrecognized build environment name
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),
}

/// Result type for profiler operations.
pub type ProfilerResult<T> = Result<T, ProfilerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProfilerError::InvalidEnvironment("staging".to_string());
        assert_eq!(err.to_string(), "Invalid environment: staging");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err: Result<(), serde_json::Error> = serde_json::from_str::<()>("invalid json");
        let err: ProfilerError = json_err.unwrap_err().into();
        assert!(matches!(err, ProfilerError::Serialization(_)));
    }
}
