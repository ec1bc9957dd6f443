//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction and operations.
///
/// Absence of a key is never an error; lookups return `Option`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Construction parameters are out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation is not supported by this cache variant
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Configuration could not be parsed or validated
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CacheError::InvalidArgument("maximum_capacity must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid argument: maximum_capacity must be positive"
        );

        let err = CacheError::Unsupported("contains_value".to_string());
        assert_eq!(err.to_string(), "Unsupported operation: contains_value");

        let err = CacheError::InvalidConfig("CACHE_MAX_CAPACITY".to_string());
        assert!(err.to_string().contains("CACHE_MAX_CAPACITY"));
    }
}
