//! Crate-level error types

use thiserror::Error;

use crate::cache::CacheError;
use crate::registry::RegistryError;

/// Errors surfaced by the server and its building blocks
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or listener failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message could not be encoded for the wire
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The cache worker stopped
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The topic registry refused the operation
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_errors_convert() {
        let err: Error = CacheError::Closed.into();
        assert!(matches!(err, Error::Cache(CacheError::Closed)));
        assert_eq!(err.to_string(), CacheError::Closed.to_string());

        let err: Error = RegistryError::ShutDown.into();
        assert!(matches!(err, Error::Registry(RegistryError::ShutDown)));
    }
}
