//! Cache error types

use thiserror::Error;

/// Error type for cache operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The cache worker has stopped and no longer accepts commands
    #[error("cache worker is not running")]
    Closed,
}
