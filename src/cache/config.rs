//! Cache configuration

use std::time::Duration;

/// Default number of messages kept per topic
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Default idle lifetime of a topic's history (5 days)
pub const DEFAULT_ITEM_LIFETIME: Duration = Duration::from_secs(5 * 24 * 60 * 60);

/// Default interval between expired-history purges
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Cache configuration options
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum messages kept per topic; the oldest is evicted on overflow
    pub max_history: usize,

    /// How long a topic's history survives after its last write
    pub item_lifetime: Duration,

    /// How often the worker purges expired histories
    pub cleanup_interval: Duration,

    /// Bound of the command queue; callers wait when it is full
    pub command_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            item_lifetime: DEFAULT_ITEM_LIFETIME,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            command_capacity: DEFAULT_MAX_HISTORY,
        }
    }
}

impl CacheConfig {
    /// Set the per-topic history capacity (at least 1)
    pub fn max_history(mut self, max: usize) -> Self {
        self.max_history = max.max(1);
        self
    }

    /// Set the idle lifetime of a history
    pub fn item_lifetime(mut self, lifetime: Duration) -> Self {
        self.item_lifetime = lifetime;
        self
    }

    /// Set the purge interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Set the command queue bound (at least 1)
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();

        assert_eq!(config.max_history, 100);
        assert_eq!(config.command_capacity, 100);
        assert_eq!(config.item_lifetime, Duration::from_secs(432_000));
        assert_eq!(config.cleanup_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_builder_chaining() {
        let config = CacheConfig::default()
            .max_history(10)
            .item_lifetime(Duration::from_secs(60))
            .cleanup_interval(Duration::from_secs(1))
            .command_capacity(4);

        assert_eq!(config.max_history, 10);
        assert_eq!(config.item_lifetime, Duration::from_secs(60));
        assert_eq!(config.cleanup_interval, Duration::from_secs(1));
        assert_eq!(config.command_capacity, 4);
    }

    #[test]
    fn test_zero_capacities_clamped() {
        let config = CacheConfig::default().max_history(0).command_capacity(0);

        assert_eq!(config.max_history, 1);
        assert_eq!(config.command_capacity, 1);
    }
}
