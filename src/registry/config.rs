//! Registry configuration

/// Default per-subscriber backlog
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;

/// Topic registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Messages buffered for a subscriber before the oldest are dropped
    pub subscriber_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
        }
    }
}

impl RegistryConfig {
    /// Set the per-subscriber backlog (at least 1)
    pub fn subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity.max(1);
        self
    }
}
