//! Shared handler state

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::cache::CacheHandle;
use crate::registry::TopicRegistry;

use super::config::ServerConfig;

/// Services handed to every request handler
#[derive(Clone)]
pub struct AppState {
    /// Handle to the cache worker
    pub cache: CacheHandle,

    /// Live topic subscriptions
    pub registry: Arc<TopicRegistry>,

    /// Keepalive interval for streaming sessions
    pub keepalive: Duration,
}

impl AppState {
    /// Build the services and spawn the cache worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: &ServerConfig) -> (Self, JoinHandle<()>) {
        let registry = Arc::new(TopicRegistry::with_config(config.registry.clone()));
        let (cache, cache_task) = CacheHandle::spawn(config.cache.clone(), Arc::clone(&registry));

        let state = Self {
            cache,
            registry,
            keepalive: config.keepalive_interval,
        };

        (state, cache_task)
    }
}
