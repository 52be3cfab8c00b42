//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::registry::RegistryConfig;
use crate::session::DEFAULT_KEEPALIVE_INTERVAL;

/// Default listening port
pub const DEFAULT_PORT: u16 = 9835;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Idle time after which a streaming session sends a keepalive
    pub keepalive_interval: Duration,

    /// History store and cache worker settings
    pub cache: CacheConfig,

    /// Topic registry settings
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            cache: CacheConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the keepalive interval
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Set cache options
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set registry options
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 9835);
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.keepalive_interval, Duration::from_secs(30));
        assert_eq!(config.cache.max_history, 100);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.keepalive_interval, DEFAULT_KEEPALIVE_INTERVAL);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .keepalive_interval(Duration::from_millis(250))
            .cache(CacheConfig::default().max_history(5))
            .registry(RegistryConfig::default().subscriber_capacity(8));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.keepalive_interval, Duration::from_millis(250));
        assert_eq!(config.cache.max_history, 5);
        assert_eq!(config.registry.subscriber_capacity, 8);
    }
}
