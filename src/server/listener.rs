//! Gweet server listener
//!
//! Binds the TCP listener, serves the router and coordinates shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::registry::TopicRegistry;
use crate::server::config::ServerConfig;
use crate::server::routes::router;
use crate::server::state::AppState;

/// Gweet HTTP server
pub struct GweetServer {
    config: ServerConfig,
    state: AppState,
    cache_task: JoinHandle<()>,
}

impl GweetServer {
    /// Create a new server and start its cache worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ServerConfig) -> Self {
        let (state, cache_task) = AppState::new(&config);

        Self {
            config,
            state,
            cache_task,
        }
    }

    /// Get a reference to the topic registry
    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.state.registry
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    ///
    /// On shutdown the topic registry is torn down, which ends every open
    /// streaming session, and in-flight requests are allowed to finish.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Gweet server listening");

        let registry = Arc::clone(&self.state.registry);
        let app = router(self.state.clone());

        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
            registry.shutdown().await;
        })
        .await;

        // Stop the cache worker on shutdown
        self.cache_task.abort();

        Ok(result?)
    }
}
