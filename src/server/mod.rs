//! HTTP server
//!
//! Routes, handlers and the listener that ties the cache worker and topic
//! registry to the network.

pub mod config;
pub mod error;
pub mod handlers;
pub mod listener;
pub mod routes;
pub mod state;
pub mod trace;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use listener::GweetServer;
pub use routes::router;
pub use state::AppState;
