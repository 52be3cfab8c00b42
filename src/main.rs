//! Gweet server binary

use std::net::{IpAddr, SocketAddr};

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use gweet::server::config::DEFAULT_PORT;
use gweet::{GweetServer, ServerConfig};

/// Keyed, ephemeral message queue with live streaming
#[derive(Debug, Parser)]
#[command(name = "gweet", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// The interface to listen on
    #[arg(long, default_value = "0.0.0.0")]
    interface: IpAddr,

    /// The port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{default_level},tower_http={default_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> gweet::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = ServerConfig::default().bind(SocketAddr::new(cli.interface, cli.port));

    GweetServer::new(config).run_until(shutdown_signal()).await
}
