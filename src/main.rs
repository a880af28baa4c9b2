use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shelfguard::config::ShelfConfig;
use shelfguard::http::{AppState, HttpServer};
use shelfguard::ratelimit::{AdmissionControl, LimiterScope, MonotonicClock};
use shelfguard::store::InMemoryBookStore;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Book catalogue service with leaky-bucket admission control.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match args.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_thread_ids(true)
            .init(),
    }

    info!("Starting Shelfguard");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = ShelfConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.http_addr = listen;
    }
    config.validate()?;
    info!(http_addr = %config.server.http_addr, "Configuration loaded");

    let admission = Arc::new(AdmissionControl::from_config(
        &config.rate_limiting,
        Arc::new(MonotonicClock),
    )?);

    let sweeper = (admission.scope() == LimiterScope::PerClient).then(|| {
        let period = Duration::from_secs(config.rate_limiting.client_idle_secs);
        info!(period_secs = period.as_secs(), "Starting idle client limiter sweeper");
        admission.spawn_idle_sweeper(period)
    });

    let state = AppState::new(Arc::new(InMemoryBookStore::new()), admission);
    let server = HttpServer::new(config.server.http_addr, state);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    info!("Shelfguard stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
