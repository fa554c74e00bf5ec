// Metis Backend - Web Server
// Item registry + graduate analytics over HTTP

use anyhow::{Context, Result};
use metis_backend::api::{app, AppState};
use metis_backend::{init_logging, Config};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(config.log_format);

    info!(version = metis_backend::VERSION, "starting Metis backend");

    if config.graduates_path.exists() {
        info!(path = %config.graduates_path.display(), "graduates source found");
    } else {
        // Not fatal: /analytics/graduates answers 404 until the file appears
        warn!(path = %config.graduates_path.display(), "graduates source not found");
    }

    let state = AppState::new(&config.graduates_path);
    let app = app(state, &config.cors_origins)?;

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
