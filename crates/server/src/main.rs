//! hashchain HTTP server entry point.
//!
//! Parses configuration, initializes logging, and serves the per-session
//! chain API plus the browser UI until Ctrl-C or SIGTERM.

mod api;
mod config;
mod error;
mod logging;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use api::AppState;
use config::Config;
use session::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    logging::init_logging(&config.log_level, config.log_format);

    let addr = config.listen_addr();
    tracing::info!(
        %addr,
        difficulty = config.difficulty,
        static_dir = %config.static_dir.display(),
        "starting hashchain-server"
    );

    let sessions = Arc::new(SessionStore::new(config.chain_config()));
    let router = api::create_router(AppState::new(sessions), &config.http_options());

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("hashchain-server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received, draining connections");
}
