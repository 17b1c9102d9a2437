//! HTTP listener for the webhook service
//!
//! On SIGINT/SIGTERM the listener stops accepting and in-flight extractions
//! finish before the process exits.

use anyhow::{Context, Result};
use axum::Router;
use soundcheck_core::Config;

fn bind_addr(config: &Config) -> String {
    format!("0.0.0.0:{}", config.server_port())
}

pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = bind_addr(config);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %addr,
        content_prefix = %config.content_prefix(),
        retry_max_attempts = config.retry_max_attempts(),
        webhook_secret = config.webhook_secret().is_some(),
        "Listening for storage events"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let signal = shutdown_signal().await;
            tracing::info!(signal, "Draining in-flight storage events");
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves with the name of the first shutdown signal received.
// Failing to install a handler at startup is unrecoverable.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
