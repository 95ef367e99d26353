//! Keywatch HTTP server lifecycle management.
//!
//! Provides [`start_server`], which binds to the configured address and
//! serves until the shutdown future resolves, and [`serve`], which does
//! the same on an already-bound listener (used by tests with port 0).
//! When shutdown begins the notifier is closed so attached and queued
//! watch connections end instead of holding the server open.

use std::future::Future;
use std::sync::Arc;

use keywatch_core::config::ServerSettings;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Start the Keywatch HTTP server.
///
/// Binds to `settings.host:settings.port` and serves requests until
/// `shutdown` resolves. The host may be an IP literal (v4 or v6) or a
/// name such as `localhost`.
///
/// # Errors
///
/// Returns an error if the host does not resolve, the TCP listener cannot
/// bind, or the server encounters a fatal I/O error.
pub async fn start_server(
    settings: &ServerSettings,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .map_err(|e| {
            ServerError::Bind(format!(
                "bind failed on {}:{}: {e}",
                settings.host, settings.port
            ))
        })?;

    serve(listener, state, shutdown).await
}

/// Serve the Keywatch router on an already-bound listener.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server encounters a fatal I/O
/// error.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("listener has no local address: {e}")))?;
    let notifier = state.notifier.clone();
    let router = build_router(state);

    info!(%addr, "Keywatch server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("shutdown requested, closing watch feed");
            notifier.close();
        })
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("Keywatch server stopped");
    Ok(())
}

/// Resolve on Ctrl-C, or on SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Errors that can occur when starting or running the Keywatch server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
