//! Keywatch server binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `keywatch.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the shared store and notifier
//! 4. Serve until Ctrl-C or SIGTERM

use std::path::Path;
use std::sync::Arc;

use keywatch_core::config::DEFAULT_CONFIG_FILE;
use keywatch_core::KeywatchConfig;
use keywatch_server::{shutdown_signal, start_server, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the server fails
/// to bind or serve.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = KeywatchConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?;

    // 2. Initialize structured logging. RUST_LOG wins over the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        host = config.server.host,
        port = config.server.port,
        watch_format = ?config.watch.format,
        "keywatch-server starting"
    );

    // 3. Build shared state.
    let state = Arc::new(AppState::from_config(&config));

    // 4. Serve.
    start_server(&config.server, state, shutdown_signal()).await?;

    info!("keywatch-server shutdown complete");
    Ok(())
}
