//! Shared application state for the Keywatch server.
//!
//! [`AppState`] is the process-wide context: the store, the notifier
//! bound to it, and the watch socket settings. It is built once at
//! startup, wrapped in [`Arc`], and injected into handlers through
//! Axum's `State` extractor.

use std::sync::Arc;

use keywatch_core::config::WatchSettings;
use keywatch_core::{KeyedStore, KeywatchConfig, SingleWatcherNotifier};

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key-value store.
    pub store: Arc<KeyedStore>,
    /// Change notifier reading from `store`.
    pub notifier: SingleWatcherNotifier,
    /// Greeting and frame format for watch sockets.
    pub watch: WatchSettings,
}

impl AppState {
    /// Create state with an empty store and the given watch settings.
    pub fn new(watch: WatchSettings) -> Self {
        let store = Arc::new(KeyedStore::new());
        let notifier = SingleWatcherNotifier::new(Arc::clone(&store));
        Self {
            store,
            notifier,
            watch,
        }
    }

    /// Create state from a loaded configuration.
    pub fn from_config(config: &KeywatchConfig) -> Self {
        Self::new(config.watch.clone())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(WatchSettings::default())
    }
}
