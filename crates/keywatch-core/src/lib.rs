//! Core of Keywatch: an in-memory key-value store with a single-watcher
//! change feed.
//!
//! - [`KeyedStore`] holds the key to value mapping under a read-write
//!   lock and tracks whether each key has been overwritten.
//! - [`SingleWatcherNotifier`] hands each mutation to at most one
//!   attached [`Watcher`]. Writers never wait when nobody is watching
//!   and wait for the watcher to read when somebody is.
//! - [`KeywatchConfig`] loads `keywatch.yaml` with env overrides.
//!
//! HTTP and WebSocket plumbing live in `keywatch-server`.

pub mod config;
pub mod notification;
pub mod notifier;
pub mod store;

pub use config::{ConfigError, KeywatchConfig};
pub use notification::{ChangeKind, Notification, WatchFormat};
pub use notifier::{NotifierError, PublishOutcome, SingleWatcherNotifier, Watcher};
pub use store::KeyedStore;
