//! HTTP and `WebSocket` front end for the Keywatch store.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Store endpoints** (`GET`/`POST /db/{key}`) backed by
//!   [`keywatch_core::KeyedStore`]
//! - **`WebSocket` endpoint** (`/watch`) that streams every write to the
//!   single attached watcher via
//!   [`keywatch_core::SingleWatcherNotifier`]
//! - **Health endpoint** (`/health`)
//!
//! # Architecture
//!
//! All handlers share one [`AppState`] built at startup. A write stores
//! the value, then publishes it. With no watcher attached the publish
//! returns at once; with a watcher attached the write's response waits
//! until the watcher has taken the notification.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{serve, shutdown_signal, start_server, ServerError};
pub use state::AppState;
