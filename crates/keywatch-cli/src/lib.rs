//! Client library behind the `keywatch` command.
//!
//! [`KeywatchClient`] wraps the server's HTTP routes (`get`, `set`) and
//! its `/watch` change feed.

pub mod client;
pub mod error;

pub use client::KeywatchClient;
pub use error::CliError;
