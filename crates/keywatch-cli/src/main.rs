//! Command-line client for a Keywatch server.
//!
//! ```text
//! keywatch get <key>
//! keywatch set <key> <value>
//! keywatch watch
//! ```
//!
//! The server URL defaults to `http://localhost:8080` and can be set
//! with `--url` or `KEYWATCH_URL`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use keywatch_cli::KeywatchClient;
use tracing_subscriber::EnvFilter;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "keywatch", version, about = "Client for a Keywatch key-value server")]
struct Cli {
    /// Base URL of the server.
    #[arg(long, env = "KEYWATCH_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the value stored under a key.
    Get {
        /// Key to read.
        key: String,
    },
    /// Store a value under a key.
    Set {
        /// Key to write.
        key: String,
        /// Value to store.
        value: String,
    },
    /// Stream change notifications until the server closes the feed.
    Watch,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the request fails or the server rejects it.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = KeywatchClient::new(&cli.url).context("invalid --url")?;

    match cli.command {
        Command::Get { key } => {
            let value = client
                .get(&key)
                .await
                .with_context(|| format!("GET {key}"))?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Command::Set { key, value } => {
            client
                .set(&key, value.into_bytes())
                .await
                .with_context(|| format!("SET {key}"))?;
        }
        Command::Watch => {
            client
                .watch(|message| println!("{message}"))
                .await
                .context("WATCH")?;
        }
    }

    Ok(())
}
