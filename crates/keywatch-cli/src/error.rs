//! Error types for the Keywatch command-line client.

/// Errors that can occur while talking to a Keywatch server.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The HTTP request could not be sent or its body read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The watch socket failed.
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    /// The base URL is not an `http://` or `https://` URL.
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CliError {
    fn from(source: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(source))
    }
}
