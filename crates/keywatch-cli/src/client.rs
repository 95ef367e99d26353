//! HTTP and `WebSocket` client for a Keywatch server.

use futures::{SinkExt, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, Url};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::error::CliError;

/// Error body returned by the server.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client bound to one server base URL.
#[derive(Debug, Clone)]
pub struct KeywatchClient {
    http: reqwest::Client,
    base_url: Url,
}

impl KeywatchClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8080`).
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidUrl`] if `base_url` does not parse or is
    /// not an `http://` or `https://` URL.
    pub fn new(base_url: &str) -> Result<Self, CliError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| CliError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CliError::InvalidUrl(base_url.to_owned()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: parsed,
        })
    }

    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Server`] with status 404 if the key does not
    /// exist, or [`CliError::Http`] if the request fails.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>, CliError> {
        let url = self.endpoint(&["db", key])?;
        let response = self.http.get(url).send().await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Store `value` under `key`.
    ///
    /// Returns once the server has handed the change to its watcher, if
    /// one is attached.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Server`] if the server rejects the write, or
    /// [`CliError::Http`] if the request fails.
    pub async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CliError> {
        let url = self.endpoint(&["db", key])?;
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(value)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Connect to the change feed and pass every text frame to
    /// `on_message` until the server closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::WebSocket`] if the connection fails.
    pub async fn watch(&self, mut on_message: impl FnMut(&str)) -> Result<(), CliError> {
        let url = self.watch_url()?;
        let (mut socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        info!(url = url.as_str(), "connected to watch feed");

        while let Some(msg) = socket.next().await {
            match msg? {
                Message::Text(text) => on_message(text.as_str()),
                Message::Ping(data) => socket.send(Message::Pong(data)).await?,
                Message::Close(frame) => {
                    debug!(?frame, "server closed watch feed");
                    break;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Append `segments` to the base URL, percent-encoding each one so a
    /// key containing `?`, `#`, `%` or `/` stays a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CliError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CliError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `WebSocket` URL of the watch endpoint (`http` becomes `ws`, `https`
    /// becomes `wss`).
    fn watch_url(&self) -> Result<Url, CliError> {
        let mut url = self.endpoint(&["watch"])?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| CliError::InvalidUrl(self.base_url.to_string()))?;
        Ok(url)
    }
}

/// Turn a non-success response into [`CliError::Server`].
async fn check_status(response: Response) -> Result<Response, CliError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    Err(CliError::Server {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Extract the `error` field from a JSON error body, or fall back to the
/// raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| body.trim().to_owned(), |parsed| parsed.error)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> KeywatchClient {
        KeywatchClient::new(base).unwrap()
    }

    #[test]
    fn watch_url_swaps_scheme() {
        assert_eq!(
            client("http://localhost:8080").watch_url().unwrap().as_str(),
            "ws://localhost:8080/watch"
        );
        assert_eq!(
            client("https://kv.example.com").watch_url().unwrap().as_str(),
            "wss://kv.example.com/watch"
        );
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert!(matches!(
            KeywatchClient::new("ftp://localhost"),
            Err(CliError::InvalidUrl(_))
        ));
        assert!(matches!(
            KeywatchClient::new("localhost:8080"),
            Err(CliError::InvalidUrl(_))
        ));
    }

    #[test]
    fn trailing_slash_does_not_double_up() {
        let url = client("http://localhost:8080/").endpoint(&["db", "a"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/db/a");
    }

    #[test]
    fn base_path_is_kept() {
        let url = client("http://proxy/kv/").endpoint(&["db", "a"]).unwrap();
        assert_eq!(url.path(), "/kv/db/a");
    }

    #[test]
    fn key_is_percent_encoded_into_one_segment() {
        let url = client("http://localhost:8080").endpoint(&["db", "a?b%c#d"]).unwrap();
        assert_eq!(url.path(), "/db/a%3Fb%25c%23d");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let url = client("http://localhost:8080").endpoint(&["db", "x/y"]).unwrap();
        assert_eq!(url.path(), "/db/x%2Fy");
    }

    #[test]
    fn error_message_prefers_json_field() {
        let body = r#"{"error":"key does not exist: a","status":404}"#;
        assert_eq!(error_message(body), "key does not exist: a");
        assert_eq!(error_message("plain failure\n"), "plain failure");
    }
}
