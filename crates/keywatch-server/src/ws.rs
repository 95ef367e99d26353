//! `WebSocket` handler for the change feed.
//!
//! Clients connect to `GET /watch`. After the upgrade the server sends
//! the configured greeting, then waits for the watcher token. Only one
//! client holds the token at a time; later clients queue until it is
//! released. The token holder receives one text frame per store write.
//!
//! The token is released whenever the handler returns: on a failed
//! send, a close frame, a socket error, or server shutdown.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and start
/// streaming change notifications.
///
/// # Route
///
/// `GET /watch`
pub async fn watch(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_watch(socket, state))
}

/// Drive one watch connection from greeting to detach.
async fn handle_watch(mut socket: WebSocket, state: Arc<AppState>) {
    let session = Uuid::now_v7();
    debug!(%session, "watch client connected");

    if !state.watch.greeting.is_empty() {
        let greeting = Message::Text(state.watch.greeting.clone().into());
        if socket.send(greeting).await.is_err() {
            debug!(%session, "watch client disconnected (greeting failed)");
            return;
        }
    }

    // Keep reading the socket while queued so a client that gives up
    // leaves the queue instead of holding a place in it.
    let mut watcher = tokio::select! {
        result = state.notifier.attach() => match result {
            Ok(watcher) => watcher,
            Err(e) => {
                debug!(%session, "cannot attach watcher: {e}");
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
        },
        () = wait_for_close(&mut socket) => {
            debug!(%session, "watch client left before attaching");
            return;
        }
    };
    info!(%session, "watcher attached");

    loop {
        tokio::select! {
            notification = watcher.next() => {
                let Some(notification) = notification else {
                    debug!(%session, "notifier closed, ending watch");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                let frame = match notification.render(state.watch.format) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(%session, "Failed to render notification: {e}");
                        continue;
                    }
                };
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    debug!(%session, "watch client disconnected (send failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%session, "watch client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(%session, "watch client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%session, "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // Watchers only listen; ignore anything else they send.
                    }
                }
            }
        }
    }

    watcher.detach();
    info!(%session, "watcher detached");
}

/// Resolve once the client closes the socket or the socket fails.
async fn wait_for_close(socket: &mut WebSocket) {
    while let Some(msg) = socket.recv().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => return,
            Ok(Message::Ping(data)) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    return;
                }
            }
            Ok(_) => {}
        }
    }
}
