//! Single-watcher change notification.
//!
//! [`SingleWatcherNotifier`] hands each store mutation to at most one
//! attached watcher. The protocol has two parts:
//!
//! - **Token.** A one-permit [`Semaphore`] stands for "a watcher is
//!   attached". [`SingleWatcherNotifier::attach`] waits for the permit
//!   (FIFO among queued attach calls) and returns a [`Watcher`] guard.
//!   Dropping the guard is detach, so the permit comes back on every
//!   exit path of the watcher task.
//! - **Handoff.** While a watcher is attached, its channel sender sits
//!   in a slot. [`SingleWatcherNotifier::publish`] probes the slot: if it
//!   is empty the event is discarded immediately, otherwise the writer
//!   blocks until the watcher's [`Watcher::next`] takes the event and
//!   acknowledges it.
//!
//! # Blocking
//!
//! A publish with a watcher attached waits until that watcher reads the
//! event. There is no timeout and no queue of past events; a watcher
//! that stops reading stalls every writer that publishes after it.
//!
//! # Detach during a pending handoff
//!
//! Detaching drops the watcher's receiving end. Any writer still waiting
//! for that watcher returns [`PublishOutcome::Discarded`] instead of
//! blocking forever.
//!
//! # Message freshness
//!
//! The first-write/update distinction is read from the store when the
//! watcher receives the event, not when the write happened. A key that
//! was overwritten again in between is reported as an update even if the
//! delivered value was its first write.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

use crate::notification::{ChangeKind, Notification};
use crate::store::KeyedStore;

/// Errors returned by the notifier.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// The notifier was closed and accepts no more watchers.
    #[error("notifier is closed")]
    Closed,
}

/// Result of a [`SingleWatcherNotifier::publish`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The attached watcher accepted the event.
    Delivered,
    /// No watcher was attached, or it detached before accepting the event.
    Discarded,
}

/// A mutation in flight between one writer and the watcher.
#[derive(Debug)]
struct Handoff {
    key: String,
    value: Vec<u8>,
    /// Completed by the watcher the moment it takes the event.
    ack: oneshot::Sender<()>,
}

#[derive(Debug)]
struct Inner {
    store: Arc<KeyedStore>,
    token: Arc<Semaphore>,
    /// Sender of the attached watcher, `None` while idle.
    slot: Mutex<Option<mpsc::Sender<Handoff>>>,
}

/// Delivers mutations to the one attached watcher.
///
/// Cheap to clone; all clones share the same token and handoff.
#[derive(Debug, Clone)]
pub struct SingleWatcherNotifier {
    inner: Arc<Inner>,
}

impl SingleWatcherNotifier {
    /// Create an idle notifier that formats messages against `store`.
    pub fn new(store: Arc<KeyedStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                token: Arc::new(Semaphore::new(1)),
                slot: Mutex::new(None),
            }),
        }
    }

    /// Attach as the watcher, waiting for the current watcher to detach
    /// if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Closed`] if [`close`](Self::close) was
    /// called before or while waiting.
    pub async fn attach(&self) -> Result<Watcher, NotifierError> {
        let permit = Arc::clone(&self.inner.token)
            .acquire_owned()
            .await
            .map_err(|_closed| NotifierError::Closed)?;

        // Capacity 1 is the minimum tokio allows; the writer still waits
        // on the ack, so a buffered event is never reported as delivered.
        let (tx, rx) = mpsc::channel(1);
        {
            let mut slot = self.inner.slot.lock();
            if self.inner.token.is_closed() {
                return Err(NotifierError::Closed);
            }
            *slot = Some(tx);
        }
        debug!("watcher attached");

        Ok(Watcher {
            inner: Arc::clone(&self.inner),
            rx,
            _permit: permit,
        })
    }

    /// Hand a mutation to the attached watcher.
    ///
    /// Returns immediately with [`PublishOutcome::Discarded`] when no
    /// watcher is attached. Otherwise waits until the watcher takes the
    /// event, or until it detaches.
    pub async fn publish(&self, key: &str, value: &[u8]) -> PublishOutcome {
        let sender = self.inner.slot.lock().clone();
        let Some(sender) = sender else {
            trace!(key, "no watcher attached, discarding event");
            return PublishOutcome::Discarded;
        };

        let (ack_tx, ack_rx) = oneshot::channel();
        let handoff = Handoff {
            key: key.to_owned(),
            value: value.to_vec(),
            ack: ack_tx,
        };

        if sender.send(handoff).await.is_err() {
            debug!(key, "watcher detached before handoff");
            return PublishOutcome::Discarded;
        }
        match ack_rx.await {
            Ok(()) => {
                trace!(key, "event delivered to watcher");
                PublishOutcome::Delivered
            }
            Err(_) => {
                debug!(key, "watcher detached with event pending");
                PublishOutcome::Discarded
            }
        }
    }

    /// Whether a watcher currently holds the token.
    pub fn is_attached(&self) -> bool {
        self.inner.slot.lock().is_some()
    }

    /// Stop accepting watchers.
    ///
    /// Pending and future [`attach`](Self::attach) calls fail, later
    /// publishes are discarded, and the attached watcher's
    /// [`Watcher::next`] returns `None` once in-flight handoffs drain.
    pub fn close(&self) {
        self.inner.token.close();
        self.inner.slot.lock().take();
        debug!("notifier closed");
    }
}

/// The attached watcher. Holding it is holding the token; dropping it
/// detaches.
#[derive(Debug)]
pub struct Watcher {
    inner: Arc<Inner>,
    rx: mpsc::Receiver<Handoff>,
    _permit: OwnedSemaphorePermit,
}

impl Watcher {
    /// Wait for the next mutation and format it.
    ///
    /// Returns `None` once the notifier has been closed. Cancel-safe:
    /// if the future is dropped before completing, no event is lost.
    pub async fn next(&mut self) -> Option<Notification> {
        loop {
            let handoff = self.rx.recv().await?;
            if handoff.ack.send(()).is_err() {
                // The writer gave up before we got here; it saw no delivery.
                trace!(key = handoff.key, "skipping abandoned handoff");
                continue;
            }
            let kind = if self.inner.store.was_updated(&handoff.key) {
                ChangeKind::Updated
            } else {
                ChangeKind::Created
            };
            return Some(Notification::new(kind, handoff.key, &handoff.value));
        }
    }

    /// Detach explicitly. Equivalent to dropping the watcher.
    pub fn detach(self) {
        drop(self);
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.inner.slot.lock().take();
        // Closing the receiver fails blocked senders; dropping it (after
        // this fn) drops any buffered handoff and with it the writer's ack.
        self.rx.close();
        debug!("watcher detached");
    }
}
