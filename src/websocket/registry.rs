use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

pub type SubscriberId = Uuid;

/// One serialized record, shared by every subscriber of a publish
pub type Frame = Arc<str>;

/// Why a frame could not be handed to a subscriber
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriberSendError {
    /// The connection's receiving side is gone
    #[error("subscriber channel closed")]
    Closed,

    /// The subscriber's buffer stayed full for the whole send window
    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

/// Handle to one connected subscriber
///
/// Holds only the sending half of the connection's frame buffer. The
/// transport connection itself is owned by its writer task, which drains
/// the buffer and stops once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<Frame>,
    label: Option<String>,
    connected_at: DateTime<Utc>,
}

impl Subscriber {
    /// Create a subscriber with a frame buffer of `buffer` entries
    ///
    /// Returns the handle to register and the receiver the transport drains.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let subscriber = Self {
            id: Uuid::new_v4(),
            tx,
            label: None,
            connected_at: Utc::now(),
        };
        (subscriber, rx)
    }

    /// Attach a human-readable label (e.g. the peer address) for logs
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Queue one frame, waiting at most `timeout` for buffer space
    pub async fn send(&self, frame: Frame, timeout: Duration) -> Result<(), SubscriberSendError> {
        match tokio::time::timeout(timeout, self.tx.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(SubscriberSendError::Closed),
            Err(_) => Err(SubscriberSendError::Timeout(timeout)),
        }
    }
}

/// Thread-safe set of active subscribers
///
/// `add`/`remove` take the write lock only for the map operation itself;
/// `snapshot` clones the current handles out under the read lock so a
/// broadcast never holds the lock while it sends.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    subscribers: Arc<RwLock<HashMap<SubscriberId, Subscriber>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Returns false if it was already registered.
    pub fn add(&self, subscriber: Subscriber) -> bool {
        let id = subscriber.id();
        let label = subscriber.label().map(str::to_string);
        let (inserted, count) = {
            let mut subscribers = self.subscribers.write();
            let inserted = match subscribers.entry(id) {
                std::collections::hash_map::Entry::Occupied(_) => false,
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(subscriber);
                    true
                }
            };
            (inserted, subscribers.len())
        };

        if inserted {
            tracing::info!(
                subscriber = %id,
                peer = label.as_deref().unwrap_or("-"),
                subscribers = count,
                "🔌 Subscriber registered"
            );
        }
        inserted
    }

    /// Deregister a subscriber. Removing an unknown id is a no-op.
    pub fn remove(&self, id: &SubscriberId) -> bool {
        let (removed, count) = {
            let mut subscribers = self.subscribers.write();
            let removed = subscribers.remove(id).is_some();
            (removed, subscribers.len())
        };

        if removed {
            tracing::info!(subscriber = %id, subscribers = count, "🔌 Subscriber removed");
        }
        removed
    }

    /// Point-in-time copy of the registered subscribers
    pub fn snapshot(&self) -> Vec<Subscriber> {
        self.subscribers.read().values().cloned().collect()
    }

    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.subscribers.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Drop every subscriber (used on shutdown)
    pub fn clear(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        let count = subscribers.len();
        subscribers.clear();
        count
    }
}
