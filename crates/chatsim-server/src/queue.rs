//! Per-instance message queues and captured history.
//!
//! A [`MessageQueueSet`] holds the outbound delivery queue that sessions
//! drain, plus the two append-only history buffers tests assert against:
//!
//! - **inbound**: frames the client wrote over its session (heartbeats
//!   excluded)
//! - **outbound**: messages queued for delivery, whether injected by a
//!   test or posted through the HTTP API
//!
//! History buffers sit behind a [`RwLock`]: many concurrent readers,
//! serialized writers, and every read returns a copy so callers can
//! iterate while sessions keep appending.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chatsim_types::MessageEnvelope;
use chatsim_types::envelope::MESSAGE_TYPE;
use tokio::sync::{Notify, broadcast};

/// Capacity of the observation feed.
///
/// A subscriber that falls behind by more than this many frames receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
const SEEN_FEED_CAPACITY: usize = 256;

/// The outbound queue and captured history of one simulated instance.
///
/// Shared as `Arc<MessageQueueSet>` between the hub, every request
/// handler and every open session of the instance. When several sessions
/// are open they compete for [`next_outbound`](Self::next_outbound), so
/// each queued message reaches exactly one of them.
#[derive(Debug)]
pub struct MessageQueueSet {
    /// Messages waiting to be pushed to a connected client, oldest first.
    pending: Mutex<VecDeque<String>>,
    /// Wakes one waiting session when `pending` gains a message.
    pending_ready: Notify,
    /// Frames the client wrote over its session.
    seen_inbound: RwLock<Vec<String>>,
    /// Messages queued for delivery to the client.
    seen_outbound: RwLock<Vec<String>>,
    /// Live copy of every recorded inbound frame.
    seen_feed: broadcast::Sender<String>,
}

impl MessageQueueSet {
    /// Create an empty queue set.
    pub fn new() -> Self {
        let (seen_feed, _) = broadcast::channel(SEEN_FEED_CAPACITY);
        Self {
            pending: Mutex::new(VecDeque::new()),
            pending_ready: Notify::new(),
            seen_inbound: RwLock::new(Vec::new()),
            seen_outbound: RwLock::new(Vec::new()),
            seen_feed,
        }
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Record `message` in outbound history and queue it for delivery.
    ///
    /// Never blocks: the queue is unbounded and accepts messages while no
    /// session is open.
    pub fn queue_outbound(&self, message: String) {
        // Lock order: pending, then seen_outbound. Holding both keeps the
        // recorded order identical to the delivery order across producers.
        let mut pending = lock(&self.pending);
        write_lock(&self.seen_outbound).push(message.clone());
        pending.push_back(message);
        drop(pending);
        self.pending_ready.notify_one();
    }

    /// Wait for and remove the oldest queued message.
    ///
    /// Cancel-safe: dropping the future before it completes never loses
    /// a message.
    pub async fn next_outbound(&self) -> String {
        loop {
            if let Some(message) = lock(&self.pending).pop_front() {
                return message;
            }
            self.pending_ready.notified().await;
        }
    }

    /// Put a message taken by [`next_outbound`](Self::next_outbound) back
    /// at the head of the queue, e.g. after a failed socket write.
    ///
    /// Does not touch history.
    pub fn requeue_front(&self, message: String) {
        lock(&self.pending).push_front(message);
        self.pending_ready.notify_one();
    }

    /// Number of messages still waiting for a session.
    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Record a frame written by the client and publish it on the
    /// observation feed.
    pub fn record_inbound(&self, frame: String) {
        write_lock(&self.seen_inbound).push(frame.clone());
        // Err only means nobody is subscribed.
        let _ = self.seen_feed.send(frame);
    }

    /// Subscribe to every inbound frame recorded from now on.
    pub fn subscribe_seen(&self) -> broadcast::Receiver<String> {
        self.seen_feed.subscribe()
    }

    // -----------------------------------------------------------------------
    // History queries
    // -----------------------------------------------------------------------

    /// Snapshot of inbound history, in wire arrival order.
    pub fn seen_inbound(&self) -> Vec<String> {
        read_lock(&self.seen_inbound).clone()
    }

    /// Snapshot of outbound history, in queue order.
    pub fn seen_outbound(&self) -> Vec<String> {
        read_lock(&self.seen_outbound).clone()
    }

    /// Whether the client wrote a message whose text is exactly `text`.
    pub fn saw_inbound(&self, text: &str) -> bool {
        contains_text(&read_lock(&self.seen_inbound), text)
    }

    /// Whether a message whose text is exactly `text` was queued for the
    /// client.
    pub fn saw_outbound(&self, text: &str) -> bool {
        contains_text(&read_lock(&self.seen_outbound), text)
    }
}

impl Default for MessageQueueSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan raw frames for a chat message with the given text. Frames that are
/// not `message` envelopes are skipped.
fn contains_text(frames: &[String], text: &str) -> bool {
    frames
        .iter()
        .filter_map(|raw| serde_json::from_str::<MessageEnvelope>(raw).ok())
        .any(|msg| msg.kind == MESSAGE_TYPE && msg.text == text)
}

// ---------------------------------------------------------------------------
// Poison-tolerant lock helpers
// ---------------------------------------------------------------------------

/// Every critical section here is a single push, pop or clone, so a
/// poisoned lock still guards consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
