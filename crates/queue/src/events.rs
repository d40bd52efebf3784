//! In-process review event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`ReviewEvents`] is the fan-out hub for everything observable that
//! happens to the queue. It is cheap to clone; all clones publish into the
//! same channel.

use tokio::sync::broadcast;

use revq_core::review::ReviewTab;
use revq_core::types::DbId;

use crate::workflow::ResolutionMode;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Something observable happened to the review queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewEvent {
    /// The background detector saw more waiting items than the baseline.
    NewItemsDetected {
        pending_delta: i64,
        latest_count: i64,
    },
    /// The controller replaced the current page.
    QueueReloaded {
        tab: ReviewTab,
        page: u32,
        total_items: i64,
    },
    /// A waiting item was resolved through the confirmation workflow.
    ItemResolved { id: DbId, mode: ResolutionMode },
}

/// Publish/subscribe hub for [`ReviewEvent`]s.
#[derive(Clone)]
pub struct ReviewEvents {
    sender: broadcast::Sender<ReviewEvent>,
}

impl ReviewEvents {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped
    /// and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ReviewEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is silently dropped.
    pub fn publish(&self, event: ReviewEvent) {
        // Ignore the SendError -- it only means there are no receivers.
        let _ = self.sender.send(event);
    }
}

impl Default for ReviewEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
