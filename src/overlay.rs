//! Status overlay abstraction.
//!
//! The overlay is a live key-value store of per-contact communication status,
//! keyed by the same identifier the roster uses. Reads happen through full
//! snapshots and a change subscription; the only write path is the workflow's
//! commit step, and writes always merge onto existing fields.

use crate::error::EngineError;
use crate::types::{ContactId, OverlaySnapshot, StatusPatch};
use async_trait::async_trait;
use tokio::sync::broadcast;

mod sled_store;

pub use sled_store::SledStatusOverlay;

/// Live store of per-contact communication status.
#[async_trait]
pub trait StatusOverlay: Send + Sync {
    /// Current full contents of the overlay.
    async fn snapshot(&self) -> Result<OverlaySnapshot, EngineError>;

    /// Merge `patch` onto the stored record for `id`, creating the record if
    /// absent. Subscribers are notified with the post-write snapshot.
    async fn upsert(&self, id: &ContactId, patch: StatusPatch) -> Result<(), EngineError>;

    /// Subscribe to change notifications. The subscription's lifetime scopes
    /// the delivery: dropping it unsubscribes.
    fn subscribe(&self) -> OverlaySubscription;
}

/// Change-notification handle. Each notification carries the full post-write
/// snapshot, so a slow consumer that misses intermediate notifications still
/// converges on the latest state.
pub struct OverlaySubscription {
    receiver: broadcast::Receiver<OverlaySnapshot>,
}

impl OverlaySubscription {
    pub fn new(receiver: broadcast::Receiver<OverlaySnapshot>) -> Self {
        Self { receiver }
    }

    /// Wait for the next snapshot. Returns `None` once the overlay is gone.
    /// Lagged notifications are skipped; the latest snapshot wins.
    pub async fn changed(&mut self) -> Option<OverlaySnapshot> {
        loop {
            match self.receiver.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
