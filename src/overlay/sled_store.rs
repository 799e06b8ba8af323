//! Sled-backed status overlay.
//!
//! Records are stored as JSON values keyed by contact identifier, so the
//! on-disk contents stay inspectable and carry the same wire field names the
//! rest of the system speaks.

use crate::error::{EngineError, OverlayError};
use crate::overlay::{OverlaySubscription, StatusOverlay};
use crate::types::{ContactId, OverlaySnapshot, StatusPatch, StatusRecord};
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::broadcast;
use tracing::debug;

const NOTIFY_CHANNEL_CAPACITY: usize = 16;

/// Local sled implementation of [`StatusOverlay`].
pub struct SledStatusOverlay {
    db: sled::Db,
    notify: broadcast::Sender<OverlaySnapshot>,
}

impl SledStatusOverlay {
    /// Open (or create) the overlay database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OverlayError> {
        let db = sled::open(path)?;
        let (notify, _) = broadcast::channel(NOTIFY_CHANNEL_CAPACITY);
        Ok(Self { db, notify })
    }

    fn read_all(&self) -> Result<OverlaySnapshot, OverlayError> {
        let mut snapshot = OverlaySnapshot::new();
        for item in self.db.iter() {
            let (key, value) = item?;
            let id = String::from_utf8_lossy(&key).to_string();
            let record: StatusRecord = serde_json::from_slice(&value)?;
            snapshot.insert(id, record);
        }
        Ok(snapshot)
    }

    fn read_one(&self, id: &str) -> Result<Option<StatusRecord>, OverlayError> {
        match self.db.get(id.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Number of status records currently stored.
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

#[async_trait]
impl StatusOverlay for SledStatusOverlay {
    async fn snapshot(&self) -> Result<OverlaySnapshot, EngineError> {
        Ok(self.read_all()?)
    }

    async fn upsert(&self, id: &ContactId, patch: StatusPatch) -> Result<(), EngineError> {
        let existing = self.read_one(id)?.unwrap_or_default();
        let merged = patch.apply_to(&existing);
        let value = serde_json::to_vec(&merged).map_err(OverlayError::from)?;
        self.db
            .insert(id.as_bytes(), value)
            .map_err(OverlayError::from)?;
        self.db.flush_async().await.map_err(OverlayError::from)?;

        debug!(contact_id = %id, state = %merged.state, "Overlay record upserted");

        // Notify with the post-write snapshot; no subscribers is fine.
        if self.notify.receiver_count() > 0 {
            let snapshot = self.read_all()?;
            let _ = self.notify.send(snapshot);
        }
        Ok(())
    }

    fn subscribe(&self) -> OverlaySubscription {
        OverlaySubscription::new(self.notify.subscribe())
    }
}
