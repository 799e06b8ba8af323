//! Engine facade: snapshot caches, re-merge triggers, and sync supersession.
//!
//! The engine owns the last-good snapshots of both sources and recomputes the
//! merged view whenever either one changes. Reconciliation is a pure function
//! over the cached inputs, so a sync and an overlay notification can
//! interleave freely; whoever lands last simply re-merges.

use crate::error::EngineError;
use crate::filter::{apply_filter, locality_options, FilterState};
use crate::overlay::{OverlaySubscription, StatusOverlay};
use crate::reconcile::reconcile;
use crate::roster::RosterProvider;
use crate::types::{ContactRecord, MergedContact, OverlaySnapshot};
use crate::workflow::WorkflowSession;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Default)]
struct EngineState {
    roster: Vec<ContactRecord>,
    overlay: OverlaySnapshot,
    merged: Vec<MergedContact>,
    last_synced_at: Option<DateTime<Utc>>,
}

/// Reconciliation engine over one roster provider and one status overlay.
pub struct OutreachEngine {
    roster: Arc<dyn RosterProvider>,
    overlay: Arc<dyn StatusOverlay>,
    state: RwLock<EngineState>,
    sync_generation: AtomicU64,
}

impl OutreachEngine {
    pub fn new(roster: Arc<dyn RosterProvider>, overlay: Arc<dyn StatusOverlay>) -> Self {
        Self {
            roster,
            overlay,
            state: RwLock::new(EngineState::default()),
            sync_generation: AtomicU64::new(0),
        }
    }

    /// Explicit sync: fetch the roster, snapshot the overlay, re-merge.
    ///
    /// A failed fetch retains the prior merged set unchanged — a transient
    /// network failure must not blank the view. Concurrent syncs supersede:
    /// only the most recently issued request may land its result.
    pub async fn sync(&self) -> Result<usize, EngineError> {
        let ticket = self.sync_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let records = match self.roster.fetch().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Roster fetch failed; retaining last-good snapshot");
                return Err(e);
            }
        };

        if self.sync_generation.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "Sync superseded by a newer request; discarding result");
            return Ok(self.state.read().merged.len());
        }

        let overlay_snapshot = self.overlay.snapshot().await?;

        let mut state = self.state.write();
        // Re-check under the lock: a newer sync may have landed while we
        // awaited the overlay snapshot.
        if self.sync_generation.load(Ordering::SeqCst) != ticket {
            return Ok(state.merged.len());
        }
        state.roster = records;
        state.overlay = overlay_snapshot;
        state.merged = reconcile(&state.roster, &state.overlay);
        state.last_synced_at = Some(Utc::now());
        info!(contacts = state.merged.len(), "Roster synced");
        Ok(state.merged.len())
    }

    /// Overlay change notification: re-merge from the cached roster and the
    /// delivered snapshot. The roster is not refetched.
    pub fn apply_overlay_snapshot(&self, snapshot: OverlaySnapshot) {
        let mut state = self.state.write();
        state.overlay = snapshot;
        state.merged = reconcile(&state.roster, &state.overlay);
        debug!(contacts = state.merged.len(), "Re-merged after overlay change");
    }

    /// Subscribe to the overlay; each delivered snapshot should be fed back
    /// through [`apply_overlay_snapshot`]. Dropping the subscription releases
    /// the live-update stream.
    ///
    /// [`apply_overlay_snapshot`]: OutreachEngine::apply_overlay_snapshot
    pub fn subscribe_overlay(&self) -> OverlaySubscription {
        self.overlay.subscribe()
    }

    pub fn overlay(&self) -> Arc<dyn StatusOverlay> {
        Arc::clone(&self.overlay)
    }

    /// Last-good merged view.
    pub fn merged(&self) -> Vec<MergedContact> {
        self.state.read().merged.clone()
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_synced_at
    }

    /// Filtered view of the merged set.
    pub fn visible(&self, filter: &FilterState) -> Vec<MergedContact> {
        apply_filter(&self.state.read().merged, filter)
    }

    /// Locality selector options, derived from the current merged set.
    pub fn locality_options(&self) -> Vec<String> {
        locality_options(&self.state.read().merged)
    }

    pub fn find(&self, id: &str) -> Option<MergedContact> {
        self.state.read().merged.iter().find(|c| c.id() == id).cloned()
    }

    /// Open a workflow session for the given contact.
    pub fn begin_contact(&self, id: &str) -> Result<WorkflowSession, EngineError> {
        let contact = self
            .find(id)
            .ok_or_else(|| EngineError::ContactNotFound(id.to_string()))?;
        Ok(WorkflowSession::initiate(contact))
    }
}
