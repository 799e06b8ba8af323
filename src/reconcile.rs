//! Roster/overlay reconciliation.
//!
//! A pure merge over two injected snapshots: the enumerable roster and the
//! keyed status overlay. All I/O happens in the external collaborators; the
//! merge itself is deterministic and re-runnable with whatever inputs are
//! currently cached, which is what makes concurrent refresh triggers safe
//! without locking.

use crate::types::{ContactRecord, MergedContact, OverlaySnapshot};

/// Merge the roster and the status overlay into the unified contact view.
///
/// Roster order is preserved (it is the canonical display order). Identifiers
/// absent from the overlay get the default `NotContacted` status; overlay
/// entries with no backing roster record are ignored.
///
/// O(n) over the roster with O(1) overlay lookups.
pub fn reconcile(roster: &[ContactRecord], overlay: &OverlaySnapshot) -> Vec<MergedContact> {
    roster
        .iter()
        .map(|record| match overlay.get(&record.id) {
            Some(status) => MergedContact {
                record: record.clone(),
                state: status.state,
                last_contacted_at: status.last_contacted_at,
                contacted_by: status.contacted_by.clone(),
            },
            None => MergedContact {
                record: record.clone(),
                state: Default::default(),
                last_contacted_at: None,
                contacted_by: None,
            },
        })
        .collect()
}
