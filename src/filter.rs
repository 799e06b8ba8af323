//! Filter engine for the merged contact view.
//!
//! Pure, stateless predicate evaluation over the reconciled set, plus the
//! one-shot acknowledgement gate guarding the "show contacted" selector.

use crate::types::{ContactState, MergedContact};
use serde::{Deserialize, Serialize};

/// Status selector for the visible set.
///
/// Distinct from [`ContactState`] because the selector also admits `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSelector {
    #[default]
    NotContacted,
    Contacted,
    All,
}

impl StatusSelector {
    fn admits(&self, state: ContactState) -> bool {
        match self {
            StatusSelector::All => true,
            StatusSelector::Contacted => state == ContactState::Contacted,
            StatusSelector::NotContacted => state == ContactState::NotContacted,
        }
    }
}

/// Filter configuration held by the caller. Pure data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterState {
    /// Free-text term matched case-insensitively against name, phone, and
    /// email substrings. Empty passes everything.
    #[serde(default)]
    pub search: String,

    #[serde(default)]
    pub status: StatusSelector,

    /// Exact-match locality. `None` passes everything.
    #[serde(default)]
    pub locality: Option<String>,
}

impl FilterState {
    /// A filter that passes every contact.
    pub fn pass_all() -> Self {
        FilterState {
            search: String::new(),
            status: StatusSelector::All,
            locality: None,
        }
    }
}

fn matches_search(contact: &MergedContact, term_lower: &str) -> bool {
    if term_lower.is_empty() {
        return true;
    }
    let name_match = contact.record.name.to_lowercase().contains(term_lower);
    let phone_match = contact
        .record
        .phone
        .as_deref()
        .map(|p| p.contains(term_lower))
        .unwrap_or(false);
    let email_match = contact
        .record
        .email
        .as_deref()
        .map(|e| e.to_lowercase().contains(term_lower))
        .unwrap_or(false);
    name_match || phone_match || email_match
}

/// Apply the filter to the merged set.
///
/// Deterministic and order-preserving; the result is always a subset of the
/// input in the same relative order. The three predicates are AND-combined.
pub fn apply_filter(merged: &[MergedContact], filter: &FilterState) -> Vec<MergedContact> {
    let term_lower = filter.search.trim().to_lowercase();
    merged
        .iter()
        .filter(|contact| matches_search(contact, &term_lower))
        .filter(|contact| filter.status.admits(contact.state))
        .filter(|contact| match filter.locality.as_deref() {
            None | Some("") => true,
            Some(locality) => contact.record.locality.as_deref() == Some(locality),
        })
        .cloned()
        .collect()
}

/// De-duplicated localities actually present in the merged set, in first-seen
/// order. Recomputed from the current set on every call: new localities can
/// appear on re-sync, so the options are never cached across cycles.
pub fn locality_options(merged: &[MergedContact]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    merged
        .iter()
        .filter_map(|contact| contact.record.locality.as_deref())
        .filter(|locality| !locality.is_empty())
        .filter(|locality| seen.insert(locality.to_string()))
        .map(|locality| locality.to_string())
        .collect()
}

/// Outcome of a status selector change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The selector changed immediately.
    Applied,
    /// The change is held until [`StatusFilterGate::confirm`] is called.
    ConfirmationRequired,
}

/// One-shot acknowledgement gate in front of the status selector.
///
/// Switching to `Contacted` warns before applying, every time it is
/// attempted; declining leaves the prior selector unchanged. The pending
/// request is not persisted across attempts.
#[derive(Debug, Clone, Default)]
pub struct StatusFilterGate {
    active: StatusSelector,
    pending: Option<StatusSelector>,
}

impl StatusFilterGate {
    pub fn new(initial: StatusSelector) -> Self {
        StatusFilterGate {
            active: initial,
            pending: None,
        }
    }

    pub fn active(&self) -> StatusSelector {
        self.active
    }

    /// Request a selector change. `Contacted` requires confirmation; anything
    /// else applies immediately and clears any pending request.
    pub fn request(&mut self, selector: StatusSelector) -> GateOutcome {
        if selector == StatusSelector::Contacted && self.active != StatusSelector::Contacted {
            self.pending = Some(selector);
            GateOutcome::ConfirmationRequired
        } else {
            self.pending = None;
            self.active = selector;
            GateOutcome::Applied
        }
    }

    /// Apply the pending change, if any.
    pub fn confirm(&mut self) {
        if let Some(selector) = self.pending.take() {
            self.active = selector;
        }
    }

    /// Drop the pending change, keeping the prior selector.
    pub fn decline(&mut self) {
        self.pending = None;
    }
}
