//! Shared test doubles: in-memory collaborators with failure toggles.

use async_trait::async_trait;
use outreach::error::EngineError;
use outreach::handoff::{DeepLink, MessageHandoff};
use outreach::overlay::{OverlaySubscription, StatusOverlay};
use outreach::roster::RosterProvider;
use outreach::types::{ContactId, ContactRecord, OverlaySnapshot, StatusPatch, StatusRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

pub fn record(id: &str, name: &str, phone: Option<&str>, locality: Option<&str>) -> ContactRecord {
    ContactRecord {
        id: id.to_string(),
        name: name.to_string(),
        phone: phone.map(str::to_string),
        phone_alt: None,
        email: None,
        locality: locality.map(str::to_string),
        role: None,
        national_id: None,
        gender: None,
        experience: None,
        preferences: None,
    }
}

/// Roster provider over a fixed record set, with a failure toggle.
pub struct StaticRoster {
    records: Vec<ContactRecord>,
    fail: AtomicBool,
}

impl StaticRoster {
    pub fn new(records: Vec<ContactRecord>) -> Self {
        Self {
            records,
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RosterProvider for StaticRoster {
    async fn fetch(&self) -> Result<Vec<ContactRecord>, EngineError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EngineError::RosterUnavailable(
                "simulated fetch failure".to_string(),
            ));
        }
        Ok(self.records.clone())
    }
}

/// Roster provider whose fetches block until explicitly released, for
/// exercising in-flight request supersession. Permits release FIFO, so
/// fetches complete in issue order.
pub struct GatedRoster {
    records: Mutex<Vec<ContactRecord>>,
    gate: tokio::sync::Semaphore,
}

impl GatedRoster {
    pub fn new(records: Vec<ContactRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            gate: tokio::sync::Semaphore::new(0),
        }
    }

    pub fn set_records(&self, records: Vec<ContactRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn release(&self, fetches: usize) {
        self.gate.add_permits(fetches);
    }
}

#[async_trait]
impl RosterProvider for GatedRoster {
    async fn fetch(&self) -> Result<Vec<ContactRecord>, EngineError> {
        // Snapshot at call entry; the gate only delays completion.
        let records = self.records.lock().unwrap().clone();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| EngineError::RosterUnavailable(e.to_string()))?;
        permit.forget();
        Ok(records)
    }
}

/// In-memory status overlay with a write-failure toggle.
pub struct MemoryOverlay {
    records: Mutex<OverlaySnapshot>,
    notify: broadcast::Sender<OverlaySnapshot>,
    fail_writes: AtomicBool,
}

impl MemoryOverlay {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(16);
        Self {
            records: Mutex::new(OverlaySnapshot::new()),
            notify,
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn with_record(self, id: &str, record: StatusRecord) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(id.to_string(), record);
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self, id: &str) -> Option<StatusRecord> {
        self.records.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl StatusOverlay for MemoryOverlay {
    async fn snapshot(&self) -> Result<OverlaySnapshot, EngineError> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn upsert(&self, id: &ContactId, patch: StatusPatch) -> Result<(), EngineError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(EngineError::OverlayWriteFailed(
                "simulated write failure".to_string(),
            ));
        }
        let snapshot = {
            let mut records = self.records.lock().unwrap();
            let existing = records.get(id).cloned().unwrap_or_default();
            records.insert(id.clone(), patch.apply_to(&existing));
            records.clone()
        };
        if self.notify.receiver_count() > 0 {
            let _ = self.notify.send(snapshot);
        }
        Ok(())
    }

    fn subscribe(&self) -> OverlaySubscription {
        OverlaySubscription::new(self.notify.subscribe())
    }
}

/// Handoff that records every delivered link.
#[derive(Default)]
pub struct RecordingHandoff {
    links: Mutex<Vec<DeepLink>>,
}

impl RecordingHandoff {
    pub fn delivered(&self) -> Vec<DeepLink> {
        self.links.lock().unwrap().clone()
    }
}

impl MessageHandoff for RecordingHandoff {
    fn deliver(&self, link: &DeepLink) {
        self.links.lock().unwrap().push(link.clone());
    }
}
