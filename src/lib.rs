//! Outreach: Contact Reconciliation & Communication Workflow
//!
//! Merges an immutable external roster with a live communication-status
//! overlay into one consistent view, keeps it current as either source
//! changes, and drives the guarded workflow for contacting a person.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod handoff;
pub mod identity;
pub mod logging;
pub mod overlay;
pub mod reconcile;
pub mod roster;
pub mod types;
pub mod workflow;
