//! Error types for the outreach engine.

use thiserror::Error;

/// Status overlay storage errors
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Overlay store error: {0}")]
    Store(#[from] sled::Error),

    #[error("Overlay codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Overlay I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Engine-level errors surfaced to callers as tagged results.
///
/// Nothing in the engine panics on a failure path; every fallible operation
/// returns one of these so the host event loop stays alive.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Roster fetch failed or returned a non-enumerable payload. The prior
    /// merged snapshot is retained unchanged.
    #[error("Roster unavailable: {0}")]
    RosterUnavailable(String),

    /// Status commit failed; the workflow session stays retryable.
    #[error("Overlay write failed: {0}")]
    OverlayWriteFailed(String),

    /// Local validation blocked the operation before it reached the overlay.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    /// The workflow session was driven out of order.
    #[error("Invalid workflow transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}
