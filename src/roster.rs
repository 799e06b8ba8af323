//! Roster provider abstraction.
//!
//! The roster is an external, read-only batch source (a spreadsheet published
//! through a script endpoint). It is fetched on demand only — never polled —
//! because the overlay carries the live signal.

use crate::error::EngineError;
use crate::types::ContactRecord;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Source of the enumerable contact roster.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Fetch the full roster. Any transport or payload-shape failure is
    /// `RosterUnavailable`; callers retain their last-good snapshot.
    async fn fetch(&self) -> Result<Vec<ContactRecord>, EngineError>;
}

const ROSTER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ROSTER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_roster_http_client() -> Result<Client, EngineError> {
    Client::builder()
        .connect_timeout(ROSTER_HTTP_CONNECT_TIMEOUT)
        .timeout(ROSTER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| EngineError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

fn map_http_error(error: reqwest::Error) -> EngineError {
    if error.is_timeout() {
        EngineError::RosterUnavailable(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        EngineError::RosterUnavailable(format!("Connection error: {}", error))
    } else {
        EngineError::RosterUnavailable(format!("HTTP error: {}", error))
    }
}

/// HTTP roster provider for the script endpoint.
///
/// The endpoint answers a GET with a JSON array of contact rows; anything
/// other than an array payload is an error, not an empty roster.
#[derive(Debug)]
pub struct HttpRosterProvider {
    client: Client,
    endpoint: String,
}

impl HttpRosterProvider {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, EngineError> {
        let endpoint = endpoint.into();
        if endpoint.is_empty() {
            return Err(EngineError::ConfigError(
                "Roster endpoint cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            client: build_roster_http_client()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Parse the roster payload, requiring a JSON-array shape.
pub(crate) fn parse_roster_payload(payload: serde_json::Value) -> Result<Vec<ContactRecord>, EngineError> {
    if !payload.is_array() {
        return Err(EngineError::RosterUnavailable(
            "Roster payload is not an array".to_string(),
        ));
    }
    serde_json::from_value(payload)
        .map_err(|e| EngineError::RosterUnavailable(format!("Failed to parse roster rows: {}", e)))
}

#[async_trait]
impl RosterProvider for HttpRosterProvider {
    async fn fetch(&self) -> Result<Vec<ContactRecord>, EngineError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EngineError::RosterUnavailable(format!(
                "Request failed with status {}: {}",
                status, error_text
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EngineError::RosterUnavailable(format!("Failed to parse response: {}", e)))?;

        let records = parse_roster_payload(payload)?;
        debug!(count = records.len(), "Fetched roster");
        Ok(records)
    }
}
