//! Core data types shared across the engine.
//!
//! Wire field names stay in the deployment locale (the roster endpoint and
//! the status store both speak Spanish); the Rust identifiers are English.
//! Serde renames bridge the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Contact identifier, unique within one roster.
pub type ContactId = String;

/// Some roster cells arrive as numbers when the sheet stores them unquoted.
fn de_stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stringish {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Stringish>::deserialize(deserializer)?.map(|v| match v {
        Stringish::Text(s) => s,
        Stringish::Number(n) => n.to_string(),
    }))
}

/// One immutable roster row. Everything except `id` and `name` is optional;
/// sheet columns come and go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: ContactId,

    #[serde(rename = "nombre")]
    pub name: String,

    #[serde(rename = "telefono", default, deserialize_with = "de_stringish")]
    pub phone: Option<String>,

    #[serde(rename = "telefono2", default, deserialize_with = "de_stringish")]
    pub phone_alt: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(rename = "localidad", default)]
    pub locality: Option<String>,

    #[serde(rename = "rol", default)]
    pub role: Option<String>,

    #[serde(rename = "dni", default, deserialize_with = "de_stringish")]
    pub national_id: Option<String>,

    #[serde(rename = "genero", default)]
    pub gender: Option<String>,

    #[serde(rename = "experiencia", default)]
    pub experience: Option<String>,

    #[serde(rename = "preferencias", default)]
    pub preferences: Option<String>,
}

/// Communication status. Exactly two values; absence from the overlay means
/// `NotContacted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContactState {
    #[serde(rename = "Comunicado")]
    Contacted,

    #[default]
    #[serde(rename = "Incomunicado")]
    NotContacted,
}

impl ContactState {
    pub fn as_wire(&self) -> &'static str {
        match self {
            ContactState::Contacted => "Comunicado",
            ContactState::NotContacted => "Incomunicado",
        }
    }
}

impl fmt::Display for ContactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// One overlay record, keyed externally by [`ContactId`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(rename = "estado", default)]
    pub state: ContactState,

    #[serde(rename = "ultimoComunicacion", default)]
    pub last_contacted_at: Option<DateTime<Utc>>,

    #[serde(rename = "comunicadoPor", default)]
    pub contacted_by: Option<String>,
}

/// Partial status write. `None` fields leave the stored value untouched;
/// writes never blank a field they do not carry.
#[derive(Debug, Clone, Default)]
pub struct StatusPatch {
    pub state: Option<ContactState>,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub contacted_by: Option<String>,
}

impl StatusPatch {
    /// Merge this patch onto an existing record.
    pub fn apply_to(&self, existing: &StatusRecord) -> StatusRecord {
        StatusRecord {
            state: self.state.unwrap_or(existing.state),
            last_contacted_at: self.last_contacted_at.or(existing.last_contacted_at),
            contacted_by: self
                .contacted_by
                .clone()
                .or_else(|| existing.contacted_by.clone()),
        }
    }
}

/// Full contents of the status overlay at one point in time.
pub type OverlaySnapshot = HashMap<ContactId, StatusRecord>;

/// One contact in the unified view: the roster row with the overlay status
/// flattened in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedContact {
    #[serde(flatten)]
    pub record: ContactRecord,

    #[serde(rename = "estado", default)]
    pub state: ContactState,

    #[serde(rename = "ultimoComunicacion", default)]
    pub last_contacted_at: Option<DateTime<Utc>>,

    #[serde(rename = "comunicadoPor", default)]
    pub contacted_by: Option<String>,
}

impl MergedContact {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn is_contacted(&self) -> bool {
        self.state == ContactState::Contacted
    }
}
