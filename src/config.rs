//! Configuration system.
//!
//! Layered configuration: defaults, then an optional TOML file, then
//! `OUTREACH_*` environment variable overrides. Deployment-wide settings are
//! explicit fields here and are passed into the engine constructors, never
//! read as ambient globals.

use crate::error::EngineError;
use crate::handoff::LinkConfig;
use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachConfig {
    /// Script endpoint returning the roster as a JSON array.
    #[serde(default)]
    pub roster_endpoint: String,

    /// Messaging deep-link settings.
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Path of the local status overlay database.
    #[serde(default = "default_overlay_path")]
    pub overlay_path: PathBuf,

    /// Display name stamped onto `contacted_by` at commit time.
    #[serde(default = "default_actor_name")]
    pub actor_name: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Messaging settings: link construction plus the organization name
/// substituted into every template body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(flatten)]
    pub link: LinkConfig,

    #[serde(default = "default_organization")]
    pub organization: String,
}

fn default_overlay_path() -> PathBuf {
    ProjectDirs::from("", "", "outreach")
        .map(|dirs| dirs.data_dir().join("status"))
        .unwrap_or_else(|| PathBuf::from(".outreach/status"))
}

fn default_actor_name() -> String {
    "outreach".to_string()
}

fn default_organization() -> String {
    "nuestro equipo".to_string()
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            organization: default_organization(),
        }
    }
}

impl Default for OutreachConfig {
    fn default() -> Self {
        Self {
            roster_endpoint: String::new(),
            messaging: MessagingConfig::default(),
            overlay_path: default_overlay_path(),
            actor_name: default_actor_name(),
            logging: LoggingConfig::default(),
        }
    }
}

impl OutreachConfig {
    /// Load configuration from an optional file plus environment overrides.
    ///
    /// Environment variables use the `OUTREACH_` prefix with `__` as the
    /// nesting separator, e.g. `OUTREACH_MESSAGING__COUNTRY_CODE=549`.
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        } else if let Some(default_path) = Self::default_config_path() {
            if default_path.exists() {
                builder = builder.add_source(File::from(default_path).required(false));
            }
        }

        builder = builder.add_source(Environment::with_prefix("OUTREACH").separator("__"));

        let loaded: OutreachConfig = builder.build()?.try_deserialize()?;
        Ok(loaded)
    }

    /// `$XDG_CONFIG_HOME/outreach/config.toml` (or platform equivalent).
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "outreach").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Validate settings a running engine depends on.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.roster_endpoint.is_empty() {
            return Err(EngineError::ConfigError(
                "roster_endpoint is not configured".to_string(),
            ));
        }
        self.messaging
            .link
            .validate()
            .map_err(EngineError::ConfigError)?;
        if self.actor_name.trim().is_empty() {
            return Err(EngineError::ConfigError(
                "actor_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
