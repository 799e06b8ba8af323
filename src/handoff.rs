//! Messaging deep-link construction and handoff.
//!
//! The engine never invokes the messaging app programmatically. It constructs
//! the deep-link target and delegates opening it to the host environment;
//! delivery is fire-and-forget and no confirmation is obtainable.

use crate::error::EngineError;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Deep-link construction settings, supplied by deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Base of the messaging scheme, e.g. `https://wa.me`.
    #[serde(default = "default_link_base")]
    pub link_base: String,

    /// Country/area code prefix prepended to the digits-only phone number.
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

fn default_link_base() -> String {
    "https://wa.me".to_string()
}

fn default_country_code() -> String {
    "549".to_string()
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            link_base: default_link_base(),
            country_code: default_country_code(),
        }
    }
}

impl LinkConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.link_base.is_empty() {
            return Err("Link base cannot be empty".to_string());
        }
        if self.country_code.is_empty() || !self.country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("Invalid country code: {:?}", self.country_code));
        }
        Ok(())
    }
}

/// A fully constructed messaging deep link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub url: String,
}

/// Build the `<base>/<countrycode><digits>?text=<urlencoded>` target.
///
/// The phone number is stripped to digits only before the prefix is applied.
/// A phone with no digits at all cannot be linked and fails validation.
pub fn build_deep_link(config: &LinkConfig, phone: &str, body: &str) -> Result<DeepLink, EngineError> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(EngineError::ValidationFailed(format!(
            "Phone number has no digits: {:?}",
            phone
        )));
    }
    let encoded = utf8_percent_encode(body, NON_ALPHANUMERIC);
    Ok(DeepLink {
        url: format!(
            "{}/{}{}?text={}",
            config.link_base.trim_end_matches('/'),
            config.country_code,
            digits,
            encoded
        ),
    })
}

/// Delegate that hands a constructed link to the host environment.
pub trait MessageHandoff: Send + Sync {
    /// Fire-and-forget: the engine never learns whether the message was sent.
    fn deliver(&self, link: &DeepLink);
}

/// Handoff that logs the link and leaves opening it to the operator.
#[derive(Debug, Default)]
pub struct LoggingHandoff;

impl MessageHandoff for LoggingHandoff {
    fn deliver(&self, link: &DeepLink) {
        info!(url = %link.url, "Messaging deep link ready");
    }
}
