//! Communication workflow: a guarded state machine from contact selection to
//! status commit.
//!
//! Re-messaging an already-contacted person requires an explicit human
//! acknowledgement (the warning gate) to discourage redundant outreach. The
//! commit step is the single mutation path for status records: nothing
//! external changes before `Committed`, so cancelling a session at any
//! earlier point needs no compensating action.

use crate::error::EngineError;
use crate::handoff::{build_deep_link, DeepLink, LinkConfig, MessageHandoff};
use crate::identity::ActorProvider;
use crate::overlay::StatusOverlay;
use crate::types::{ContactState, MergedContact, StatusPatch};
use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Time-of-day greeting used in every template, in the deployment locale's
/// phrasing. Thresholds: before 12:00 morning, before 18:00 afternoon.
pub fn greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Buenos días"
    } else if hour < 18 {
        "Buenas tardes"
    } else {
        "Buenas noches"
    }
}

/// Message template selection: a fixed enumerated set plus one free-text
/// variant carrying its own payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageTemplate {
    InitialGreeting,
    Reminder,
    Invitation,
    FeedbackRequest,
    FollowUp,
    Custom(String),
}

impl MessageTemplate {
    /// Slugs accepted from the CLI and stored in drafts.
    pub fn from_slug(slug: &str, custom_body: Option<String>) -> Result<Self, EngineError> {
        match slug {
            "initial-greeting" => Ok(MessageTemplate::InitialGreeting),
            "reminder" => Ok(MessageTemplate::Reminder),
            "invitation" => Ok(MessageTemplate::Invitation),
            "feedback-request" => Ok(MessageTemplate::FeedbackRequest),
            "follow-up" => Ok(MessageTemplate::FollowUp),
            "custom" => Ok(MessageTemplate::Custom(custom_body.unwrap_or_default())),
            other => Err(EngineError::ValidationFailed(format!(
                "Unknown message template: {}",
                other
            ))),
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            MessageTemplate::InitialGreeting => "initial-greeting",
            MessageTemplate::Reminder => "reminder",
            MessageTemplate::Invitation => "invitation",
            MessageTemplate::FeedbackRequest => "feedback-request",
            MessageTemplate::FollowUp => "follow-up",
            MessageTemplate::Custom(_) => "custom",
        }
    }

    /// Resolve the message body: greeting and contact name substituted into
    /// the fixed per-template string. The fixed templates are non-empty by
    /// construction; `Custom` requires non-empty free text.
    pub fn resolve(&self, name: &str, organization: &str, hour: u32) -> Result<String, EngineError> {
        let saludo = greeting(hour);
        let body = match self {
            MessageTemplate::InitialGreeting => format!(
                "{} {}, soy del equipo de {}. ¿Cómo está usted?",
                saludo, name, organization
            ),
            MessageTemplate::Reminder => format!(
                "{} {}, le escribo desde {} para recordarle sobre nuestras próximas actividades.",
                saludo, name, organization
            ),
            MessageTemplate::Invitation => format!(
                "{} {}, lo invitamos cordialmente a participar en nuestras actividades de {}.",
                saludo, name, organization
            ),
            MessageTemplate::FeedbackRequest => format!(
                "{} {}, desde {} queremos conocer su opinión sobre los temas que nos ocupan.",
                saludo, name, organization
            ),
            MessageTemplate::FollowUp => format!(
                "{} {}, nos comunicamos desde {} para hacer un seguimiento de nuestras conversaciones anteriores.",
                saludo, name, organization
            ),
            MessageTemplate::Custom(text) => {
                if text.trim().is_empty() {
                    return Err(EngineError::ValidationFailed(
                        "Custom message body cannot be empty".to_string(),
                    ));
                }
                text.clone()
            }
        };
        Ok(body)
    }
}

/// Workflow phases. `Committed` and `Cancelled` are terminal; a new
/// `initiate` always starts a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Selected,
    WarningGate,
    Composing,
    Sending,
    Committed,
    Cancelled,
}

/// One user-driven attempt to contact a person. Transient; never persisted.
#[derive(Debug, Clone)]
pub struct WorkflowSession {
    contact: MergedContact,
    phase: Phase,
    template: Option<MessageTemplate>,
    warning_acknowledged: bool,
}

impl WorkflowSession {
    /// Start a session for the selected contact.
    pub fn initiate(contact: MergedContact) -> Self {
        Self {
            contact,
            phase: Phase::Selected,
            template: None,
            warning_acknowledged: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn contact(&self) -> &MergedContact {
        &self.contact
    }

    pub fn template(&self) -> Option<&MessageTemplate> {
        self.template.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Committed | Phase::Cancelled)
    }

    /// Leave `Selected`: an already-contacted person routes through the
    /// warning gate, everyone else goes straight to composing.
    pub fn begin(&mut self) -> Result<Phase, EngineError> {
        if self.phase != Phase::Selected {
            return Err(EngineError::InvalidTransition(format!(
                "begin from {:?}",
                self.phase
            )));
        }
        self.phase = if self.contact.state == ContactState::Contacted {
            Phase::WarningGate
        } else {
            Phase::Composing
        };
        Ok(self.phase)
    }

    /// Explicit human override of the re-contact warning.
    pub fn acknowledge_warning(&mut self) -> Result<(), EngineError> {
        if self.phase != Phase::WarningGate {
            return Err(EngineError::InvalidTransition(format!(
                "acknowledge from {:?}",
                self.phase
            )));
        }
        self.warning_acknowledged = true;
        self.phase = Phase::Composing;
        Ok(())
    }

    /// Back out at the warning gate.
    pub fn decline_warning(&mut self) -> Result<(), EngineError> {
        if self.phase != Phase::WarningGate {
            return Err(EngineError::InvalidTransition(format!(
                "decline from {:?}",
                self.phase
            )));
        }
        self.phase = Phase::Cancelled;
        Ok(())
    }

    pub fn warning_acknowledged(&self) -> bool {
        self.warning_acknowledged
    }

    /// Pick the message template while composing. The draft survives a failed
    /// commit, so re-selection after an error is also routed here.
    pub fn choose_template(&mut self, template: MessageTemplate) -> Result<(), EngineError> {
        if self.phase != Phase::Composing {
            return Err(EngineError::InvalidTransition(format!(
                "choose_template from {:?}",
                self.phase
            )));
        }
        self.template = Some(template);
        Ok(())
    }

    /// Resolve the current draft without transitioning (message preview).
    pub fn preview(&self, organization: &str, hour: u32) -> Result<String, EngineError> {
        let template = self.template.as_ref().ok_or_else(|| {
            EngineError::ValidationFailed("No message template selected".to_string())
        })?;
        template.resolve(&self.contact.record.name, organization, hour)
    }

    /// Abandon the session. Allowed from any non-terminal state; nothing
    /// external was mutated before `Committed`, so there is nothing to undo.
    pub fn cancel(&mut self) -> Result<(), EngineError> {
        if self.is_terminal() {
            return Err(EngineError::InvalidTransition(format!(
                "cancel from {:?}",
                self.phase
            )));
        }
        self.phase = Phase::Cancelled;
        Ok(())
    }
}

/// Drives `Composing → Sending → Committed` against the injected
/// collaborators: link handoff, status overlay, and actor identity.
pub struct MessageDispatcher<'a> {
    overlay: &'a dyn StatusOverlay,
    handoff: &'a dyn MessageHandoff,
    actor: &'a dyn ActorProvider,
    link: &'a LinkConfig,
    organization: &'a str,
}

impl<'a> MessageDispatcher<'a> {
    pub fn new(
        overlay: &'a dyn StatusOverlay,
        handoff: &'a dyn MessageHandoff,
        actor: &'a dyn ActorProvider,
        link: &'a LinkConfig,
        organization: &'a str,
    ) -> Self {
        Self {
            overlay,
            handoff,
            actor,
            link,
            organization,
        }
    }

    /// Send the drafted message and commit the status transition.
    pub async fn send(&self, session: &mut WorkflowSession) -> Result<DeepLink, EngineError> {
        self.send_at(session, Utc::now(), Local::now().hour()).await
    }

    /// `send` with an explicit commit timestamp and greeting hour.
    pub async fn send_at(
        &self,
        session: &mut WorkflowSession,
        now: DateTime<Utc>,
        hour: u32,
    ) -> Result<DeepLink, EngineError> {
        if session.phase != Phase::Composing {
            return Err(EngineError::InvalidTransition(format!(
                "send from {:?}",
                session.phase
            )));
        }

        // Validation failures block the transition locally; the session never
        // leaves Composing and nothing reaches the overlay.
        let body = session.preview(self.organization, hour)?;
        let phone = session.contact.record.phone.as_deref().ok_or_else(|| {
            EngineError::ValidationFailed(format!(
                "Contact {} has no phone number",
                session.contact.id()
            ))
        })?;
        let link = build_deep_link(self.link, phone, &body)?;

        session.phase = Phase::Sending;
        // Fire-and-forget: delivery is assumed, not confirmed.
        self.handoff.deliver(&link);

        let patch = StatusPatch {
            state: Some(ContactState::Contacted),
            last_contacted_at: Some(now),
            contacted_by: Some(self.actor.display_name()),
        };
        match self.overlay.upsert(&session.contact.record.id, patch).await {
            Ok(()) => {
                session.phase = Phase::Committed;
                info!(
                    contact_id = %session.contact.id(),
                    template = %session.template.as_ref().map(|t| t.slug()).unwrap_or("custom"),
                    "Contact status committed"
                );
                Ok(link)
            }
            Err(e) => {
                // Keep a forward path: back to Composing with the draft intact
                // so the user can retry without retyping.
                session.phase = Phase::Composing;
                warn!(contact_id = %session.contact.id(), error = %e, "Status commit failed");
                Err(EngineError::OverlayWriteFailed(e.to_string()))
            }
        }
    }
}
