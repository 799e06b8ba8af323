//! Actor identity.
//!
//! The identity/session system is external; the engine only needs a display
//! name to stamp `contacted_by` on status commits.

/// Supplies the display name of the acting user.
pub trait ActorProvider: Send + Sync {
    fn display_name(&self) -> String;
}

/// Fixed actor identity, typically loaded from deployment configuration.
#[derive(Debug, Clone)]
pub struct StaticActor {
    name: String,
}

impl StaticActor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ActorProvider for StaticActor {
    fn display_name(&self) -> String {
        self.name.clone()
    }
}
