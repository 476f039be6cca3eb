//! Step definitions.

use crate::action::Action;
use crate::probe::Probe;
use serde::Serialize;

/// A named provisioning unit.
///
/// Steps are built once when the catalog is assembled and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Unique, stable identifier.
    pub id: String,

    /// Menu key. Assigned by the catalog when not set explicitly.
    pub key: Option<char>,

    /// Human-readable label.
    pub description: String,

    /// Probe reporting whether the step's target state already exists.
    pub precondition: Probe,

    /// Operation performed when the precondition is not satisfied.
    pub action: Action,

    /// A successful action may leave services needing a restart.
    pub restart_sensitive: bool,
}

impl Step {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        precondition: Probe,
        action: Action,
    ) -> Self {
        Self {
            id: id.into(),
            key: None,
            description: description.into(),
            precondition,
            action,
            restart_sensitive: false,
        }
    }

    pub fn with_key(mut self, key: char) -> Self {
        self.key = Some(key);
        self
    }

    pub fn restart_sensitive(mut self, sensitive: bool) -> Self {
        self.restart_sensitive = sensitive;
        self
    }
}
