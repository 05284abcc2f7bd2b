use rolekeeper_core::{AppError, AppResult, PrincipalId};
use serde::{Deserialize, Serialize};

/// Terminal result of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// The principal holds at least one required capability.
    Allow,
    /// The principal holds none of the required capabilities.
    Deny,
}

impl AccessDecision {
    /// Returns a stable storage value for this decision.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }

    /// Returns whether access was allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts a denial into a forbidden error for boundary layers.
    pub fn ensure_allowed(&self, principal_id: PrincipalId, required: &[&str]) -> AppResult<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny => Err(AppError::Forbidden(format!(
                "principal '{principal_id}' holds none of the required roles [{}]",
                required.join(", ")
            ))),
        }
    }
}
