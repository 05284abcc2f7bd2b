use std::sync::Arc;

use tracing::warn;

use rolekeeper_core::PrincipalId;

use crate::AssignmentRepository;

/// Capability check result with the role sets that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityEvaluation {
    /// Normalized, non-blank capability names that were requested.
    pub required: Vec<String>,
    /// Role names actively held by the principal, sorted.
    pub held: Vec<String>,
    /// First requested capability the principal holds.
    pub matched: Option<String>,
}

impl CapabilityEvaluation {
    /// Returns whether any requested capability is held.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.matched.is_some()
    }
}

/// Decides whether a principal holds a capability.
///
/// A capability is a role name. Checks never fail: blank or unknown names,
/// unknown principals and storage errors all evaluate to "not held". Calls are
/// not audited here; `AccessGate` audits decisions.
#[derive(Clone)]
pub struct AuthorizationService {
    assignments: Arc<dyn AssignmentRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from an assignment repository.
    #[must_use]
    pub fn new(assignments: Arc<dyn AssignmentRepository>) -> Self {
        Self { assignments }
    }

    /// Returns whether the principal actively holds the named capability.
    pub async fn has_capability(&self, principal_id: PrincipalId, capability: Option<&str>) -> bool {
        match capability {
            Some(capability) => self.evaluate(principal_id, &[capability]).await.is_granted(),
            None => false,
        }
    }

    /// Returns whether the principal holds at least one of the capabilities.
    pub async fn has_any_capability(&self, principal_id: PrincipalId, capabilities: &[&str]) -> bool {
        self.evaluate(principal_id, capabilities).await.is_granted()
    }

    /// Evaluates the capabilities against one lookup of the principal's roles.
    ///
    /// Held roles are resolved even when no valid capability was requested.
    pub async fn evaluate(
        &self,
        principal_id: PrincipalId,
        capabilities: &[&str],
    ) -> CapabilityEvaluation {
        let required: Vec<String> = capabilities
            .iter()
            .map(|capability| capability.trim())
            .filter(|capability| !capability.is_empty())
            .map(str::to_owned)
            .collect();

        let held = self.held_role_names(principal_id).await;
        let matched = required
            .iter()
            .find(|capability| held.iter().any(|role_name| role_name == *capability))
            .cloned();

        CapabilityEvaluation {
            required,
            held,
            matched,
        }
    }

    async fn held_role_names(&self, principal_id: PrincipalId) -> Vec<String> {
        match self.assignments.list_active_roles(principal_id).await {
            Ok(roles) => {
                let mut names: Vec<String> = roles
                    .iter()
                    .map(|role| role.name().as_str().to_owned())
                    .collect();
                names.sort();
                names
            }
            Err(error) => {
                warn!(
                    principal_id = %principal_id,
                    error = %error,
                    "failed to resolve active roles; treating principal as holding none"
                );
                Vec::new()
            }
        }
    }
}
