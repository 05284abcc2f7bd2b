use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rolekeeper_core::{Actor, AppResult, PrincipalId};
use rolekeeper_domain::{ActivationOutcome, AssignmentHistoryEntry, DeactivationOutcome, Role};

/// Repository port for principal-to-role assignments and their history.
///
/// Implementations enforce at most one active row per `(principal, role)` pair
/// at the storage level and append exactly one history entry per state change.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Atomically creates, reactivates, or leaves untouched the pair's row.
    ///
    /// Fails with `NotFound` when the role no longer exists.
    async fn activate_assignment(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<ActivationOutcome>;

    /// Atomically soft-deletes the pair's row when it is active.
    async fn deactivate_assignment(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<DeactivationOutcome>;

    /// Lists roles with an active assignment for the principal.
    async fn list_active_roles(&self, principal_id: PrincipalId) -> AppResult<Vec<Role>>;

    /// Lists every history entry for the principal, newest first.
    async fn list_history(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<AssignmentHistoryEntry>>;
}
