use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use rolekeeper_application::{AssignmentRepository, RoleDeletion, RoleRepository};
use rolekeeper_core::{Actor, AppError, AppResult, PrincipalId, RoleId};
use rolekeeper_domain::{
    ActivationOutcome, AssignmentHistoryEntry, AssignmentLedger, DeactivationOutcome, Role,
};

#[derive(Debug, Default)]
struct RbacState {
    roles: HashMap<RoleId, Role>,
    ledger: AssignmentLedger,
}

/// In-memory role catalog and assignment store.
///
/// Roles and the assignment ledger share one lock, so every pair transition
/// and the role deletion guard observe a consistent snapshot.
#[derive(Debug, Default)]
pub struct InMemoryRbacRepository {
    state: RwLock<RbacState>,
}

impl InMemoryRbacRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRbacRepository {
    async fn create_role(&self, role: Role) -> AppResult<Role> {
        let mut state = self.state.write().await;

        if state.roles.values().any(|stored| stored.name() == role.name()) {
            return Err(AppError::DuplicateName(format!(
                "role '{}' already exists",
                role.name()
            )));
        }

        state.roles.insert(role.id(), role.clone());
        Ok(role)
    }

    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(&role_id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let state = self.state.read().await;

        Ok(state
            .roles
            .values()
            .find(|role| role.name().as_str() == name)
            .cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;

        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn delete_role_if_unused(&self, role_id: RoleId) -> AppResult<RoleDeletion> {
        let mut state = self.state.write().await;

        let Some(role) = state.roles.get(&role_id).cloned() else {
            return Ok(RoleDeletion::NotFound);
        };

        let active_assignments = state.ledger.active_count_for_role(role_id);
        if active_assignments > 0 {
            return Ok(RoleDeletion::InUse {
                role,
                active_assignments: u64::try_from(active_assignments).unwrap_or(u64::MAX),
            });
        }

        state.roles.remove(&role_id);
        Ok(RoleDeletion::Deleted(role))
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryRbacRepository {
    async fn activate_assignment(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<ActivationOutcome> {
        let mut state = self.state.write().await;

        if !state.roles.contains_key(&role.id()) {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                role.id()
            )));
        }

        Ok(state.ledger.activate(principal_id, role, actor, now))
    }

    async fn deactivate_assignment(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<DeactivationOutcome> {
        let mut state = self.state.write().await;
        Ok(state.ledger.deactivate(principal_id, role, actor, now))
    }

    async fn list_active_roles(&self, principal_id: PrincipalId) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;

        let mut roles: Vec<Role> = state
            .ledger
            .active_role_ids(principal_id)
            .into_iter()
            .filter_map(|role_id| state.roles.get(&role_id).cloned())
            .collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn list_history(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<AssignmentHistoryEntry>> {
        Ok(self.state.read().await.ledger.history(principal_id))
    }
}
