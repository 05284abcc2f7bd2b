use std::sync::Arc;

use rolekeeper_core::{AppError, AppResult, PrincipalId, RoleId};
use rolekeeper_domain::Role;

use crate::{AssignmentRepository, AuditWriter, PrincipalDirectory, RoleRepository};

mod mutations;
mod queries;


/// Application service owning principal-to-role assignments.
///
/// Unassigning is a soft delete: rows are never removed and every transition
/// is kept in the principal's history.
///
/// Audit receipts are not returned to callers. A compliance store failure is
/// reported by `AuditWriter` as a warning and a critical structured log record.
#[derive(Clone)]
pub struct AssignmentService {
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    principals: Arc<dyn PrincipalDirectory>,
    audit_writer: AuditWriter,
}

impl AssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        principals: Arc<dyn PrincipalDirectory>,
        audit_writer: AuditWriter,
    ) -> Self {
        Self {
            roles,
            assignments,
            principals,
            audit_writer,
        }
    }

    async fn require_principal(&self, principal_id: PrincipalId) -> AppResult<()> {
        if self.principals.principal_exists(principal_id).await? {
            return Ok(());
        }

        Err(AppError::NotFound(format!(
            "principal '{principal_id}' was not found"
        )))
    }

    async fn resolve_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<Role>> {
        let mut roles = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            let role = self
                .roles
                .find_role_by_id(*role_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
            roles.push(role);
        }

        Ok(roles)
    }
}
