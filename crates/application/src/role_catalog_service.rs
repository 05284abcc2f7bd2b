use std::sync::Arc;

use rolekeeper_core::{AppError, AppResult, OperationContext, RoleId};
use rolekeeper_domain::{AuditEventType, Role, RoleName};

use crate::{AuditEvent, AuditWriter, RoleDeletion, RoleRepository};

const RESOURCE_ROLE: &str = "role";

/// Application service owning role definitions.
#[derive(Clone)]
pub struct RoleCatalogService {
    repository: Arc<dyn RoleRepository>,
    audit_writer: AuditWriter,
}

impl RoleCatalogService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>, audit_writer: AuditWriter) -> Self {
        Self {
            repository,
            audit_writer,
        }
    }

    /// Creates a role and emits an audit event.
    pub async fn create(&self, context: &OperationContext, name: &str) -> AppResult<Role> {
        let name = RoleName::new(name)?;
        let role = Role::new(RoleId::new(), name.clone());

        match self.repository.create_role(role).await {
            Ok(role) => {
                self.audit_writer
                    .record(
                        context,
                        AuditEvent::success(AuditEventType::RoleCreated)
                            .with_resource(RESOURCE_ROLE, role.id().to_string())
                            .with_summary(role.name().as_str())
                            .with_detail("role_name", role.name().as_str()),
                    )
                    .await?;

                Ok(role)
            }
            Err(error @ AppError::DuplicateName(_)) => {
                self.audit_writer
                    .record(
                        context,
                        AuditEvent::failure(AuditEventType::RoleCreated, "duplicate_name")
                            .with_summary(name.as_str())
                            .with_detail("role_name", name.as_str()),
                    )
                    .await?;

                Err(error)
            }
            Err(error) => Err(error),
        }
    }

    /// Returns a role by exact name.
    pub async fn get_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        self.repository.find_role_by_name(name.trim()).await
    }

    /// Returns a role by identifier.
    pub async fn get_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        self.repository.find_role_by_id(role_id).await
    }

    /// Lists all roles sorted by name.
    pub async fn list(&self) -> AppResult<Vec<Role>> {
        self.repository.list_roles().await
    }

    /// Deletes a role unless it is actively assigned.
    ///
    /// A blocked deletion is audited as a failure and surfaced as `InUse`.
    pub async fn delete(&self, context: &OperationContext, role_id: RoleId) -> AppResult<Role> {
        match self.repository.delete_role_if_unused(role_id).await? {
            RoleDeletion::Deleted(role) => {
                self.audit_writer
                    .record(
                        context,
                        AuditEvent::success(AuditEventType::RoleDeleted)
                            .with_resource(RESOURCE_ROLE, role_id.to_string())
                            .with_summary(role.name().as_str())
                            .with_detail("role_name", role.name().as_str()),
                    )
                    .await?;

                Ok(role)
            }
            RoleDeletion::InUse {
                role,
                active_assignments,
            } => {
                self.audit_writer
                    .record(
                        context,
                        AuditEvent::failure(AuditEventType::RoleDeleted, "in_use")
                            .with_resource(RESOURCE_ROLE, role_id.to_string())
                            .with_summary(role.name().as_str())
                            .with_detail("role_name", role.name().as_str())
                            .with_detail("active_assignments", active_assignments),
                    )
                    .await?;

                Err(AppError::InUse(format!(
                    "role '{}' has {active_assignments} active assignment(s)",
                    role.name()
                )))
            }
            RoleDeletion::NotFound => Err(AppError::NotFound(format!(
                "role '{role_id}' was not found"
            ))),
        }
    }
}
