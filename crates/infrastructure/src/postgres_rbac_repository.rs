use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use rolekeeper_application::{AssignmentRepository, RoleDeletion, RoleRepository};
use rolekeeper_core::{Actor, AppError, AppResult, AssignmentId, PrincipalId, RoleId};
use rolekeeper_domain::{
    ActivationOutcome, AssignmentChange, AssignmentHistoryEntry, DeactivationOutcome, Role,
    RoleAssignment, RoleName,
};

mod assignments;
mod roles;


/// PostgreSQL-backed role catalog and assignment store.
///
/// The at-most-one-active-row rule is enforced by the partial unique index on
/// `rbac_role_assignments` and by a single conditional upsert per activation.
#[derive(Clone)]
pub struct PostgresRbacRepository {
    pool: PgPool,
}

impl PostgresRbacRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: uuid::Uuid,
    name: String,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Ok(Role::new(RoleId::from_uuid(row.id), RoleName::new(row.name)?))
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: uuid::Uuid,
    principal_id: uuid::Uuid,
    role_id: uuid::Uuid,
    assigned_by_kind: String,
    assigned_by: Option<uuid::Uuid>,
    assigned_at: DateTime<Utc>,
    is_active: bool,
}

impl From<AssignmentRow> for RoleAssignment {
    fn from(row: AssignmentRow) -> Self {
        Self {
            id: AssignmentId::from_uuid(row.id),
            principal_id: PrincipalId::from_uuid(row.principal_id),
            role_id: RoleId::from_uuid(row.role_id),
            assigned_by: Actor::from_storage(
                row.assigned_by_kind.as_str(),
                row.assigned_by.map(PrincipalId::from_uuid),
            ),
            assigned_at: row.assigned_at,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, FromRow)]
struct UpsertedAssignmentRow {
    #[sqlx(flatten)]
    assignment: AssignmentRow,
    inserted: bool,
}

#[derive(Debug, FromRow)]
struct AssignmentEventRow {
    sequence: i64,
    change: String,
    role_name: String,
    actor_kind: String,
    actor_id: Option<uuid::Uuid>,
    occurred_at: DateTime<Utc>,
    assignment_id: uuid::Uuid,
    principal_id: uuid::Uuid,
    role_id: uuid::Uuid,
    assigned_by_kind: String,
    assigned_by: Option<uuid::Uuid>,
    assigned_at: DateTime<Utc>,
    is_active: bool,
}

impl TryFrom<AssignmentEventRow> for AssignmentHistoryEntry {
    type Error = AppError;

    fn try_from(row: AssignmentEventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            sequence: row.sequence,
            change: row.change.parse::<AssignmentChange>()?,
            role_name: row.role_name,
            actor: Actor::from_storage(
                row.actor_kind.as_str(),
                row.actor_id.map(PrincipalId::from_uuid),
            ),
            occurred_at: row.occurred_at,
            assignment: RoleAssignment::from(AssignmentRow {
                id: row.assignment_id,
                principal_id: row.principal_id,
                role_id: row.role_id,
                assigned_by_kind: row.assigned_by_kind,
                assigned_by: row.assigned_by,
                assigned_at: row.assigned_at,
                is_active: row.is_active,
            }),
        })
    }
}

#[async_trait]
impl RoleRepository for PostgresRbacRepository {
    async fn create_role(&self, role: Role) -> AppResult<Role> {
        self.create_role_impl(role).await
    }

    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        self.find_role_by_id_impl(role_id).await
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        self.find_role_by_name_impl(name).await
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.list_roles_impl().await
    }

    async fn delete_role_if_unused(&self, role_id: RoleId) -> AppResult<RoleDeletion> {
        self.delete_role_if_unused_impl(role_id).await
    }
}

#[async_trait]
impl AssignmentRepository for PostgresRbacRepository {
    async fn activate_assignment(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<ActivationOutcome> {
        self.activate_assignment_impl(principal_id, role, actor, now)
            .await
    }

    async fn deactivate_assignment(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<DeactivationOutcome> {
        self.deactivate_assignment_impl(principal_id, role, actor, now)
            .await
    }

    async fn list_active_roles(&self, principal_id: PrincipalId) -> AppResult<Vec<Role>> {
        self.list_active_roles_impl(principal_id).await
    }

    async fn list_history(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<AssignmentHistoryEntry>> {
        self.list_history_impl(principal_id).await
    }
}

fn map_role_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::DuplicateName(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to create role: {error}"))
}
