use async_trait::async_trait;

use rolekeeper_core::{AppResult, RoleId};
use rolekeeper_domain::Role;

/// Result of a guarded role deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleDeletion {
    /// The role had no active assignments and was removed.
    Deleted(Role),
    /// The role is still actively assigned and was left untouched.
    InUse {
        /// The role that was kept.
        role: Role,
        /// Number of active assignments referencing the role.
        active_assignments: u64,
    },
    /// No role exists with the requested id.
    NotFound,
}

/// Repository port for role definitions.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a new role. Fails with `DuplicateName` when the name is taken.
    async fn create_role(&self, role: Role) -> AppResult<Role>;

    /// Finds a role by identifier.
    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by exact name.
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Lists all roles sorted by name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Removes a role unless an active assignment references it.
    ///
    /// The in-use check and the removal must be one atomic storage operation.
    async fn delete_role_if_unused(&self, role_id: RoleId) -> AppResult<RoleDeletion>;
}
