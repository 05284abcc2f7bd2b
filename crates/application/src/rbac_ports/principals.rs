use async_trait::async_trait;

use rolekeeper_core::{AppResult, PrincipalId};

/// Port onto the external identity collaborator that owns principals.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Returns whether the principal is known.
    async fn principal_exists(&self, principal_id: PrincipalId) -> AppResult<bool>;
}
