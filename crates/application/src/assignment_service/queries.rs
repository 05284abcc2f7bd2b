use super::*;

use rolekeeper_domain::AssignmentHistoryEntry;

impl AssignmentService {
    /// Returns roles currently granted to the principal, sorted by name.
    pub async fn active_roles(&self, principal_id: PrincipalId) -> AppResult<Vec<Role>> {
        self.require_principal(principal_id).await?;
        self.assignments.list_active_roles(principal_id).await
    }

    /// Returns every assignment transition for the principal, newest first.
    ///
    /// Inactive rows are never filtered out.
    pub async fn history(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<AssignmentHistoryEntry>> {
        self.require_principal(principal_id).await?;
        self.assignments.list_history(principal_id).await
    }
}
