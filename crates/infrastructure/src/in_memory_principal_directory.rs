use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use rolekeeper_application::PrincipalDirectory;
use rolekeeper_core::{AppResult, PrincipalId};

/// In-memory principal directory for tests and embedded use.
#[derive(Debug, Default)]
pub struct InMemoryPrincipalDirectory {
    principals: RwLock<HashSet<PrincipalId>>,
}

impl InMemoryPrincipalDirectory {
    /// Creates a directory holding the given principals.
    #[must_use]
    pub fn with_principals(principals: impl IntoIterator<Item = PrincipalId>) -> Self {
        Self {
            principals: RwLock::new(principals.into_iter().collect()),
        }
    }

    /// Registers a principal. Returns false when it was already known.
    pub async fn register(&self, principal_id: PrincipalId) -> bool {
        self.principals.write().await.insert(principal_id)
    }
}

#[async_trait]
impl PrincipalDirectory for InMemoryPrincipalDirectory {
    async fn principal_exists(&self, principal_id: PrincipalId) -> AppResult<bool> {
        Ok(self.principals.read().await.contains(&principal_id))
    }
}
