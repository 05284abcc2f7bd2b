use async_trait::async_trait;
use sqlx::PgPool;

use rolekeeper_application::PrincipalDirectory;
use rolekeeper_core::{AppError, AppResult, PrincipalId};

/// PostgreSQL-backed lookup of principals provisioned by the identity system.
#[derive(Clone)]
pub struct PostgresPrincipalDirectory {
    pool: PgPool,
}

impl PostgresPrincipalDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalDirectory for PostgresPrincipalDirectory {
    async fn principal_exists(&self, principal_id: PrincipalId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM principals
                WHERE id = $1
            )
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve principal: {error}")))
    }
}
