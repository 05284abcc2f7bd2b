use super::*;

impl PostgresRbacRepository {
    pub(super) async fn create_role_impl(&self, role: Role) -> AppResult<Role> {
        sqlx::query(
            r#"
            INSERT INTO rbac_roles (id, name)
            VALUES ($1, $2)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name().as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, role.name().as_str()))?;

        Ok(role)
    }

    pub(super) async fn find_role_by_id_impl(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role by id: {error}")))?
        .map(Role::try_from)
        .transpose()
    }

    pub(super) async fn find_role_by_name_impl(&self, name: &str) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM rbac_roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role by name: {error}")))?
        .map(Role::try_from)
        .transpose()
    }

    pub(super) async fn list_roles_impl(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM rbac_roles
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(Role::try_from).collect()
    }

    pub(super) async fn delete_role_if_unused_impl(
        &self,
        role_id: RoleId,
    ) -> AppResult<RoleDeletion> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        // Activations hold FOR SHARE on the role row, so this lock orders the
        // active-row count after every in-flight activation.
        let Some(row) = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM rbac_roles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock role: {error}")))?
        else {
            return Ok(RoleDeletion::NotFound);
        };
        let role = Role::try_from(row)?;

        let active_assignments = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM rbac_role_assignments
            WHERE role_id = $1
                AND is_active
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count active assignments: {error}"))
        })?;

        if active_assignments > 0 {
            return Ok(RoleDeletion::InUse {
                role,
                active_assignments: u64::try_from(active_assignments).unwrap_or_default(),
            });
        }

        sqlx::query(
            r#"
            DELETE FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(RoleDeletion::Deleted(role))
    }
}
