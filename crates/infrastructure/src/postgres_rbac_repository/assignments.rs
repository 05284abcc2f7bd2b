use super::*;

use sqlx::{Postgres, Transaction};

const ASSIGNMENT_COLUMNS: &str =
    "id, principal_id, role_id, assigned_by_kind, assigned_by, assigned_at, is_active";

impl PostgresRbacRepository {
    pub(super) async fn activate_assignment_impl(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<ActivationOutcome> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let role_exists = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM rbac_roles
            WHERE id = $1
            FOR SHARE
            "#,
        )
        .bind(role.id().as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock role: {error}")))?;

        if role_exists.is_none() {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                role.id()
            )));
        }

        let upserted = sqlx::query_as::<_, UpsertedAssignmentRow>(
            r#"
            INSERT INTO rbac_role_assignments (
                id,
                principal_id,
                role_id,
                assigned_by_kind,
                assigned_by,
                assigned_at,
                is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, true)
            ON CONFLICT (principal_id, role_id) DO UPDATE
            SET
                is_active = true,
                assigned_by_kind = EXCLUDED.assigned_by_kind,
                assigned_by = EXCLUDED.assigned_by,
                assigned_at = EXCLUDED.assigned_at
            WHERE NOT rbac_role_assignments.is_active
            RETURNING
                id,
                principal_id,
                role_id,
                assigned_by_kind,
                assigned_by,
                assigned_at,
                is_active,
                (xmax = 0) AS inserted
            "#,
        )
        .bind(AssignmentId::new().as_uuid())
        .bind(principal_id.as_uuid())
        .bind(role.id().as_uuid())
        .bind(actor.kind())
        .bind(actor.principal_id().map(|principal_id| principal_id.as_uuid()))
        .bind(now)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to activate assignment: {error}")))?;

        let Some(upserted) = upserted else {
            let existing = sqlx::query_as::<_, AssignmentRow>(&format!(
                "SELECT {ASSIGNMENT_COLUMNS} FROM rbac_role_assignments \
                 WHERE principal_id = $1 AND role_id = $2"
            ))
            .bind(principal_id.as_uuid())
            .bind(role.id().as_uuid())
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to load active assignment: {error}"))
            })?;

            return Ok(ActivationOutcome::AlreadyActive(existing.into()));
        };

        let inserted = upserted.inserted;
        let assignment = RoleAssignment::from(upserted.assignment);
        let change = if inserted {
            AssignmentChange::Created
        } else {
            AssignmentChange::Reactivated
        };
        append_event(&mut transaction, change, role, actor, now, &assignment).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(if inserted {
            ActivationOutcome::Created(assignment)
        } else {
            ActivationOutcome::Reactivated(assignment)
        })
    }

    pub(super) async fn deactivate_assignment_impl(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<DeactivationOutcome> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let deactivated = sqlx::query_as::<_, AssignmentRow>(&format!(
            "UPDATE rbac_role_assignments SET is_active = false \
             WHERE principal_id = $1 AND role_id = $2 AND is_active \
             RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(principal_id.as_uuid())
        .bind(role.id().as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to deactivate assignment: {error}"))
        })?;

        let Some(row) = deactivated else {
            return Ok(DeactivationOutcome::NotActive);
        };

        let assignment = RoleAssignment::from(row);
        append_event(
            &mut transaction,
            AssignmentChange::Deactivated,
            role,
            actor,
            now,
            &assignment,
        )
        .await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(DeactivationOutcome::Deactivated(assignment))
    }

    pub(super) async fn list_active_roles_impl(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT roles.id, roles.name
            FROM rbac_role_assignments AS assignments
            INNER JOIN rbac_roles AS roles
                ON roles.id = assignments.role_id
            WHERE assignments.principal_id = $1
                AND assignments.is_active
            ORDER BY roles.name
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list active roles: {error}")))?;

        rows.into_iter().map(Role::try_from).collect()
    }

    pub(super) async fn list_history_impl(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<AssignmentHistoryEntry>> {
        let rows = sqlx::query_as::<_, AssignmentEventRow>(
            r#"
            SELECT
                sequence,
                change,
                role_name,
                actor_kind,
                actor_id,
                occurred_at,
                assignment_id,
                principal_id,
                role_id,
                assigned_by_kind,
                assigned_by,
                assigned_at,
                is_active
            FROM rbac_role_assignment_events
            WHERE principal_id = $1
            ORDER BY occurred_at DESC, sequence DESC
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list assignment history: {error}"))
        })?;

        rows.into_iter()
            .map(AssignmentHistoryEntry::try_from)
            .collect()
    }
}

async fn append_event(
    transaction: &mut Transaction<'_, Postgres>,
    change: AssignmentChange,
    role: &Role,
    actor: Actor,
    occurred_at: DateTime<Utc>,
    assignment: &RoleAssignment,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO rbac_role_assignment_events (
            assignment_id,
            principal_id,
            role_id,
            role_name,
            change,
            actor_kind,
            actor_id,
            occurred_at,
            assigned_by_kind,
            assigned_by,
            assigned_at,
            is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(assignment.id.as_uuid())
    .bind(assignment.principal_id.as_uuid())
    .bind(assignment.role_id.as_uuid())
    .bind(role.name().as_str())
    .bind(change.as_str())
    .bind(actor.kind())
    .bind(actor.principal_id().map(|principal_id| principal_id.as_uuid()))
    .bind(occurred_at)
    .bind(assignment.assigned_by.kind())
    .bind(assignment.assigned_by_id().map(|principal_id| principal_id.as_uuid()))
    .bind(assignment.assigned_at)
    .bind(assignment.is_active)
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to append assignment history: {error}"))
    })?;

    Ok(())
}
