use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use rolekeeper_application::{AuditRecordQuery, AuditRecordRepository, AuditStore};
use rolekeeper_core::{Actor, AppError, AppResult, AuditRecordId, PrincipalId, RequestContext};
use rolekeeper_domain::{
    AuditDetail, AuditEventType, AuditOutcome, AuditRecord, RESOURCE_PRINCIPAL,
    StoredAuditRecord,
};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed append-only compliance audit store.
#[derive(Clone)]
pub struct PostgresAuditStore {
    pool: PgPool,
}

impl PostgresAuditStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditRecordRow {
    sequence: i64,
    id: uuid::Uuid,
    occurred_at: DateTime<Utc>,
    actor_kind: String,
    actor_id: Option<uuid::Uuid>,
    event_type: String,
    outcome: String,
    resource_type: Option<String>,
    resource_id: Option<String>,
    source_ip: Option<String>,
    user_agent: Option<String>,
    request_path: Option<String>,
    request_method: Option<String>,
    message: String,
    detail: Value,
}

impl TryFrom<AuditRecordRow> for StoredAuditRecord {
    type Error = AppError;

    fn try_from(row: AuditRecordRow) -> Result<Self, Self::Error> {
        let detail = match row.detail {
            Value::Object(map) => AuditDetail::from(map),
            Value::Null => AuditDetail::new(),
            other => AuditDetail::new().with("value", other),
        };

        Ok(Self {
            sequence: row.sequence,
            record: AuditRecord {
                id: AuditRecordId::from_uuid(row.id),
                timestamp: row.occurred_at,
                actor: Actor::from_storage(
                    row.actor_kind.as_str(),
                    row.actor_id.map(PrincipalId::from_uuid),
                ),
                event_type: row.event_type.parse::<AuditEventType>()?,
                outcome: row.outcome.parse::<AuditOutcome>()?,
                resource_type: row.resource_type,
                resource_id: row.resource_id,
                request: RequestContext {
                    source_ip: row.source_ip,
                    user_agent: row.user_agent,
                    request_path: row.request_path,
                    request_method: row.request_method,
                },
                message: row.message,
                detail,
            },
        })
    }
}

#[async_trait]
impl AuditStore for PostgresAuditStore {
    async fn append_record(&self, record: &AuditRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_records (
                id,
                occurred_at,
                actor_kind,
                actor_id,
                event_type,
                outcome,
                severity,
                resource_type,
                resource_id,
                source_ip,
                user_agent,
                request_path,
                request_method,
                message,
                detail
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.timestamp)
        .bind(record.actor.kind())
        .bind(record.actor_id().map(|principal_id| principal_id.as_uuid()))
        .bind(record.event_type.as_str())
        .bind(record.outcome.as_str())
        .bind(record.severity().as_str())
        .bind(record.resource_type.as_deref())
        .bind(record.resource_id.as_deref())
        .bind(record.request.source_ip.as_deref())
        .bind(record.request.user_agent.as_deref())
        .bind(record.request.request_path.as_deref())
        .bind(record.request.request_method.as_deref())
        .bind(record.message.as_str())
        .bind(record.detail.clone().into_value())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit record: {error}")))?;

        Ok(())
    }
}

#[async_trait]
impl AuditRecordRepository for PostgresAuditStore {
    async fn list_records(&self, query: &AuditRecordQuery) -> AppResult<Vec<StoredAuditRecord>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, AuditRecordRow>(
            r#"
            SELECT
                sequence,
                id,
                occurred_at,
                actor_kind,
                actor_id,
                event_type,
                outcome,
                resource_type,
                resource_id,
                source_ip,
                user_agent,
                request_path,
                request_method,
                message,
                detail
            FROM audit_records
            WHERE ($1::UUID IS NULL
                    OR actor_id = $1
                    OR (resource_type = $2 AND resource_id = $1::TEXT))
                AND ($3::TIMESTAMPTZ IS NULL OR occurred_at >= $3)
                AND ($4::TIMESTAMPTZ IS NULL OR occurred_at < $4)
                AND ($5::TEXT IS NULL OR event_type = $5)
            ORDER BY occurred_at DESC, sequence DESC
            LIMIT $6
            OFFSET $7
            "#,
        )
        .bind(query.principal_id.map(|principal_id| principal_id.as_uuid()))
        .bind(RESOURCE_PRINCIPAL)
        .bind(query.from)
        .bind(query.to)
        .bind(query.event_type.map(|event_type| event_type.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit records: {error}")))?;

        rows.into_iter().map(StoredAuditRecord::try_from).collect()
    }
}
