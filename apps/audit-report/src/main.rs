//! Rolekeeper compliance audit report exporter.

#![forbid(unsafe_code)]

mod report_config;

use std::io::{self, BufWriter, Write};
use std::sync::Arc;

use rolekeeper_application::AuditLogService;
use rolekeeper_core::{AppError, AppResult};
use rolekeeper_domain::StoredAuditRecord;
use rolekeeper_infrastructure::PostgresAuditStore;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::report_config::{ReportConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ReportConfig::load()?;
    let pool = connect_and_migrate(&config).await?;

    if config.migrate_only {
        info!("database migrations applied");
        return Ok(());
    }

    let audit_log_service = AuditLogService::new(Arc::new(PostgresAuditStore::new(pool)));
    let mut output = BufWriter::new(io::stdout());

    info!(
        principal_id = ?config.query.principal_id.map(|principal_id| principal_id.to_string()),
        from = ?config.query.from.map(|from| from.to_rfc3339()),
        to = ?config.query.to.map(|to| to.to_rfc3339()),
        event_type = ?config.query.event_type.map(|event_type| event_type.as_str()),
        page_size = config.query.limit,
        "audit export started"
    );

    let exported = audit_log_service
        .export(&config.query, |stored| write_record(&mut output, stored))
        .await?;
    output
        .flush()
        .map_err(|error| AppError::Internal(format!("failed to flush audit export: {error}")))?;

    info!(exported, "audit export finished");
    Ok(())
}

async fn connect_and_migrate(config: &ReportConfig) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}

fn write_record(output: &mut impl Write, stored: &StoredAuditRecord) -> AppResult<()> {
    let mut line = stored.record.to_json();
    if let Some(fields) = line.as_object_mut() {
        fields.insert("sequence".to_owned(), stored.sequence.into());
    }

    serde_json::to_writer(&mut *output, &line)
        .map_err(|error| AppError::Internal(format!("failed to encode audit record: {error}")))?;
    output
        .write_all(b"\n")
        .map_err(|error| AppError::Internal(format!("failed to write audit record: {error}")))
}
