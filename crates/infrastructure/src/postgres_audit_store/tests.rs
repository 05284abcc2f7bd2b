use chrono::{Duration, Utc};
use rolekeeper_application::{AuditRecordQuery, AuditRecordRepository, AuditStore};
use rolekeeper_core::{Actor, AuditRecordId, PrincipalId, RequestContext};
use rolekeeper_domain::{AuditDetail, AuditEventType, AuditOutcome, AuditRecord};
use serde_json::json;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresAuditStore;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres audit store tests: {error}");
    }

    Some(pool)
}

fn record(actor: Actor, target: Option<PrincipalId>, event_type: AuditEventType) -> AuditRecord {
    AuditRecord {
        id: AuditRecordId::new(),
        timestamp: Utc::now(),
        actor,
        event_type,
        outcome: AuditOutcome::Success,
        resource_type: target.map(|_| "principal".to_owned()),
        resource_id: target.map(|principal_id| principal_id.to_string()),
        request: RequestContext {
            source_ip: Some("198.51.100.4".to_owned()),
            user_agent: None,
            request_path: None,
            request_method: None,
        },
        message: event_type.describe(AuditOutcome::Success).to_owned(),
        detail: AuditDetail::new().with("role_name", "ADMIN"),
    }
}

#[tokio::test]
async fn appended_records_read_back_with_context_and_detail() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PostgresAuditStore::new(pool);
    let actor_id = PrincipalId::new();
    let written = record(Actor::Principal(actor_id), None, AuditEventType::RoleCreated);

    assert!(store.append_record(&written).await.is_ok());

    let query = AuditRecordQuery {
        principal_id: Some(actor_id),
        ..AuditRecordQuery::default()
    };
    let Ok(page) = store.list_records(&query).await else {
        panic!("list should succeed");
    };

    assert_eq!(page.len(), 1);
    let read = &page[0].record;
    assert_eq!(read.id, written.id);
    assert_eq!(read.actor, Actor::Principal(actor_id));
    assert_eq!(read.event_type, AuditEventType::RoleCreated);
    assert_eq!(read.request.source_ip.as_deref(), Some("198.51.100.4"));
    assert_eq!(read.request.user_agent, None);
    assert_eq!(read.detail.get("role_name"), Some(&json!("ADMIN")));
}

#[tokio::test]
async fn principal_filter_matches_actor_or_target() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PostgresAuditStore::new(pool);
    let principal_id = PrincipalId::new();

    let as_actor = record(
        Actor::Principal(principal_id),
        None,
        AuditEventType::RoleAccessDenied,
    );
    let as_target = record(Actor::System, Some(principal_id), AuditEventType::RoleAssigned);
    let unrelated = record(Actor::System, Some(PrincipalId::new()), AuditEventType::RoleAssigned);
    for written in [&as_actor, &as_target, &unrelated] {
        assert!(store.append_record(written).await.is_ok());
    }

    let query = AuditRecordQuery {
        principal_id: Some(principal_id),
        ..AuditRecordQuery::default()
    };
    let Ok(page) = store.list_records(&query).await else {
        panic!("list should succeed");
    };
    let ids: Vec<AuditRecordId> = page.iter().map(|stored| stored.record.id).collect();
    assert_eq!(ids, vec![as_target.id, as_actor.id]);

    let query = AuditRecordQuery {
        principal_id: Some(principal_id),
        event_type: Some(AuditEventType::RoleAssigned),
        ..AuditRecordQuery::default()
    };
    let Ok(page) = store.list_records(&query).await else {
        panic!("list should succeed");
    };
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].record.id, as_target.id);

    let query = AuditRecordQuery {
        principal_id: Some(principal_id),
        to: Some(as_actor.timestamp - Duration::seconds(1)),
        ..AuditRecordQuery::default()
    };
    assert!(matches!(store.list_records(&query).await, Ok(page) if page.is_empty()));
}

#[tokio::test]
async fn stored_records_cannot_be_updated() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PostgresAuditStore::new(pool.clone());
    let written = record(Actor::System, None, AuditEventType::RoleDeleted);
    assert!(store.append_record(&written).await.is_ok());

    let update = sqlx::query("UPDATE audit_records SET message = 'edited' WHERE id = $1")
        .bind(written.id.as_uuid())
        .execute(&pool)
        .await;

    assert!(update.is_err());
}
