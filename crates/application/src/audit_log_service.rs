use std::sync::Arc;

use rolekeeper_core::{AppError, AppResult};
use rolekeeper_domain::StoredAuditRecord;

use crate::{AuditRecordQuery, AuditRecordRepository, MAX_AUDIT_QUERY_LIMIT};

/// Read access to the compliance audit store.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditRecordRepository>,
}

impl AuditLogService {
    /// Creates a new service from the audit read port.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditRecordRepository>) -> Self {
        Self { repository }
    }

    /// Lists one page of matching records, newest first.
    pub async fn list(&self, query: &AuditRecordQuery) -> AppResult<Vec<StoredAuditRecord>> {
        let query = normalize_query(query)?;
        self.repository.list_records(&query).await
    }

    /// Streams every matching record to `sink` page by page.
    ///
    /// Returns the number of records exported. Records appended while the
    /// export runs may shift pages; callers wanting a stable snapshot should
    /// bound the query with `to`.
    pub async fn export<F>(&self, query: &AuditRecordQuery, mut sink: F) -> AppResult<usize>
    where
        F: FnMut(&StoredAuditRecord) -> AppResult<()> + Send,
    {
        let mut page_query = normalize_query(query)?;
        let mut exported = 0;

        loop {
            let page = self.repository.list_records(&page_query).await?;
            for record in &page {
                sink(record)?;
            }

            exported += page.len();
            if page.len() < page_query.limit {
                return Ok(exported);
            }

            page_query.offset += page.len();
        }
    }
}

fn normalize_query(query: &AuditRecordQuery) -> AppResult<AuditRecordQuery> {
    if let (Some(from), Some(to)) = (query.from, query.to)
        && from >= to
    {
        return Err(AppError::Validation(format!(
            "audit query range is empty: from {from} is not before to {to}"
        )));
    }

    let mut query = query.clone();
    query.limit = query.limit.clamp(1, MAX_AUDIT_QUERY_LIMIT);
    Ok(query)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use tokio::sync::Mutex;

    use rolekeeper_core::{
        Actor, AppError, AppResult, AuditRecordId, PrincipalId, RequestContext,
    };
    use rolekeeper_domain::{
        AuditDetail, AuditEventType, AuditOutcome, AuditRecord, RESOURCE_PRINCIPAL,
        StoredAuditRecord,
    };

    use super::AuditLogService;
    use crate::{AuditRecordQuery, AuditRecordRepository, MAX_AUDIT_QUERY_LIMIT};

    #[derive(Default)]
    struct FakeAuditRecords {
        records: Vec<StoredAuditRecord>,
        seen_limits: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl AuditRecordRepository for FakeAuditRecords {
        async fn list_records(
            &self,
            query: &AuditRecordQuery,
        ) -> AppResult<Vec<StoredAuditRecord>> {
            self.seen_limits.lock().await.push(query.limit);

            let mut matching: Vec<StoredAuditRecord> = self
                .records
                .iter()
                .filter(|stored| query.matches(&stored.record))
                .cloned()
                .collect();
            matching.sort_by(|left, right| {
                right
                    .record
                    .timestamp
                    .cmp(&left.record.timestamp)
                    .then(right.sequence.cmp(&left.sequence))
            });

            Ok(matching
                .into_iter()
                .skip(query.offset)
                .take(query.limit)
                .collect())
        }
    }

    fn stored(sequence: i64, actor: Actor, event_type: AuditEventType) -> StoredAuditRecord {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single();
        let Some(base) = base else {
            panic!("fixed timestamp should be valid");
        };

        StoredAuditRecord {
            sequence,
            record: AuditRecord {
                id: AuditRecordId::new(),
                timestamp: base + Duration::minutes(sequence),
                actor,
                event_type,
                outcome: AuditOutcome::Success,
                resource_type: None,
                resource_id: None,
                request: RequestContext::default(),
                message: event_type.describe(AuditOutcome::Success).to_owned(),
                detail: AuditDetail::new(),
            },
        }
    }

    fn service_with(records: Vec<StoredAuditRecord>) -> (AuditLogService, Arc<FakeAuditRecords>) {
        let repository = Arc::new(FakeAuditRecords {
            records,
            seen_limits: Mutex::new(Vec::new()),
        });
        (AuditLogService::new(repository.clone()), repository)
    }

    #[tokio::test]
    async fn list_clamps_limit_and_orders_newest_first() {
        let records = (1..=3)
            .map(|sequence| stored(sequence, Actor::System, AuditEventType::RoleCreated))
            .collect();
        let (service, repository) = service_with(records);

        let query = AuditRecordQuery {
            limit: 0,
            ..AuditRecordQuery::default()
        };
        let Ok(page) = service.list(&query).await else {
            panic!("list should succeed");
        };
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].sequence, 3);

        let query = AuditRecordQuery {
            limit: 50_000,
            ..AuditRecordQuery::default()
        };
        assert!(service.list(&query).await.is_ok());
        assert_eq!(
            *repository.seen_limits.lock().await,
            vec![1, MAX_AUDIT_QUERY_LIMIT]
        );
    }

    #[tokio::test]
    async fn list_filters_by_principal_as_actor_or_target() {
        let principal_id = PrincipalId::new();
        let mut targeted = stored(2, Actor::System, AuditEventType::RoleAssigned);
        targeted.record.resource_type = Some(RESOURCE_PRINCIPAL.to_owned());
        targeted.record.resource_id = Some(principal_id.to_string());
        let records = vec![
            stored(
                1,
                Actor::Principal(principal_id),
                AuditEventType::RoleAccessGranted,
            ),
            targeted,
            stored(3, Actor::Principal(PrincipalId::new()), AuditEventType::RoleCreated),
        ];
        let (service, _) = service_with(records);

        let query = AuditRecordQuery {
            principal_id: Some(principal_id),
            ..AuditRecordQuery::default()
        };
        let Ok(page) = service.list(&query).await else {
            panic!("list should succeed");
        };

        let sequences: Vec<i64> = page.iter().map(|stored| stored.sequence).collect();
        assert_eq!(sequences, vec![2, 1]);
    }

    #[tokio::test]
    async fn list_rejects_empty_time_range() {
        let (service, repository) = service_with(Vec::new());
        let now = Utc::now();

        let query = AuditRecordQuery {
            from: Some(now),
            to: Some(now),
            ..AuditRecordQuery::default()
        };

        assert!(matches!(
            service.list(&query).await,
            Err(AppError::Validation(_))
        ));
        assert!(repository.seen_limits.lock().await.is_empty());
    }

    #[tokio::test]
    async fn export_pages_until_exhausted() {
        let records = (1..=7)
            .map(|sequence| stored(sequence, Actor::System, AuditEventType::RoleDeleted))
            .collect();
        let (service, repository) = service_with(records);
        let query = AuditRecordQuery {
            event_type: Some(AuditEventType::RoleDeleted),
            limit: 3,
            ..AuditRecordQuery::default()
        };

        let mut exported = Vec::new();
        let result = service
            .export(&query, |stored| {
                exported.push(stored.sequence);
                Ok(())
            })
            .await;

        assert!(matches!(result, Ok(7)));
        assert_eq!(exported, vec![7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(repository.seen_limits.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn export_stops_on_sink_error() {
        let records = (1..=4)
            .map(|sequence| stored(sequence, Actor::System, AuditEventType::RoleCreated))
            .collect();
        let (service, _) = service_with(records);

        let mut written = 0;
        let result = service
            .export(&AuditRecordQuery::default(), |_| {
                written += 1;
                if written == 2 {
                    return Err(AppError::Internal("output closed".to_owned()));
                }
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(written, 2);
    }
}
