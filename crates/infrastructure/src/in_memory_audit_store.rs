use async_trait::async_trait;
use tokio::sync::RwLock;

use rolekeeper_application::{AuditRecordQuery, AuditRecordRepository, AuditStore};
use rolekeeper_core::{AppError, AppResult};
use rolekeeper_domain::{AuditRecord, StoredAuditRecord};

/// In-memory append-only compliance store.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    records: RwLock<Vec<StoredAuditRecord>>,
}

impl InMemoryAuditStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored record in append order.
    pub async fn records(&self) -> Vec<StoredAuditRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append_record(&self, record: &AuditRecord) -> AppResult<()> {
        let mut records = self.records.write().await;

        if records.iter().any(|stored| stored.record.id == record.id) {
            return Err(AppError::Conflict(format!(
                "audit record '{}' was already stored",
                record.id
            )));
        }

        let sequence = records.last().map_or(1, |stored| stored.sequence + 1);
        records.push(StoredAuditRecord {
            sequence,
            record: record.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl AuditRecordRepository for InMemoryAuditStore {
    async fn list_records(&self, query: &AuditRecordQuery) -> AppResult<Vec<StoredAuditRecord>> {
        let records = self.records.read().await;

        let mut matching: Vec<StoredAuditRecord> = records
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
