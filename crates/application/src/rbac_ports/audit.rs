use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use rolekeeper_core::{AppResult, AuditRecordId, PrincipalId};
use rolekeeper_domain::{
    AuditDetail, AuditEventType, AuditOutcome, AuditRecord, DETAIL_REASON, StoredAuditRecord,
};

/// Upper bound for one audit read page.
pub const MAX_AUDIT_QUERY_LIMIT: usize = 1_000;

/// Audit payload emitted by use-cases before the writer stamps it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Event classification.
    pub event_type: AuditEventType,
    /// Whether the operation took effect.
    pub outcome: AuditOutcome,
    /// Kind of resource targeted.
    pub resource_type: Option<String>,
    /// Identifier of the targeted resource.
    pub resource_id: Option<String>,
    /// Optional text appended to the derived message.
    pub summary: Option<String>,
    /// Open structured payload.
    pub detail: AuditDetail,
}

impl AuditEvent {
    /// Creates an event for an operation that took effect.
    #[must_use]
    pub fn success(event_type: AuditEventType) -> Self {
        Self {
            event_type,
            outcome: AuditOutcome::Success,
            resource_type: None,
            resource_id: None,
            summary: None,
            detail: AuditDetail::new(),
        }
    }

    /// Creates an event for a rejected or ineffective operation.
    #[must_use]
    pub fn failure(event_type: AuditEventType, reason: &str) -> Self {
        Self {
            event_type,
            outcome: AuditOutcome::Failure,
            resource_type: None,
            resource_id: None,
            summary: None,
            detail: AuditDetail::new().with(DETAIL_REASON, reason),
        }
    }

    /// Sets the targeted resource.
    #[must_use]
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Sets the targeted resource kind without an identifier.
    #[must_use]
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = None;
        self
    }

    /// Sets the summary appended to the derived message.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Adds one detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.detail.insert(key, value);
        self
    }
}

/// Delivery state of a record in the compliance store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplianceDelivery {
    /// The compliance store accepted the record.
    Stored,
    /// The compliance store rejected the record; the structured log holds it.
    Failed {
        /// Error reported by the store.
        reason: String,
    },
}

/// Acknowledgement returned by the audit writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReceipt {
    /// Identifier of the written record.
    pub record_id: AuditRecordId,
    /// Compliance store delivery state.
    pub compliance: ComplianceDelivery,
}

impl AuditReceipt {
    /// Returns whether the compliance store holds the record.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        matches!(self.compliance, ComplianceDelivery::Stored)
    }
}

/// Append-only structured log stream for real-time monitoring.
///
/// Writes are synchronous; an error means the sink is misconfigured.
pub trait AuditLogSink: Send + Sync {
    /// Appends one record.
    fn append(&self, record: &AuditRecord) -> AppResult<()>;
}

/// Durable compliance store for audit records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persists one record. Records are never updated or removed.
    async fn append_record(&self, record: &AuditRecord) -> AppResult<()>;
}

/// Query parameters for compliance audit reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecordQuery {
    /// Records triggered by or targeting this principal.
    pub principal_id: Option<PrincipalId>,
    /// Inclusive lower timestamp bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper timestamp bound.
    pub to: Option<DateTime<Utc>>,
    /// Event type filter.
    pub event_type: Option<AuditEventType>,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

impl Default for AuditRecordQuery {
    fn default() -> Self {
        Self {
            principal_id: None,
            from: None,
            to: None,
            event_type: None,
            limit: 100,
            offset: 0,
        }
    }
}

impl AuditRecordQuery {
    /// Returns whether a record satisfies the filters, ignoring pagination.
    #[must_use]
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.principal_id
            .is_none_or(|principal_id| record.concerns_principal(principal_id))
            && self.from.is_none_or(|from| record.timestamp >= from)
            && self.to.is_none_or(|to| record.timestamp < to)
            && self
                .event_type
                .is_none_or(|event_type| record.event_type == event_type)
    }
}

/// Read port over the compliance audit store.
#[async_trait]
pub trait AuditRecordRepository: Send + Sync {
    /// Lists matching records newest first (timestamp, then sequence).
    async fn list_records(&self, query: &AuditRecordQuery) -> AppResult<Vec<StoredAuditRecord>>;
}
