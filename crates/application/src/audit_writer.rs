use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use rolekeeper_core::{Actor, AppError, AppResult, AuditRecordId, OperationContext};
use rolekeeper_domain::{AuditDetail, AuditEventType, AuditOutcome, AuditRecord, DETAIL_REASON};

use crate::{AuditEvent, AuditLogSink, AuditReceipt, AuditStore, ComplianceDelivery};

/// Dual-sink audit recorder.
///
/// Each record goes to the structured log sink first and the compliance store
/// second. A log sink error fails the call. A compliance store error is
/// written to the log sink as a critical `audit_store_failure` record that
/// embeds the rejected record, and is reported through the receipt only.
#[derive(Clone)]
pub struct AuditWriter {
    log_sink: Arc<dyn AuditLogSink>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    /// Creates a writer from its two sinks.
    #[must_use]
    pub fn new(log_sink: Arc<dyn AuditLogSink>, store: Arc<dyn AuditStore>) -> Self {
        Self { log_sink, store }
    }

    /// Stamps and writes one audit record to both sinks.
    pub async fn record(
        &self,
        context: &OperationContext,
        event: AuditEvent,
    ) -> AppResult<AuditReceipt> {
        let record = stamp_record(context, event);

        self.log_sink.append(&record).map_err(|error| {
            AppError::AuditSink(format!(
                "structured audit log rejected record '{}': {error}",
                record.id
            ))
        })?;

        let compliance = match self.store.append_record(&record).await {
            Ok(()) => ComplianceDelivery::Stored,
            Err(error) => {
                let reason = error.to_string();
                warn!(
                    record_id = %record.id,
                    event_type = record.event_type.as_str(),
                    error = %reason,
                    "compliance audit store rejected record; kept in structured log only"
                );
                let failure_record = store_failure_record(&record, reason.as_str());
                self.log_sink.append(&failure_record).map_err(|log_error| {
                    AppError::AuditSink(format!(
                        "structured audit log rejected store failure for record '{}': {log_error}",
                        record.id
                    ))
                })?;

                ComplianceDelivery::Failed { reason }
            }
        };

        Ok(AuditReceipt {
            record_id: record.id,
            compliance,
        })
    }
}

fn stamp_record(context: &OperationContext, event: AuditEvent) -> AuditRecord {
    let description = event.event_type.describe(event.outcome);
    let message = match event.summary {
        Some(summary) => format!("{description}: {summary}"),
        None => description.to_owned(),
    };

    AuditRecord {
        id: AuditRecordId::new(),
        timestamp: Utc::now(),
        actor: context.actor(),
        event_type: event.event_type,
        outcome: event.outcome,
        resource_type: event.resource_type,
        resource_id: event.resource_id,
        request: context.request().clone(),
        message,
        detail: event.detail,
    }
}

fn store_failure_record(failed: &AuditRecord, reason: &str) -> AuditRecord {
    let event_type = AuditEventType::AuditStoreFailure;
    let outcome = AuditOutcome::Failure;

    AuditRecord {
        id: AuditRecordId::new(),
        timestamp: Utc::now(),
        actor: Actor::System,
        event_type,
        outcome,
        resource_type: Some("audit_record".to_owned()),
        resource_id: Some(failed.id.to_string()),
        request: failed.request.clone(),
        message: format!(
            "{}: {} record '{}'",
            event_type.describe(outcome),
            failed.event_type.as_str(),
            failed.id
        ),
        detail: AuditDetail::new()
            .with(DETAIL_REASON, "compliance_store_unavailable")
            .with("store_error", reason)
            .with("failed_event_type", failed.event_type.as_str())
            .with("failed_record", failed.to_json()),
    }
}
