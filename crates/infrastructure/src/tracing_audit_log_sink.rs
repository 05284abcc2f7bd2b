use tracing::{error, info, warn};

use rolekeeper_application::AuditLogSink;
use rolekeeper_core::AppResult;
use rolekeeper_domain::{AuditRecord, AuditSeverity};

/// Structured log sink that emits each audit record as a `tracing` event.
///
/// Events use the `rolekeeper::audit` target so subscribers can route them
/// to a dedicated stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogSink;

impl TracingAuditLogSink {
    /// Creates the sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

macro_rules! emit_audit_event {
    ($level:ident, $record:ident, $detail:ident) => {
        $level!(
            target: "rolekeeper::audit",
            audit_record_id = %$record.id,
            timestamp = %$record.timestamp.to_rfc3339(),
            actor_kind = $record.actor.kind(),
            actor_id = ?$record.actor_id().map(|principal_id| principal_id.to_string()),
            event_type = $record.event_type.as_str(),
            outcome = $record.outcome.as_str(),
            severity = $record.severity().as_str(),
            resource_type = ?$record.resource_type,
            resource_id = ?$record.resource_id,
            source_ip = ?$record.request.source_ip,
            user_agent = ?$record.request.user_agent,
            request_path = ?$record.request.request_path,
            request_method = ?$record.request.request_method,
            detail = %$detail,
            "{}",
            $record.message
        )
    };
}

impl AuditLogSink for TracingAuditLogSink {
    fn append(&self, record: &AuditRecord) -> AppResult<()> {
        let detail = record.detail.clone().into_value();

        match record.severity() {
            AuditSeverity::Info | AuditSeverity::Notice => {
                emit_audit_event!(info, record, detail);
            }
            AuditSeverity::Warning => emit_audit_event!(warn, record, detail),
            AuditSeverity::Critical => emit_audit_event!(error, record, detail),
        }

        Ok(())
    }
}
