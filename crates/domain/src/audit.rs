use std::str::FromStr;

use chrono::{DateTime, Utc};
use rolekeeper_core::{Actor, AppError, AuditRecordId, PrincipalId, RequestContext};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Detail key every FAILURE-outcome record carries.
pub const DETAIL_REASON: &str = "reason";

/// Resource type used when a record targets a principal.
pub const RESOURCE_PRINCIPAL: &str = "principal";

/// Closed set of audited event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A new assignment row was created.
    RoleAssigned,
    /// An inactive assignment row was reactivated.
    RoleReactivated,
    /// An assign or unassign request changed nothing.
    RoleAssignmentAttempt,
    /// An active assignment row was deactivated.
    RoleRemoved,
    /// An access check was allowed.
    RoleAccessGranted,
    /// An access check was denied.
    RoleAccessDenied,
    /// A role definition was created, or creation was rejected.
    RoleCreated,
    /// A role definition was deleted, or deletion was blocked.
    RoleDeleted,
    /// The compliance store rejected an audit record.
    AuditStoreFailure,
}

impl AuditEventType {
    /// Returns a stable storage value for this event type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleAssigned => "role_assigned",
            Self::RoleReactivated => "role_reactivated",
            Self::RoleAssignmentAttempt => "role_assignment_attempt",
            Self::RoleRemoved => "role_removed",
            Self::RoleAccessGranted => "role_access_granted",
            Self::RoleAccessDenied => "role_access_denied",
            Self::RoleCreated => "role_created",
            Self::RoleDeleted => "role_deleted",
            Self::AuditStoreFailure => "audit_store_failure",
        }
    }

    /// Returns all known event types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AuditEventType] = &[
            AuditEventType::RoleAssigned,
            AuditEventType::RoleReactivated,
            AuditEventType::RoleAssignmentAttempt,
            AuditEventType::RoleRemoved,
            AuditEventType::RoleAccessGranted,
            AuditEventType::RoleAccessDenied,
            AuditEventType::RoleCreated,
            AuditEventType::RoleDeleted,
            AuditEventType::AuditStoreFailure,
        ];

        ALL
    }

    /// Returns the human-readable message for this event and outcome.
    #[must_use]
    pub fn describe(&self, outcome: AuditOutcome) -> &'static str {
        match (self, outcome) {
            (Self::RoleAssigned, AuditOutcome::Success) => "role assigned",
            (Self::RoleAssigned, AuditOutcome::Failure) => "role assignment failed",
            (Self::RoleReactivated, AuditOutcome::Success) => "role assignment reactivated",
            (Self::RoleReactivated, AuditOutcome::Failure) => "role reactivation failed",
            (Self::RoleAssignmentAttempt, AuditOutcome::Success) => "role assignment request handled",
            (Self::RoleAssignmentAttempt, AuditOutcome::Failure) => {
                "role assignment request had no effect"
            }
            (Self::RoleRemoved, AuditOutcome::Success) => "role assignment removed",
            (Self::RoleRemoved, AuditOutcome::Failure) => "role removal failed",
            (Self::RoleAccessGranted, _) => "access granted",
            (Self::RoleAccessDenied, _) => "access denied",
            (Self::RoleCreated, AuditOutcome::Success) => "role created",
            (Self::RoleCreated, AuditOutcome::Failure) => "role creation rejected",
            (Self::RoleDeleted, AuditOutcome::Success) => "role deleted",
            (Self::RoleDeleted, AuditOutcome::Failure) => "role deletion blocked",
            (Self::AuditStoreFailure, _) => "compliance audit store rejected a record",
        }
    }

    /// Returns the operational severity for this event and outcome.
    #[must_use]
    pub fn severity(&self, outcome: AuditOutcome) -> AuditSeverity {
        match (self, outcome) {
            (Self::AuditStoreFailure, _) => AuditSeverity::Critical,
            (Self::RoleAccessDenied, _) => AuditSeverity::Warning,
            (Self::RoleAssignmentAttempt, _) => AuditSeverity::Notice,
            (
                Self::RoleAssigned
                | Self::RoleReactivated
                | Self::RoleRemoved
                | Self::RoleCreated
                | Self::RoleDeleted,
                AuditOutcome::Failure,
            ) => AuditSeverity::Warning,
            (
                Self::RoleAssigned
                | Self::RoleReactivated
                | Self::RoleRemoved
                | Self::RoleCreated
                | Self::RoleDeleted
                | Self::RoleAccessGranted,
                _,
            ) => AuditSeverity::Info,
        }
    }
}

impl FromStr for AuditEventType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|event_type| event_type.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown audit event type '{value}'")))
    }
}

/// Whether the audited operation took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The operation took effect.
    Success,
    /// The operation was rejected or had no effect.
    Failure,
}

impl AuditOutcome {
    /// Returns a stable storage value for this outcome.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl FromStr for AuditOutcome {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            _ => Err(AppError::Validation(format!(
                "unknown audit outcome value '{value}'"
            ))),
        }
    }
}

/// Operational severity derived from event type and outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    /// Routine state change.
    Info,
    /// Redundant request worth tracing.
    Notice,
    /// Rejected operation or denied access.
    Warning,
    /// Audit trail integrity is at risk.
    Critical,
}

impl AuditSeverity {
    /// Returns a stable storage value for this severity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Open structured detail payload attached to an audit record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditDetail(Map<String, Value>);

impl AuditDetail {
    /// Creates an empty detail map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the map with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the failure reason, if present.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.get(DETAIL_REASON).and_then(Value::as_str)
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the map has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the map into a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for AuditDetail {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Immutable account of one state change or access decision.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    /// Stable record identifier.
    pub id: AuditRecordId,
    /// Wall-clock creation time.
    pub timestamp: DateTime<Utc>,
    /// Identity that triggered the event.
    pub actor: Actor,
    /// Event classification.
    pub event_type: AuditEventType,
    /// Whether the operation took effect.
    pub outcome: AuditOutcome,
    /// Kind of resource targeted, when applicable.
    pub resource_type: Option<String>,
    /// Identifier of the targeted resource, when applicable.
    pub resource_id: Option<String>,
    /// Transport details forwarded by the caller.
    pub request: RequestContext,
    /// Human-readable summary.
    pub message: String,
    /// Open structured payload.
    pub detail: AuditDetail,
}

impl AuditRecord {
    /// Returns the acting principal id, if the actor is a principal.
    #[must_use]
    pub fn actor_id(&self) -> Option<PrincipalId> {
        self.actor.principal_id()
    }

    /// Returns the operational severity of this record.
    #[must_use]
    pub fn severity(&self) -> AuditSeverity {
        self.event_type.severity(self.outcome)
    }

    /// Returns whether the record was triggered by or targets `principal_id`.
    #[must_use]
    pub fn concerns_principal(&self, principal_id: PrincipalId) -> bool {
        if self.actor_id() == Some(principal_id) {
            return true;
        }

        self.resource_type.as_deref() == Some(RESOURCE_PRINCIPAL)
            && self.resource_id.as_deref() == Some(principal_id.to_string().as_str())
    }

    /// Serializes the record in its external shape. Absent fields are `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "id": self.id.to_string(),
            "timestamp": self.timestamp.to_rfc3339(),
            "actor_id": self.actor_id().map(|principal_id| principal_id.to_string()),
            "actor_kind": self.actor.kind(),
            "event_type": self.event_type.as_str(),
            "outcome": self.outcome.as_str(),
            "severity": self.severity().as_str(),
            "resource_type": self.resource_type,
            "resource_id": self.resource_id,
            "source_ip": self.request.source_ip,
            "user_agent": self.request.user_agent,
            "request_path": self.request.request_path,
            "request_method": self.request.request_method,
            "message": self.message,
            "detail": self.detail.clone().into_value(),
        })
    }
}

/// Audit record as persisted by the compliance store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAuditRecord {
    /// Store-assigned monotonic sequence, the tie-break for equal timestamps.
    pub sequence: i64,
    /// Persisted record.
    pub record: AuditRecord,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::Utc;
    use rolekeeper_core::{Actor, AuditRecordId, PrincipalId, RequestContext};
    use serde_json::Value;

    use super::{
        AuditDetail, AuditEventType, AuditOutcome, AuditRecord, AuditSeverity, RESOURCE_PRINCIPAL,
    };

    fn record(actor: Actor, resource_id: Option<String>) -> AuditRecord {
        AuditRecord {
            id: AuditRecordId::new(),
            timestamp: Utc::now(),
            actor,
            event_type: AuditEventType::RoleAssigned,
            outcome: AuditOutcome::Success,
            resource_type: resource_id.as_ref().map(|_| RESOURCE_PRINCIPAL.to_owned()),
            resource_id,
            request: RequestContext::default(),
            message: "role assigned".to_owned(),
            detail: AuditDetail::new().with("role_name", "ADMIN"),
        }
    }

    #[test]
    fn every_event_type_roundtrips_storage_value() {
        for event_type in AuditEventType::all() {
            let restored = AuditEventType::from_str(event_type.as_str());
            assert_eq!(restored.ok(), Some(*event_type));
        }
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        assert!(AuditEventType::from_str("ROLE_ASSIGNED").is_err());
    }

    #[test]
    fn severity_escalates_store_failures_and_denials() {
        assert_eq!(
            AuditEventType::AuditStoreFailure.severity(AuditOutcome::Failure),
            AuditSeverity::Critical
        );
        assert_eq!(
            AuditEventType::RoleAccessDenied.severity(AuditOutcome::Failure),
            AuditSeverity::Warning
        );
        assert_eq!(
            AuditEventType::RoleAssignmentAttempt.severity(AuditOutcome::Failure),
            AuditSeverity::Notice
        );
        assert_eq!(
            AuditEventType::RoleAssigned.severity(AuditOutcome::Success),
            AuditSeverity::Info
        );
    }

    #[test]
    fn external_shape_keeps_absent_fields_as_null() {
        let value = record(Actor::System, None).to_json();

        assert_eq!(value["actor_id"], Value::Null);
        assert_eq!(value["actor_kind"], "system");
        assert_eq!(value["resource_type"], Value::Null);
        assert_eq!(value["source_ip"], Value::Null);
        assert_eq!(value["request_method"], Value::Null);
        assert_eq!(value["event_type"], "role_assigned");
        assert_eq!(value["detail"]["role_name"], "ADMIN");
    }

    #[test]
    fn record_concerns_actor_and_target_principal() {
        let actor_id = PrincipalId::new();
        let target_id = PrincipalId::new();
        let record = record(Actor::Principal(actor_id), Some(target_id.to_string()));

        assert!(record.concerns_principal(actor_id));
        assert!(record.concerns_principal(target_id));
        assert!(!record.concerns_principal(PrincipalId::new()));
    }
}
