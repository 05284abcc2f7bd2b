//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod assignment;
pub mod assignment_ledger;
mod audit;
mod role;

pub use access::AccessDecision;
pub use assignment::{AssignmentChange, AssignmentHistoryEntry, RoleAssignment, newest_first};
pub use assignment_ledger::{ActivationOutcome, AssignmentLedger, DeactivationOutcome};
pub use audit::{
    AuditDetail, AuditEventType, AuditOutcome, AuditRecord, AuditSeverity, DETAIL_REASON,
    RESOURCE_PRINCIPAL, StoredAuditRecord,
};
pub use role::{ROLE_NAME_MAX_LENGTH, Role, RoleName};
