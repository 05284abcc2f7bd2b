//! Application services and ports.

#![forbid(unsafe_code)]

mod access_gate;
mod assignment_service;
mod audit_log_service;
mod audit_writer;
mod authorization_service;
mod rbac_ports;
mod role_catalog_service;

#[cfg(test)]
mod test_fakes;

pub use access_gate::{AccessGate, AccessRequest, EvaluatedAccess};
pub use assignment_service::AssignmentService;
pub use audit_log_service::AuditLogService;
pub use audit_writer::AuditWriter;
pub use authorization_service::{AuthorizationService, CapabilityEvaluation};
pub use rbac_ports::{
    AssignmentRepository, AuditEvent, AuditLogSink, AuditReceipt, AuditRecordQuery,
    AuditRecordRepository, AuditStore, ComplianceDelivery, MAX_AUDIT_QUERY_LIMIT,
    PrincipalDirectory, RoleDeletion, RoleRepository,
};
pub use role_catalog_service::RoleCatalogService;
