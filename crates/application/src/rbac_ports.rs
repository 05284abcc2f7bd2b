mod assignments;
mod audit;
mod principals;
mod roles;

pub use assignments::AssignmentRepository;
pub use audit::{
    AuditEvent, AuditLogSink, AuditReceipt, AuditRecordQuery, AuditRecordRepository, AuditStore,
    ComplianceDelivery, MAX_AUDIT_QUERY_LIMIT,
};
pub use principals::PrincipalDirectory;
pub use roles::{RoleDeletion, RoleRepository};
