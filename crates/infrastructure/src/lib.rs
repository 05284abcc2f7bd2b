//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_store;
mod in_memory_principal_directory;
mod in_memory_rbac_repository;
mod json_lines_audit_log_sink;
mod postgres_audit_store;
mod postgres_principal_directory;
mod postgres_rbac_repository;
mod tracing_audit_log_sink;

pub use in_memory_audit_store::InMemoryAuditStore;
pub use in_memory_principal_directory::InMemoryPrincipalDirectory;
pub use in_memory_rbac_repository::InMemoryRbacRepository;
pub use json_lines_audit_log_sink::JsonLinesAuditLogSink;
pub use postgres_audit_store::PostgresAuditStore;
pub use postgres_principal_directory::PostgresPrincipalDirectory;
pub use postgres_rbac_repository::PostgresRbacRepository;
pub use tracing_audit_log_sink::TracingAuditLogSink;
