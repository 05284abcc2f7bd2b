use super::*;

use chrono::Utc;
use rolekeeper_core::{AssignmentId, OperationContext};
use rolekeeper_domain::{
    ActivationOutcome, AuditEventType, DeactivationOutcome, RESOURCE_PRINCIPAL, RoleAssignment,
};

use crate::AuditEvent;

impl AssignmentService {
    /// Grants roles to a principal and emits one audit event per role.
    ///
    /// Roles already active for the principal are left untouched and audited
    /// as `already_assigned` failures; the batch itself still succeeds.
    /// Returns the rows created or reactivated by this call.
    pub async fn assign(
        &self,
        context: &OperationContext,
        principal_id: PrincipalId,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<RoleAssignment>> {
        self.require_principal(principal_id).await?;
        let roles = self.resolve_roles(role_ids).await?;

        let mut changed = Vec::with_capacity(roles.len());
        for role in &roles {
            let outcome = self
                .assignments
                .activate_assignment(principal_id, role, context.actor(), Utc::now())
                .await?;

            let event = match &outcome {
                ActivationOutcome::Created(_) => AuditEvent::success(AuditEventType::RoleAssigned),
                ActivationOutcome::Reactivated(_) => {
                    AuditEvent::success(AuditEventType::RoleReactivated)
                }
                ActivationOutcome::AlreadyActive(_) => AuditEvent::failure(
                    AuditEventType::RoleAssignmentAttempt,
                    "already_assigned",
                )
                .with_detail("requested_change", "assign"),
            };
            self.audit_writer
                .record(
                    context,
                    describe_assignment(event, principal_id, role, Some(outcome.assignment().id)),
                )
                .await?;

            match outcome {
                ActivationOutcome::Created(assignment)
                | ActivationOutcome::Reactivated(assignment) => changed.push(assignment),
                ActivationOutcome::AlreadyActive(_) => {}
            }
        }

        Ok(changed)
    }

    /// Soft-deletes role assignments and emits one audit event per role.
    ///
    /// Roles without an active row are audited as `not_found_or_inactive`
    /// failures; the batch itself still succeeds. Returns the rows
    /// deactivated by this call.
    pub async fn unassign(
        &self,
        context: &OperationContext,
        principal_id: PrincipalId,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<RoleAssignment>> {
        self.require_principal(principal_id).await?;
        let roles = self.resolve_roles(role_ids).await?;

        let mut changed = Vec::with_capacity(roles.len());
        for role in &roles {
            let outcome = self
                .assignments
                .deactivate_assignment(principal_id, role, context.actor(), Utc::now())
                .await?;

            match outcome {
                DeactivationOutcome::Deactivated(assignment) => {
                    self.audit_writer
                        .record(
                            context,
                            describe_assignment(
                                AuditEvent::success(AuditEventType::RoleRemoved),
                                principal_id,
                                role,
                                Some(assignment.id),
                            ),
                        )
                        .await?;
                    changed.push(assignment);
                }
                DeactivationOutcome::NotActive => {
                    self.audit_writer
                        .record(
                            context,
                            describe_assignment(
                                AuditEvent::failure(
                                    AuditEventType::RoleAssignmentAttempt,
                                    "not_found_or_inactive",
                                )
                                .with_detail("requested_change", "unassign"),
                                principal_id,
                                role,
                                None,
                            ),
                        )
                        .await?;
                }
            }
        }

        Ok(changed)
    }
}

fn describe_assignment(
    event: AuditEvent,
    principal_id: PrincipalId,
    role: &Role,
    assignment_id: Option<AssignmentId>,
) -> AuditEvent {
    event
        .with_resource(RESOURCE_PRINCIPAL, principal_id.to_string())
        .with_summary(format!("{} for principal {principal_id}", role.name()))
        .with_detail("role_id", role.id().to_string())
        .with_detail("role_name", role.name().as_str())
        .with_detail(
            "assignment_id",
            assignment_id.map(|assignment_id| assignment_id.to_string()),
        )
}
