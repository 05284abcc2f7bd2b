use serde_json::Value;

use rolekeeper_core::{AppResult, OperationContext, PrincipalId, RequestContext};
use rolekeeper_domain::{AccessDecision, AuditEventType};

use crate::{AuditEvent, AuditWriter, AuthorizationService, CapabilityEvaluation};

const RESOURCE_CAPABILITY: &str = "capability";
const REASON_MISSING_ROLE: &str = "missing_required_role";

/// Access check that has been requested but not yet evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    principal_id: PrincipalId,
    required: Vec<String>,
    request: RequestContext,
}

impl AccessRequest {
    /// Creates a request for any of `required` on behalf of a principal.
    #[must_use]
    pub fn new(principal_id: PrincipalId, required: &[&str], request: RequestContext) -> Self {
        Self {
            principal_id,
            required: required.iter().map(|name| (*name).to_owned()).collect(),
            request,
        }
    }

    /// Returns the checked principal.
    #[must_use]
    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }
}

/// Access check with a decision that has not yet been audited.
///
/// Only `AccessGate::conclude` turns this into an `AccessDecision`, which
/// writes the audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct EvaluatedAccess {
    request: AccessRequest,
    evaluation: CapabilityEvaluation,
}

impl EvaluatedAccess {
    /// Returns the decision this evaluation will conclude with.
    #[must_use]
    pub fn decision(&self) -> AccessDecision {
        if self.evaluation.is_granted() {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny
        }
    }

    fn audit_event(&self) -> AuditEvent {
        let evaluation = &self.evaluation;
        let event = match &evaluation.matched {
            Some(_) => AuditEvent::success(AuditEventType::RoleAccessGranted),
            None => AuditEvent::failure(AuditEventType::RoleAccessDenied, REASON_MISSING_ROLE),
        };

        let required = evaluation.required.join(",");
        let event = if evaluation.required.is_empty() {
            event.with_resource_type(RESOURCE_CAPABILITY)
        } else {
            event.with_resource(RESOURCE_CAPABILITY, required.as_str())
        };

        event
            .with_summary(format!(
                "principal {} requires [{required}]",
                self.request.principal_id
            ))
            .with_detail("required_roles", evaluation.required.clone())
            .with_detail("actual_roles", evaluation.held.clone())
            .with_detail(
                "matched_role",
                evaluation
                    .matched
                    .clone()
                    .map_or(Value::Null, Value::String),
            )
    }
}

/// Authorization decision point that audits every check it makes.
#[derive(Clone)]
pub struct AccessGate {
    authorization: AuthorizationService,
    audit_writer: AuditWriter,
}

impl AccessGate {
    /// Creates a gate from the authorization engine and audit writer.
    #[must_use]
    pub fn new(authorization: AuthorizationService, audit_writer: AuditWriter) -> Self {
        Self {
            authorization,
            audit_writer,
        }
    }

    /// Checks whether the principal holds any of the required capabilities.
    ///
    /// Denial is a decision value, not an error. Exactly one audit record is
    /// written per call; the only error is a structured log sink failure.
    pub async fn check(
        &self,
        principal_id: PrincipalId,
        required: &[&str],
        request: &RequestContext,
    ) -> AppResult<AccessDecision> {
        let evaluated = self
            .evaluate(AccessRequest::new(principal_id, required, request.clone()))
            .await;
        self.conclude(evaluated).await
    }

    /// Evaluates a request against the principal's active roles.
    pub async fn evaluate(&self, request: AccessRequest) -> EvaluatedAccess {
        let required: Vec<&str> = request.required.iter().map(String::as_str).collect();
        let evaluation = self
            .authorization
            .evaluate(request.principal_id, &required)
            .await;

        EvaluatedAccess {
            request,
            evaluation,
        }
    }

    /// Audits an evaluated request and returns its decision.
    pub async fn conclude(&self, evaluated: EvaluatedAccess) -> AppResult<AccessDecision> {
        let decision = evaluated.decision();
        let context = OperationContext::principal(evaluated.request.principal_id)
            .with_request(evaluated.request.request.clone());

        self.audit_writer
            .record(&context, evaluated.audit_event())
            .await?;

        Ok(decision)
    }
}
