use serde::{Deserialize, Serialize};

use crate::PrincipalId;

/// Identity that triggered an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// An authenticated principal.
    Principal(PrincipalId),
    /// Internal automation with no human principal.
    System,
    /// An unauthenticated caller.
    Anonymous,
}

impl Actor {
    /// Returns the principal id when the actor is a principal.
    #[must_use]
    pub fn principal_id(&self) -> Option<PrincipalId> {
        match self {
            Self::Principal(principal_id) => Some(*principal_id),
            Self::System | Self::Anonymous => None,
        }
    }

    /// Returns a stable storage value for the actor kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Principal(_) => "principal",
            Self::System => "system",
            Self::Anonymous => "anonymous",
        }
    }

    /// Rebuilds an actor from its stored kind and optional principal id.
    #[must_use]
    pub fn from_storage(kind: &str, principal_id: Option<PrincipalId>) -> Self {
        match (kind, principal_id) {
            (_, Some(principal_id)) => Self::Principal(principal_id),
            ("anonymous", None) => Self::Anonymous,
            _ => Self::System,
        }
    }
}

/// Optional transport details forwarded by the boundary layer.
///
/// Every field may be absent; audit sinks record missing values as null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Client network address.
    pub source_ip: Option<String>,
    /// Client agent string.
    pub user_agent: Option<String>,
    /// Request path.
    pub request_path: Option<String>,
    /// Request method.
    pub request_method: Option<String>,
}

/// Actor plus request details for one audited call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    actor: Actor,
    request: RequestContext,
}

impl OperationContext {
    /// Creates a context for an operation performed by a principal.
    #[must_use]
    pub fn principal(principal_id: PrincipalId) -> Self {
        Self {
            actor: Actor::Principal(principal_id),
            request: RequestContext::default(),
        }
    }

    /// Creates a context for internal automation.
    #[must_use]
    pub fn system() -> Self {
        Self {
            actor: Actor::System,
            request: RequestContext::default(),
        }
    }

    /// Creates a context for an unauthenticated caller.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            actor: Actor::Anonymous,
            request: RequestContext::default(),
        }
    }

    /// Attaches transport details.
    #[must_use]
    pub fn with_request(mut self, request: RequestContext) -> Self {
        self.request = request;
        self
    }

    /// Returns the acting identity.
    #[must_use]
    pub fn actor(&self) -> Actor {
        self.actor
    }

    /// Returns the transport details.
    #[must_use]
    pub fn request(&self) -> &RequestContext {
        &self.request
    }
}
