use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rolekeeper_core::{Actor, AppError, AssignmentId, PrincipalId, RoleId};
use serde::{Deserialize, Serialize};

/// Current-state row linking a principal to a role.
///
/// At most one row exists per `(principal_id, role_id)` pair; unassigning flips
/// `is_active` and a later assign reactivates the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Stable row identifier.
    pub id: AssignmentId,
    /// Principal holding the role.
    pub principal_id: PrincipalId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Identity that last activated the row.
    pub assigned_by: Actor,
    /// Timestamp of the last activation.
    pub assigned_at: DateTime<Utc>,
    /// Whether the assignment currently grants the role.
    pub is_active: bool,
}

impl RoleAssignment {
    /// Returns the principal that last activated the row, if any.
    #[must_use]
    pub fn assigned_by_id(&self) -> Option<PrincipalId> {
        self.assigned_by.principal_id()
    }
}

/// Lifecycle transition recorded in assignment history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentChange {
    /// First activation of a pair.
    Created,
    /// Soft delete of an active row.
    Deactivated,
    /// Activation of a previously deactivated row.
    Reactivated,
}

impl AssignmentChange {
    /// Returns a stable storage value for this change.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Deactivated => "deactivated",
            Self::Reactivated => "reactivated",
        }
    }

    /// Returns the `is_active` value a row holds after this change.
    #[must_use]
    pub fn leaves_active(&self) -> bool {
        match self {
            Self::Created | Self::Reactivated => true,
            Self::Deactivated => false,
        }
    }
}

impl FromStr for AssignmentChange {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "created" => Ok(Self::Created),
            "deactivated" => Ok(Self::Deactivated),
            "reactivated" => Ok(Self::Reactivated),
            _ => Err(AppError::Validation(format!(
                "unknown assignment change value '{value}'"
            ))),
        }
    }
}

/// One immutable entry of a principal's assignment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentHistoryEntry {
    /// Monotonic store sequence, used as ordering tie-break.
    pub sequence: i64,
    /// Transition that produced this entry.
    pub change: AssignmentChange,
    /// Role name at the time of the change.
    pub role_name: String,
    /// Identity that performed the change.
    pub actor: Actor,
    /// Time of the change.
    pub occurred_at: DateTime<Utc>,
    /// Row snapshot after the change.
    pub assignment: RoleAssignment,
}

/// Orders history entries newest first, breaking timestamp ties by sequence.
pub fn newest_first(left: &AssignmentHistoryEntry, right: &AssignmentHistoryEntry) -> Ordering {
    right
        .occurred_at
        .cmp(&left.occurred_at)
        .then_with(|| right.sequence.cmp(&left.sequence))
}
