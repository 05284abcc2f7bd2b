//! Append-only assignment history with an incrementally maintained
//! current-state projection.
//!
//! Every activation or deactivation appends one [`AssignmentHistoryEntry`] and
//! updates the single projection row for the `(principal, role)` pair in the
//! same call, so the projection never needs to be recomputed from the event
//! sequence on read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rolekeeper_core::{Actor, AssignmentId, PrincipalId, RoleId};

use crate::{AssignmentChange, AssignmentHistoryEntry, Role, RoleAssignment, newest_first};

/// Result of requesting an active assignment for a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// No row existed; a new active row was created.
    Created(RoleAssignment),
    /// An inactive row was flipped back to active.
    Reactivated(RoleAssignment),
    /// The pair was already active; nothing changed.
    AlreadyActive(RoleAssignment),
}

impl ActivationOutcome {
    /// Returns the row as it stands after the call.
    #[must_use]
    pub fn assignment(&self) -> &RoleAssignment {
        match self {
            Self::Created(assignment)
            | Self::Reactivated(assignment)
            | Self::AlreadyActive(assignment) => assignment,
        }
    }
}

/// Result of requesting deactivation of a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeactivationOutcome {
    /// The active row was soft-deleted.
    Deactivated(RoleAssignment),
    /// No active row existed; nothing changed.
    NotActive,
}

/// In-process assignment store state: event sequence plus projection.
#[derive(Debug, Clone, Default)]
pub struct AssignmentLedger {
    rows: HashMap<(PrincipalId, RoleId), RoleAssignment>,
    events: Vec<AssignmentHistoryEntry>,
    next_sequence: i64,
}

impl AssignmentLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates the pair, creating or reactivating its row as needed.
    pub fn activate(
        &mut self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> ActivationOutcome {
        let key = (principal_id, role.id());

        match self.rows.get_mut(&key) {
            Some(row) if row.is_active => ActivationOutcome::AlreadyActive(row.clone()),
            Some(row) => {
                row.is_active = true;
                row.assigned_at = now;
                row.assigned_by = actor;
                let assignment = row.clone();
                self.append(
                    AssignmentChange::Reactivated,
                    role,
                    actor,
                    now,
                    assignment.clone(),
                );
                ActivationOutcome::Reactivated(assignment)
            }
            None => {
                let assignment = RoleAssignment {
                    id: AssignmentId::new(),
                    principal_id,
                    role_id: role.id(),
                    assigned_by: actor,
                    assigned_at: now,
                    is_active: true,
                };
                self.rows.insert(key, assignment.clone());
                self.append(
                    AssignmentChange::Created,
                    role,
                    actor,
                    now,
                    assignment.clone(),
                );
                ActivationOutcome::Created(assignment)
            }
        }
    }

    /// Soft-deletes the pair when it is active.
    pub fn deactivate(
        &mut self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> DeactivationOutcome {
        let Some(row) = self.rows.get_mut(&(principal_id, role.id())) else {
            return DeactivationOutcome::NotActive;
        };
        if !row.is_active {
            return DeactivationOutcome::NotActive;
        }

        row.is_active = false;
        let assignment = row.clone();
        self.append(
            AssignmentChange::Deactivated,
            role,
            actor,
            now,
            assignment.clone(),
        );

        DeactivationOutcome::Deactivated(assignment)
    }

    /// Returns the projection row for a pair, active or not.
    #[must_use]
    pub fn assignment(&self, principal_id: PrincipalId, role_id: RoleId) -> Option<&RoleAssignment> {
        self.rows.get(&(principal_id, role_id))
    }

    /// Returns role ids currently active for a principal.
    #[must_use]
    pub fn active_role_ids(&self, principal_id: PrincipalId) -> Vec<RoleId> {
        self.rows
            .values()
            .filter(|row| row.principal_id == principal_id && row.is_active)
            .map(|row| row.role_id)
            .collect()
    }

    /// Counts active rows referencing a role across all principals.
    #[must_use]
    pub fn active_count_for_role(&self, role_id: RoleId) -> usize {
        self.rows
            .values()
            .filter(|row| row.role_id == role_id && row.is_active)
            .count()
    }

    /// Returns every history entry for a principal, newest first.
    #[must_use]
    pub fn history(&self, principal_id: PrincipalId) -> Vec<AssignmentHistoryEntry> {
        let mut entries: Vec<AssignmentHistoryEntry> = self
            .events
            .iter()
            .filter(|entry| entry.assignment.principal_id == principal_id)
            .cloned()
            .collect();
        entries.sort_by(newest_first);
        entries
    }

    /// Returns the full event sequence in append order.
    #[must_use]
    pub fn events(&self) -> &[AssignmentHistoryEntry] {
        &self.events
    }

    fn append(
        &mut self,
        change: AssignmentChange,
        role: &Role,
        actor: Actor,
        occurred_at: DateTime<Utc>,
        assignment: RoleAssignment,
    ) {
        self.next_sequence += 1;
        self.events.push(AssignmentHistoryEntry {
            sequence: self.next_sequence,
            change,
            role_name: role.name().as_str().to_owned(),
            actor,
            occurred_at,
            assignment,
        });
    }
}
