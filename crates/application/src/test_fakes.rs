use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use rolekeeper_core::{Actor, AppError, AppResult, PrincipalId, RoleId};
use rolekeeper_domain::{
    ActivationOutcome, AssignmentHistoryEntry, AssignmentLedger, AuditEventType, AuditRecord,
    DeactivationOutcome, Role, RoleName,
};

use crate::{
    AccessGate, AssignmentRepository, AssignmentService, AuditLogSink, AuditStore, AuditWriter,
    AuthorizationService, PrincipalDirectory, RoleCatalogService, RoleDeletion, RoleRepository,
};

#[derive(Default)]
pub(crate) struct RecordingLogSink {
    records: StdMutex<Vec<AuditRecord>>,
    failing: AtomicBool,
}

impl RecordingLogSink {
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(_) => panic!("recording log sink lock poisoned"),
        }
    }

    pub(crate) fn records_of(&self, event_type: AuditEventType) -> Vec<AuditRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.event_type == event_type)
            .collect()
    }
}

impl AuditLogSink for RecordingLogSink {
    fn append(&self, record: &AuditRecord) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("log stream closed".to_owned()));
        }

        self.records
            .lock()
            .map_err(|_| AppError::Internal("recording log sink lock poisoned".to_owned()))?
            .push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditStore {
    records: Mutex<Vec<AuditRecord>>,
    failing: AtomicBool,
}

impl FakeAuditStore {
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) async fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl AuditStore for FakeAuditStore {
    async fn append_record(&self, record: &AuditRecord) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("compliance store unavailable".to_owned()));
        }

        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
struct FakeRbacState {
    roles: HashMap<RoleId, Role>,
    ledger: AssignmentLedger,
}

#[derive(Default)]
pub(crate) struct FakeRbacRepository {
    state: Mutex<FakeRbacState>,
}

impl FakeRbacRepository {
    pub(crate) async fn history_len(&self) -> usize {
        self.state.lock().await.ledger.events().len()
    }
}

#[async_trait]
impl RoleRepository for FakeRbacRepository {
    async fn create_role(&self, role: Role) -> AppResult<Role> {
        let mut state = self.state.lock().await;
        if state.roles.values().any(|stored| stored.name() == role.name()) {
            return Err(AppError::DuplicateName(format!(
                "role '{}' already exists",
                role.name()
            )));
        }

        state.roles.insert(role.id(), role.clone());
        Ok(role)
    }

    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.state.lock().await.roles.get(&role_id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .values()
            .find(|role| role.name().as_str() == name)
            .cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.state.lock().await.roles.values().cloned().collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn delete_role_if_unused(&self, role_id: RoleId) -> AppResult<RoleDeletion> {
        let mut state = self.state.lock().await;
        let Some(role) = state.roles.get(&role_id).cloned() else {
            return Ok(RoleDeletion::NotFound);
        };

        let active_assignments = state.ledger.active_count_for_role(role_id);
        if active_assignments > 0 {
            return Ok(RoleDeletion::InUse {
                role,
                active_assignments: active_assignments as u64,
            });
        }

        state.roles.remove(&role_id);
        Ok(RoleDeletion::Deleted(role))
    }
}

#[async_trait]
impl AssignmentRepository for FakeRbacRepository {
    async fn activate_assignment(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<ActivationOutcome> {
        let mut state = self.state.lock().await;
        if !state.roles.contains_key(&role.id()) {
            return Err(AppError::NotFound(format!("role '{}' was not found", role.id())));
        }

        Ok(state.ledger.activate(principal_id, role, actor, now))
    }

    async fn deactivate_assignment(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<DeactivationOutcome> {
        Ok(self
            .state
            .lock()
            .await
            .ledger
            .deactivate(principal_id, role, actor, now))
    }

    async fn list_active_roles(&self, principal_id: PrincipalId) -> AppResult<Vec<Role>> {
        let state = self.state.lock().await;
        let mut roles: Vec<Role> = state
            .ledger
            .active_role_ids(principal_id)
            .into_iter()
            .filter_map(|role_id| state.roles.get(&role_id).cloned())
            .collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn list_history(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<AssignmentHistoryEntry>> {
        Ok(self.state.lock().await.ledger.history(principal_id))
    }
}

pub(crate) struct FakePrincipalDirectory {
    principals: HashSet<PrincipalId>,
}

#[async_trait]
impl PrincipalDirectory for FakePrincipalDirectory {
    async fn principal_exists(&self, principal_id: PrincipalId) -> AppResult<bool> {
        Ok(self.principals.contains(&principal_id))
    }
}

pub(crate) struct FailingAssignmentRepository;

#[async_trait]
impl AssignmentRepository for FailingAssignmentRepository {
    async fn activate_assignment(
        &self,
        _principal_id: PrincipalId,
        _role: &Role,
        _actor: Actor,
        _now: DateTime<Utc>,
    ) -> AppResult<ActivationOutcome> {
        Err(AppError::Internal("assignment store offline".to_owned()))
    }

    async fn deactivate_assignment(
        &self,
        _principal_id: PrincipalId,
        _role: &Role,
        _actor: Actor,
        _now: DateTime<Utc>,
    ) -> AppResult<DeactivationOutcome> {
        Err(AppError::Internal("assignment store offline".to_owned()))
    }

    async fn list_active_roles(&self, _principal_id: PrincipalId) -> AppResult<Vec<Role>> {
        Err(AppError::Internal("assignment store offline".to_owned()))
    }

    async fn list_history(
        &self,
        _principal_id: PrincipalId,
    ) -> AppResult<Vec<AssignmentHistoryEntry>> {
        Err(AppError::Internal("assignment store offline".to_owned()))
    }
}

/// Wires every service against shared fakes.
pub(crate) struct Harness {
    pub(crate) rbac: Arc<FakeRbacRepository>,
    pub(crate) log_sink: Arc<RecordingLogSink>,
    pub(crate) store: Arc<FakeAuditStore>,
    pub(crate) principals: Arc<FakePrincipalDirectory>,
}

impl Harness {
    pub(crate) fn with_principals(principals: &[PrincipalId]) -> Self {
        Self {
            rbac: Arc::new(FakeRbacRepository::default()),
            log_sink: Arc::new(RecordingLogSink::default()),
            store: Arc::new(FakeAuditStore::default()),
            principals: Arc::new(FakePrincipalDirectory {
                principals: principals.iter().copied().collect(),
            }),
        }
    }

    pub(crate) fn audit_writer(&self) -> AuditWriter {
        AuditWriter::new(self.log_sink.clone(), self.store.clone())
    }

    pub(crate) fn role_catalog(&self) -> RoleCatalogService {
        RoleCatalogService::new(self.rbac.clone(), self.audit_writer())
    }

    pub(crate) fn assignments(&self) -> AssignmentService {
        AssignmentService::new(
            self.rbac.clone(),
            self.rbac.clone(),
            self.principals.clone(),
            self.audit_writer(),
        )
    }

    pub(crate) fn authorization(&self) -> AuthorizationService {
        AuthorizationService::new(self.rbac.clone())
    }

    pub(crate) fn access_gate(&self) -> AccessGate {
        AccessGate::new(self.authorization(), self.audit_writer())
    }

    pub(crate) async fn seed_role(&self, name: &str) -> Role {
        let role = match RoleName::new(name) {
            Ok(role_name) => Role::new(RoleId::new(), role_name),
            Err(error) => panic!("invalid role name in test: {error}"),
        };

        match self.rbac.create_role(role).await {
            Ok(role) => role,
            Err(error) => panic!("failed to seed role '{name}': {error}"),
        }
    }
}
