//! Lock-owning lifecycle coordinator.
//!
//! `LifecycleService` is the only writer to the record store and the
//! change request ledger. Every submit/resolve call acquires the
//! per-record lock around its read-check-write sequence, so two
//! checkers can never both apply the same pending action.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use tresor_shared::types::{ChangeRequestId, FieldMap, RecordId, UserId};

use crate::workflow::diff::diff;
use crate::workflow::error::WorkflowError;
use crate::workflow::ledger::ChangeRequestLedger;
use crate::workflow::machine::LifecycleMachine;
use crate::workflow::schema::SchemaRegistry;
use crate::workflow::store::{RecordFilter, RecordStore};
use crate::workflow::types::{
    ChangeAction, ChangeRequest, Decision, MasterRecord, ProcessingStatus,
};

/// Outcome of a submission.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// A change request now awaits a checker.
    Submitted(ChangeRequest),
    /// The proposed edit differed in nothing; no request was created,
    /// no state changed, and no audit entry was written.
    NoOp(MasterRecord),
    /// A never-approved draft was discarded directly.
    Discarded(RecordId),
}

/// The maker-checker lifecycle engine.
pub struct LifecycleService {
    store: Arc<RecordStore>,
    ledger: Arc<ChangeRequestLedger>,
    schemas: Arc<SchemaRegistry>,
}

impl LifecycleService {
    /// Creates an engine over an empty store and ledger.
    #[must_use]
    pub fn new(schemas: SchemaRegistry) -> Self {
        Self {
            store: Arc::new(RecordStore::new()),
            ledger: Arc::new(ChangeRequestLedger::new()),
            schemas: Arc::new(schemas),
        }
    }

    /// The entity schema registry.
    #[must_use]
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub(crate) fn store(&self) -> &RecordStore {
        &self.store
    }

    pub(crate) fn ledger(&self) -> &ChangeRequestLedger {
        &self.ledger
    }

    /// Proposes a new record.
    ///
    /// A draft stays with the maker and carries no change request until
    /// submitted; otherwise the record enters `PendingApproval` with a
    /// CREATE request.
    pub async fn create(
        &self,
        entity_type: &str,
        fields: FieldMap,
        requested_by: UserId,
        as_draft: bool,
    ) -> Result<MasterRecord, WorkflowError> {
        let schema = self.schemas.get(entity_type)?;
        schema.validate_fields(&fields)?;
        if !as_draft {
            schema.validate_required(&fields)?;
        }

        let status = if as_draft {
            ProcessingStatus::Draft
        } else {
            ProcessingStatus::PendingApproval
        };
        let record = MasterRecord::new(entity_type.to_string(), fields, requested_by, status);

        if !as_draft {
            let request = ChangeRequest::new(
                record.id,
                record.entity_type.clone(),
                ChangeAction::Create,
                record.fields.clone(),
                None,
                requested_by,
            );
            self.ledger.append(request);
        }
        self.store.insert(record.clone());

        info!(record_id = %record.id, entity_type, draft = as_draft, "record created");
        Ok(record)
    }

    /// Submits a draft for approval.
    pub async fn submit_draft(
        &self,
        record_id: RecordId,
        requested_by: UserId,
    ) -> Result<ChangeRequest, WorkflowError> {
        let _guard = self.store.lock(record_id).await;

        let record = self.store.get(record_id)?;
        let schema = self.schemas.get(&record.entity_type)?;
        schema.validate_required(&record.fields)?;

        let next_status = LifecycleMachine::submit_status(
            record_id,
            record.processing_status,
            ChangeAction::Create,
        )?;

        let request = ChangeRequest::new(
            record_id,
            record.entity_type.clone(),
            ChangeAction::Create,
            record.fields.clone(),
            None,
            requested_by,
        );
        self.ledger.append(request.clone());

        let mut next = record;
        next.processing_status = next_status;
        next.updated_at = Utc::now();
        self.store.put(next);

        info!(%record_id, action_id = %request.action_id, "draft submitted for approval");
        Ok(request)
    }

    /// Revises a draft in place. Drafts belong to the maker, so no
    /// change request is involved.
    pub async fn revise_draft(
        &self,
        record_id: RecordId,
        edited: FieldMap,
    ) -> Result<MasterRecord, WorkflowError> {
        let _guard = self.store.lock(record_id).await;

        let record = self.store.get(record_id)?;
        if record.processing_status != ProcessingStatus::Draft {
            return Err(WorkflowError::InvalidTransition {
                from: record.processing_status,
                action: ChangeAction::Update,
            });
        }
        let schema = self.schemas.get(&record.entity_type)?;
        schema.validate_fields(&edited)?;

        let mut next = record;
        next.fields.extend(edited);
        next.updated_at = Utc::now();
        self.store.put(next.clone());
        Ok(next)
    }

    /// Proposes new values for a record.
    ///
    /// The diff engine decides whether anything actually changed; an
    /// empty delta is a no-op success with zero side effects.
    pub async fn submit_update(
        &self,
        record_id: RecordId,
        edited: FieldMap,
        reason: Option<String>,
        requested_by: UserId,
    ) -> Result<SubmitOutcome, WorkflowError> {
        let _guard = self.store.lock(record_id).await;
        self.submit_update_locked(record_id, edited, reason, requested_by)
    }

    /// Proposes deletion of a record. `reason` is mandatory.
    ///
    /// Deleting a draft discards it directly: it was never approved, so
    /// no checker is involved.
    pub async fn submit_delete(
        &self,
        record_id: RecordId,
        reason: Option<String>,
        requested_by: UserId,
    ) -> Result<SubmitOutcome, WorkflowError> {
        let _guard = self.store.lock(record_id).await;
        self.submit_delete_locked(record_id, reason, requested_by)
    }

    /// Resolves a pending change request.
    ///
    /// Exactly one of two concurrent resolutions of the same action can
    /// succeed; the loser observes `AlreadyResolved`.
    pub async fn resolve(
        &self,
        action_id: ChangeRequestId,
        decision: Decision,
        checker: UserId,
        comment: Option<String>,
    ) -> Result<MasterRecord, WorkflowError> {
        let request = self
            .ledger
            .get(action_id)
            .ok_or(WorkflowError::RequestNotFound(action_id))?;

        let _guard = self.store.lock(request.record_id).await;
        self.resolve_locked(action_id, decision, checker, comment)
    }

    /// Fetches a record by id, including logically deleted ones.
    pub fn get(&self, record_id: RecordId) -> Result<MasterRecord, WorkflowError> {
        self.store.get(record_id)
    }

    /// Lists records matching the filter.
    #[must_use]
    pub fn list(&self, filter: &RecordFilter) -> Vec<MasterRecord> {
        self.store.list(filter)
    }

    /// Full audit lineage for a record, oldest first.
    #[must_use]
    pub fn history(&self, record_id: RecordId) -> Vec<ChangeRequest> {
        self.ledger.history(record_id)
    }

    // ------------------------------------------------------------------
    // Locked internals, shared with the bulk coordinator. Callers hold
    // the record lock.
    // ------------------------------------------------------------------

    pub(crate) fn submit_update_locked(
        &self,
        record_id: RecordId,
        edited: FieldMap,
        reason: Option<String>,
        requested_by: UserId,
    ) -> Result<SubmitOutcome, WorkflowError> {
        let record = self.store.get(record_id)?;
        if record.deleted {
            return Err(WorkflowError::RecordDeleted(record_id));
        }
        let schema = self.schemas.get(&record.entity_type)?;
        schema.validate_fields(&edited)?;

        let next_status = LifecycleMachine::submit_status(
            record_id,
            record.processing_status,
            ChangeAction::Update,
        )?;

        let delta = diff(&record.fields, &edited);
        if delta.is_empty() {
            debug!(%record_id, "edit submission is a no-op");
            return Ok(SubmitOutcome::NoOp(record));
        }

        let request = ChangeRequest::new(
            record_id,
            record.entity_type.clone(),
            ChangeAction::Update,
            delta,
            reason,
            requested_by,
        );
        self.ledger.append(request.clone());

        let mut next = record;
        next.processing_status = next_status;
        next.updated_at = Utc::now();
        self.store.put(next);

        info!(%record_id, action_id = %request.action_id, "edit submitted for approval");
        Ok(SubmitOutcome::Submitted(request))
    }

    pub(crate) fn submit_delete_locked(
        &self,
        record_id: RecordId,
        reason: Option<String>,
        requested_by: UserId,
    ) -> Result<SubmitOutcome, WorkflowError> {
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .ok_or(WorkflowError::DeleteReasonRequired)?;

        let record = self.store.get(record_id)?;
        // Deletion is terminal; a tombstone cannot be deleted again.
        if record.deleted {
            return Err(WorkflowError::RecordDeleted(record_id));
        }

        if record.processing_status == ProcessingStatus::Draft {
            self.store.remove(record_id);
            info!(%record_id, "draft discarded");
            return Ok(SubmitOutcome::Discarded(record_id));
        }

        let next_status = LifecycleMachine::submit_status(
            record_id,
            record.processing_status,
            ChangeAction::Delete,
        )?;

        let request = ChangeRequest::new(
            record_id,
            record.entity_type.clone(),
            ChangeAction::Delete,
            FieldMap::new(),
            Some(reason),
            requested_by,
        );
        self.ledger.append(request.clone());

        let mut next = record;
        next.processing_status = next_status;
        next.updated_at = Utc::now();
        self.store.put(next);

        info!(%record_id, action_id = %request.action_id, "delete submitted for approval");
        Ok(SubmitOutcome::Submitted(request))
    }

    pub(crate) fn resolve_locked(
        &self,
        action_id: ChangeRequestId,
        decision: Decision,
        checker: UserId,
        comment: Option<String>,
    ) -> Result<MasterRecord, WorkflowError> {
        let request = self
            .ledger
            .get(action_id)
            .ok_or(WorkflowError::RequestNotFound(action_id))?;
        if !request.is_pending() {
            return Err(WorkflowError::AlreadyResolved(action_id));
        }

        let record = self.store.get(request.record_id)?;
        let now = Utc::now();

        // Guards run against pure snapshots before anything mutates;
        // after this point both mutations commit under the record lock.
        let snapshot = match decision {
            Decision::Approve => LifecycleMachine::approve(&record, &request, checker, now)?,
            Decision::Reject => LifecycleMachine::reject(&record, &request, now)?,
        };

        self.ledger
            .resolve(action_id, decision, checker, comment, now)?;
        self.store.put(snapshot.clone());

        info!(
            record_id = %request.record_id,
            %action_id,
            action = %request.action,
            decision = ?decision,
            "change request resolved"
        );
        Ok(snapshot)
    }
}
