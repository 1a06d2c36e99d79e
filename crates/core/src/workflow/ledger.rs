//! Change request ledger.
//!
//! Append-style record of pending and resolved actions. Requests are
//! never deleted; resolution populates the checker fields exactly once.
//! All writes come through the lifecycle service under the record lock,
//! so per-record invariants (at most one pending request) hold without
//! extra synchronization here.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tresor_shared::types::{ChangeRequestId, RecordId, UserId};

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{ChangeRequest, Decision, Resolution};

/// In-process ledger of change requests.
#[derive(Debug, Default)]
pub struct ChangeRequestLedger {
    requests: DashMap<ChangeRequestId, ChangeRequest>,
    pending_by_record: DashMap<RecordId, ChangeRequestId>,
}

impl ChangeRequestLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pending request and indexes it by record.
    pub fn append(&self, request: ChangeRequest) {
        self.pending_by_record
            .insert(request.record_id, request.action_id);
        self.requests.insert(request.action_id, request);
    }

    /// Looks up a request by id.
    #[must_use]
    pub fn get(&self, action_id: ChangeRequestId) -> Option<ChangeRequest> {
        self.requests.get(&action_id).map(|r| r.clone())
    }

    /// Returns the pending request for a record, if any.
    #[must_use]
    pub fn pending_for(&self, record_id: RecordId) -> Option<ChangeRequest> {
        let action_id = *self.pending_by_record.get(&record_id)?;
        self.get(action_id).filter(ChangeRequest::is_pending)
    }

    /// Marks a pending request resolved and populates the checker fields.
    ///
    /// Fails if the request is unknown or was already resolved; the
    /// checker fields are immutable once written.
    pub fn resolve(
        &self,
        action_id: ChangeRequestId,
        decision: Decision,
        checker: UserId,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ChangeRequest, WorkflowError> {
        let mut entry = self
            .requests
            .get_mut(&action_id)
            .ok_or(WorkflowError::RequestNotFound(action_id))?;

        if !entry.is_pending() {
            return Err(WorkflowError::AlreadyResolved(action_id));
        }

        entry.resolution = match decision {
            Decision::Approve => Resolution::Approved,
            Decision::Reject => Resolution::Rejected,
        };
        entry.checker_by = Some(checker);
        entry.checker_at = Some(now);
        entry.checker_comment = comment;

        self.pending_by_record
            .remove_if(&entry.record_id, |_, pending| *pending == action_id);

        Ok(entry.clone())
    }

    /// Full audit lineage for a record, oldest first.
    #[must_use]
    pub fn history(&self, record_id: RecordId) -> Vec<ChangeRequest> {
        let mut history: Vec<ChangeRequest> = self
            .requests
            .iter()
            .filter(|r| r.record_id == record_id)
            .map(|r| r.clone())
            .collect();
        history.sort_by_key(|r| (r.requested_at, r.action_id));
        history
    }
}
