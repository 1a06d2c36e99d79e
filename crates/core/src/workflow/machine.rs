//! Pure state transition logic for the maker-checker lifecycle.
//!
//! All functions here are side-effect free: they validate a transition
//! against a record's current processing status and return either the
//! new status or a new record snapshot. The service layer owns the
//! locks and applies the snapshots; nothing else mutates records.

use chrono::{DateTime, Utc};
use tresor_shared::types::{RecordId, UserId};

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{ChangeAction, ChangeRequest, MasterRecord, ProcessingStatus};

/// Stateless state machine for lifecycle transitions.
pub struct LifecycleMachine;

impl LifecycleMachine {
    /// Validates a submission and returns the pending status the record
    /// enters.
    ///
    /// # Returns
    /// * `Ok(pending_status)` if the transition is valid
    /// * `Err(WorkflowError::PendingChangeExists)` if the record already
    ///   has an unresolved change request
    /// * `Err(WorkflowError::InvalidTransition)` otherwise
    pub fn submit_status(
        record_id: RecordId,
        current: ProcessingStatus,
        action: ChangeAction,
    ) -> Result<ProcessingStatus, WorkflowError> {
        if current.is_pending() {
            // Conflict guard runs first: a pending record refuses any
            // new request regardless of action.
            return Err(WorkflowError::PendingChangeExists {
                record_id,
                status: current,
            });
        }

        let valid = match action {
            ChangeAction::Create => current == ProcessingStatus::Draft,
            ChangeAction::Update | ChangeAction::Delete => current.is_resolved(),
        };

        if valid {
            Ok(action.pending_status())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: current,
                action,
            })
        }
    }

    /// Returns true if submitting `action` from `current` is allowed.
    #[must_use]
    pub fn can_submit(current: ProcessingStatus, action: ChangeAction) -> bool {
        Self::submit_status(RecordId::new(), current, action).is_ok()
    }

    /// Builds the approved snapshot of a record for a resolved request.
    ///
    /// - CREATE: record becomes `Approved`.
    /// - UPDATE: current values of the changed keys are copied into
    ///   `shadow_fields`, then the proposed values are applied; record
    ///   becomes `Approved`.
    /// - DELETE: record is logically deleted (`deleted`, `deleted_by`,
    ///   `deleted_at`) and leaves the active set.
    ///
    /// A non-delete request can never overwrite a record that is
    /// pending delete approval: delete intent takes precedence.
    pub fn approve(
        record: &MasterRecord,
        request: &ChangeRequest,
        checker: UserId,
        now: DateTime<Utc>,
    ) -> Result<MasterRecord, WorkflowError> {
        let expected = request.action.pending_status();

        if record.processing_status == ProcessingStatus::PendingDeleteApproval
            && request.action != ChangeAction::Delete
        {
            return Err(WorkflowError::DeletePrecedence(record.id));
        }
        if record.processing_status != expected {
            return Err(WorkflowError::InvalidTransition {
                from: record.processing_status,
                action: request.action,
            });
        }

        let mut next = record.clone();
        next.updated_at = now;

        match request.action {
            ChangeAction::Create => {
                next.processing_status = ProcessingStatus::Approved;
            }
            ChangeAction::Update => {
                for (key, value) in &request.proposed_fields {
                    if let Some(previous) = record.fields.get(key) {
                        next.shadow_fields.insert(key.clone(), previous.clone());
                    }
                    next.fields.insert(key.clone(), value.clone());
                }
                next.processing_status = ProcessingStatus::Approved;
            }
            ChangeAction::Delete => {
                next.processing_status = ProcessingStatus::Approved;
                next.deleted = true;
                next.deleted_by = Some(checker);
                next.deleted_at = Some(now);
            }
        }

        Ok(next)
    }

    /// Builds the rejected snapshot of a record.
    ///
    /// Rejection never mutates `fields`: rejected edits and deletes
    /// leave the record's values exactly as they were before submission.
    pub fn reject(
        record: &MasterRecord,
        request: &ChangeRequest,
        now: DateTime<Utc>,
    ) -> Result<MasterRecord, WorkflowError> {
        let expected = request.action.pending_status();
        if record.processing_status != expected {
            return Err(WorkflowError::InvalidTransition {
                from: record.processing_status,
                action: request.action,
            });
        }

        let mut next = record.clone();
        next.processing_status = ProcessingStatus::Rejected;
        next.updated_at = now;
        Ok(next)
    }
}
