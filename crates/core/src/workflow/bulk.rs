//! Bulk operation coordinator.
//!
//! Applies a single lifecycle operation to a selected set of records.
//! The precheck is all-or-nothing: if any member's current status
//! violates the requested transition, the whole batch is rejected and
//! nothing mutates. After a passing precheck each member is applied
//! independently; one failure does not roll back siblings.
//!
//! Per-record locks are acquired in sorted id order, so two overlapping
//! batches cannot deadlock.

use serde::Serialize;
use tokio::sync::OwnedMutexGuard;
use tracing::info;
use tresor_shared::types::{FieldMap, RecordId, UserId};

use crate::workflow::error::WorkflowError;
use crate::workflow::service::{LifecycleService, SubmitOutcome};
use crate::workflow::types::{Decision, ProcessingStatus};

/// Per-item failure inside a bulk outcome.
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemFailure {
    /// The record that failed.
    pub record_id: RecordId,
    /// Why it failed.
    pub error: String,
}

/// Aggregated result of a bulk operation, always reported per item so
/// the caller can distinguish "this item changed" from "a sibling
/// failed".
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkOutcome {
    /// Records whose transition applied.
    pub succeeded: Vec<RecordId>,
    /// Records whose transition failed after the precheck passed.
    pub failed: Vec<BulkItemFailure>,
}

impl BulkOutcome {
    /// True if every member succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One row of a bulk edit submission.
#[derive(Debug, Clone)]
pub struct UpdateRow {
    /// The record to edit.
    pub record_id: RecordId,
    /// Candidate field values (possibly a full edited copy; the diff
    /// engine extracts the delta).
    pub fields: FieldMap,
    /// Optional justification.
    pub reason: Option<String>,
}

fn unique_sorted(ids: &[RecordId]) -> Vec<RecordId> {
    let mut sorted = ids.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted
}

/// Selection order with duplicates removed, preserving first occurrence.
fn unique_in_order(ids: &[RecordId]) -> Vec<RecordId> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

impl LifecycleService {
    /// Acquires locks for all targets in sorted id order.
    async fn lock_batch(&self, ids: &[RecordId]) -> Vec<OwnedMutexGuard<()>> {
        let mut guards = Vec::with_capacity(ids.len());
        for id in unique_sorted(ids) {
            guards.push(self.store().lock(id).await);
        }
        guards
    }

    /// Approves or rejects the pending requests of the selected records.
    ///
    /// Precheck (atomic, before any mutation): every id must exist and
    /// carry a pending request in a status the decision may act on.
    /// Bulk approval never covers records pending delete approval;
    /// delete intent is resolved individually and takes precedence over
    /// batch approval.
    pub async fn bulk_resolve(
        &self,
        ids: &[RecordId],
        decision: Decision,
        checker: UserId,
        comment: Option<String>,
    ) -> Result<BulkOutcome, WorkflowError> {
        let operation = match decision {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        };
        let _guards = self.lock_batch(ids).await;
        let targets = unique_in_order(ids);

        for id in &targets {
            let record = self.store().get(*id)?;
            let status = record.processing_status;
            let allowed = match decision {
                Decision::Approve => matches!(
                    status,
                    ProcessingStatus::PendingApproval | ProcessingStatus::PendingEditApproval
                ),
                Decision::Reject => status.is_pending(),
            };
            if !allowed || self.ledger().pending_for(*id).is_none() {
                return Err(WorkflowError::InvalidBulkTarget {
                    record_id: *id,
                    status,
                    operation,
                });
            }
        }

        let mut outcome = BulkOutcome::default();
        for id in targets {
            let result = self
                .ledger()
                .pending_for(id)
                .ok_or(WorkflowError::RecordNotFound(id))
                .and_then(|request| {
                    self.resolve_locked(request.action_id, decision, checker, comment.clone())
                });
            match result {
                Ok(_) => outcome.succeeded.push(id),
                Err(e) => outcome.failed.push(BulkItemFailure {
                    record_id: id,
                    error: e.to_string(),
                }),
            }
        }

        info!(
            operation,
            total = ids.len(),
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk resolution applied"
        );
        Ok(outcome)
    }

    /// Submits deletion for the selected records.
    ///
    /// Precheck: a shared non-empty reason, and every target resolved
    /// (neither a draft nor already pending anything, including a
    /// pending delete).
    pub async fn bulk_delete(
        &self,
        ids: &[RecordId],
        reason: Option<String>,
        requested_by: UserId,
    ) -> Result<BulkOutcome, WorkflowError> {
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .ok_or(WorkflowError::DeleteReasonRequired)?;

        let _guards = self.lock_batch(ids).await;
        let targets = unique_in_order(ids);

        for id in &targets {
            let record = self.store().get(*id)?;
            if record.deleted {
                return Err(WorkflowError::RecordDeleted(*id));
            }
            if !record.processing_status.is_resolved() {
                return Err(WorkflowError::InvalidBulkTarget {
                    record_id: *id,
                    status: record.processing_status,
                    operation: "delete",
                });
            }
        }

        let mut outcome = BulkOutcome::default();
        for id in targets {
            match self.submit_delete_locked(id, Some(reason.clone()), requested_by) {
                Ok(_) => outcome.succeeded.push(id),
                Err(e) => outcome.failed.push(BulkItemFailure {
                    record_id: id,
                    error: e.to_string(),
                }),
            }
        }

        info!(
            total = ids.len(),
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk delete submitted"
        );
        Ok(outcome)
    }

    /// Submits edits for a set of rows.
    ///
    /// Precheck: every row targets an existing, resolved record and
    /// passes schema validation. Rows whose diff is empty count as
    /// no-op successes.
    pub async fn bulk_update(
        &self,
        rows: &[UpdateRow],
        requested_by: UserId,
    ) -> Result<BulkOutcome, WorkflowError> {
        let ids: Vec<RecordId> = rows.iter().map(|r| r.record_id).collect();
        let _guards = self.lock_batch(&ids).await;

        for row in rows {
            let record = self.store().get(row.record_id)?;
            if record.deleted {
                return Err(WorkflowError::RecordDeleted(row.record_id));
            }
            self.schemas()
                .get(&record.entity_type)?
                .validate_fields(&row.fields)?;
            if !record.processing_status.is_resolved() {
                return Err(WorkflowError::InvalidBulkTarget {
                    record_id: row.record_id,
                    status: record.processing_status,
                    operation: "edit",
                });
            }
        }

        let mut outcome = BulkOutcome::default();
        for row in rows {
            let result = self.submit_update_locked(
                row.record_id,
                row.fields.clone(),
                row.reason.clone(),
                requested_by,
            );
            match result {
                Ok(SubmitOutcome::Submitted(_) | SubmitOutcome::NoOp(_)) => {
                    outcome.succeeded.push(row.record_id);
                }
                Ok(SubmitOutcome::Discarded(_)) => {
                    // Update submissions never discard.
                    outcome.succeeded.push(row.record_id);
                }
                Err(e) => outcome.failed.push(BulkItemFailure {
                    record_id: row.record_id,
                    error: e.to_string(),
                }),
            }
        }

        info!(
            total = rows.len(),
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk edit submitted"
        );
        Ok(outcome)
    }
}
