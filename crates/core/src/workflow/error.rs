//! Workflow error types for the record lifecycle.
//!
//! This module defines all error types that can occur during lifecycle
//! operations: submissions, resolutions, and bulk prechecks.

use thiserror::Error;
use tresor_shared::AppError;
use tresor_shared::types::{ChangeRequestId, RecordId};

use crate::workflow::schema::FieldKind;
use crate::workflow::types::{ChangeAction, ProcessingStatus};

/// Errors that can occur during lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// DELETE submitted without a justification.
    #[error("Delete reason is required")]
    DeleteReasonRequired,

    /// Proposed field is not part of the entity schema.
    #[error("Unknown field {field} for entity type {entity_type}")]
    UnknownField {
        /// The entity type being validated.
        entity_type: String,
        /// The offending field name.
        field: String,
    },

    /// Proposed value does not match the schema field kind.
    #[error("Field {field} expects a {expected} value")]
    FieldKindMismatch {
        /// The offending field name.
        field: String,
        /// The kind the schema requires.
        expected: FieldKind,
    },

    /// Required field missing on submission for approval.
    #[error("Required field {field} is missing")]
    MissingRequiredField {
        /// The missing field name.
        field: String,
    },

    /// No schema registered for the entity type.
    #[error("Unknown entity type {0}")]
    UnknownEntityType(String),

    /// The record already has an unresolved change request.
    #[error("Record {record_id} already has a pending change ({status})")]
    PendingChangeExists {
        /// The record with the pending change.
        record_id: RecordId,
        /// Its current pending status.
        status: ProcessingStatus,
    },

    /// Attempted a transition the state machine does not allow.
    #[error("Cannot {action} a record in status {from}")]
    InvalidTransition {
        /// The current status.
        from: ProcessingStatus,
        /// The attempted action.
        action: ChangeAction,
    },

    /// A bulk precheck found a member whose status violates the
    /// requested operation. The whole batch is rejected.
    #[error("You cannot {operation} record {record_id} already in status {status}")]
    InvalidBulkTarget {
        /// The offending batch member.
        record_id: RecordId,
        /// Its current status.
        status: ProcessingStatus,
        /// The requested bulk operation.
        operation: &'static str,
    },

    /// An approve resolution targeted a record whose delete intent
    /// takes precedence.
    #[error("Record {0} is pending delete approval and cannot be approved for another action")]
    DeletePrecedence(RecordId),

    /// The record is logically deleted. Deletion is terminal; a
    /// tombstone never re-enters the workflow.
    #[error("Record {0} is deleted and cannot be modified")]
    RecordDeleted(RecordId),

    /// Record not found.
    #[error("Record {0} not found")]
    RecordNotFound(RecordId),

    /// Change request not found.
    #[error("Change request {0} not found")]
    RequestNotFound(ChangeRequestId),

    /// Change request was already resolved by another checker.
    #[error("Change request {0} is already resolved")]
    AlreadyResolved(ChangeRequestId),

    /// Storage or transport failure. Never retried automatically.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::DeleteReasonRequired
            | Self::UnknownField { .. }
            | Self::FieldKindMismatch { .. }
            | Self::MissingRequiredField { .. }
            | Self::InvalidTransition { .. } => 400,

            Self::PendingChangeExists { .. }
            | Self::InvalidBulkTarget { .. }
            | Self::DeletePrecedence(_)
            | Self::RecordDeleted(_)
            | Self::AlreadyResolved(_) => 409,

            Self::UnknownEntityType(_) | Self::RecordNotFound(_) | Self::RequestNotFound(_) => 404,

            Self::Storage(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DeleteReasonRequired => "DELETE_REASON_REQUIRED",
            Self::UnknownField { .. } => "UNKNOWN_FIELD",
            Self::FieldKindMismatch { .. } => "FIELD_KIND_MISMATCH",
            Self::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            Self::UnknownEntityType(_) => "UNKNOWN_ENTITY_TYPE",
            Self::PendingChangeExists { .. } => "PENDING_CHANGE_EXISTS",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InvalidBulkTarget { .. } => "INVALID_BULK_TARGET",
            Self::DeletePrecedence(_) => "DELETE_PRECEDENCE",
            Self::RecordDeleted(_) => "RECORD_DELETED",
            Self::RecordNotFound(_) => "RECORD_NOT_FOUND",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::AlreadyResolved(_) => "ALREADY_RESOLVED",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err.status_code() {
            400 => Self::Validation(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::Transport(message),
        }
    }
}
