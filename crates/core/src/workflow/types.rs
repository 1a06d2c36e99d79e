//! Lifecycle domain types for master-data records.
//!
//! This module defines the core types used for managing record
//! processing-status transitions and change requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tresor_shared::types::{ChangeRequestId, FieldMap, RecordId, UserId};

/// Processing status of a record in the maker-checker workflow.
///
/// Records progress through these states from creation to approval.
/// The valid transitions are:
/// - Draft → PendingApproval (submit create)
/// - PendingApproval → Approved | Rejected (resolve create)
/// - Approved | Rejected → PendingEditApproval (submit update)
/// - PendingEditApproval → Approved | Rejected (resolve update)
/// - Approved | Rejected → PendingDeleteApproval (submit delete)
/// - PendingDeleteApproval → Approved+deleted | Rejected (resolve delete)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Record is being drafted by the maker and has not been submitted.
    Draft,
    /// A CREATE action awaits checker resolution.
    PendingApproval,
    /// An UPDATE action awaits checker resolution.
    PendingEditApproval,
    /// A DELETE action awaits checker resolution.
    PendingDeleteApproval,
    /// The last action on this record was approved.
    Approved,
    /// The last action on this record was rejected.
    Rejected,
}

impl ProcessingStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::PendingEditApproval => "pending_edit_approval",
            Self::PendingDeleteApproval => "pending_delete_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending_approval" => Some(Self::PendingApproval),
            "pending_edit_approval" => Some(Self::PendingEditApproval),
            "pending_delete_approval" => Some(Self::PendingDeleteApproval),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the record has an unresolved change request.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::PendingApproval | Self::PendingEditApproval | Self::PendingDeleteApproval
        )
    }

    /// Returns true if the record has no unresolved change request and
    /// is not a draft.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business activity flag, orthogonal to `ProcessingStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveStatus {
    /// Record is in active business use.
    Active,
    /// Record is retained but not in active use.
    Inactive,
}

impl ActiveStatus {
    /// Returns the string representation of the flag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ActiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of mutation a change request proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// Propose a new record.
    Create,
    /// Propose new values for an existing record.
    Update,
    /// Propose logical deletion of a record.
    Delete,
}

impl ChangeAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Returns the pending status a record enters when this action
    /// is submitted.
    #[must_use]
    pub fn pending_status(&self) -> ProcessingStatus {
        match self {
            Self::Create => ProcessingStatus::PendingApproval,
            Self::Update => ProcessingStatus::PendingEditApproval,
            Self::Delete => ProcessingStatus::PendingDeleteApproval,
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Checker verdict on a pending change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Accept the proposed change.
    Approve,
    /// Refuse the proposed change.
    Reject,
}

/// Resolution state of a change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Awaiting a checker.
    Pending,
    /// Approved by a checker.
    Approved,
    /// Rejected by a checker.
    Rejected,
}

/// A pending-or-resolved record of a proposed CREATE/UPDATE/DELETE action.
///
/// Checker fields are populated exactly once, on resolution, and are
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Unique identifier for this action.
    pub action_id: ChangeRequestId,
    /// The record this action targets.
    pub record_id: RecordId,
    /// Domain slug of the record (bank, currency, ...).
    pub entity_type: String,
    /// The kind of mutation proposed.
    pub action: ChangeAction,
    /// Proposed attribute values. For UPDATE this carries only the
    /// changed keys, never the full edited copy.
    pub proposed_fields: FieldMap,
    /// Free-text justification. Required for DELETE.
    pub reason: Option<String>,
    /// The maker who proposed the change.
    pub requested_by: UserId,
    /// When the change was proposed.
    pub requested_at: DateTime<Utc>,
    /// Resolution state.
    pub resolution: Resolution,
    /// The checker who resolved the request.
    pub checker_by: Option<UserId>,
    /// When the request was resolved.
    pub checker_at: Option<DateTime<Utc>>,
    /// Optional comment from the checker.
    pub checker_comment: Option<String>,
}

impl ChangeRequest {
    /// Creates a new pending change request.
    #[must_use]
    pub fn new(
        record_id: RecordId,
        entity_type: String,
        action: ChangeAction,
        proposed_fields: FieldMap,
        reason: Option<String>,
        requested_by: UserId,
    ) -> Self {
        Self {
            action_id: ChangeRequestId::new(),
            record_id,
            entity_type,
            action,
            proposed_fields,
            reason,
            requested_by,
            requested_at: Utc::now(),
            resolution: Resolution::Pending,
            checker_by: None,
            checker_at: None,
            checker_comment: None,
        }
    }

    /// Returns true if the request has not yet been resolved.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.resolution == Resolution::Pending
    }
}

/// A master-data record with its audit shadow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterRecord {
    /// Stable identifier, unique within the entity type.
    pub id: RecordId,
    /// Domain slug (bank, currency, gl-account, ...).
    pub entity_type: String,
    /// Current attribute values.
    pub fields: FieldMap,
    /// Value-before-last-approved-edit per attribute, used for audit
    /// display. Touched only when an UPDATE is approved, and only for
    /// the keys that changed.
    pub shadow_fields: FieldMap,
    /// Workflow state.
    pub processing_status: ProcessingStatus,
    /// Business activity flag, independent of workflow state.
    pub active_status: ActiveStatus,
    /// The maker who created the record.
    pub created_by: UserId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
    /// Logical deletion flag. Deleted records are excluded from default
    /// listings but retained for audit.
    pub deleted: bool,
    /// The checker who approved the deletion.
    pub deleted_by: Option<UserId>,
    /// When the deletion was approved.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MasterRecord {
    /// Creates a new record owned by `created_by`.
    #[must_use]
    pub fn new(
        entity_type: String,
        fields: FieldMap,
        created_by: UserId,
        processing_status: ProcessingStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            entity_type,
            fields,
            shadow_fields: FieldMap::new(),
            processing_status,
            active_status: ActiveStatus::Active,
            created_by,
            created_at: now,
            updated_at: now,
            deleted: false,
            deleted_by: None,
            deleted_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str_roundtrip() {
        for status in [
            ProcessingStatus::Draft,
            ProcessingStatus::PendingApproval,
            ProcessingStatus::PendingEditApproval,
            ProcessingStatus::PendingDeleteApproval,
            ProcessingStatus::Approved,
            ProcessingStatus::Rejected,
        ] {
            assert_eq!(ProcessingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProcessingStatus::parse("invalid"), None);
    }

    #[test]
    fn test_status_is_pending() {
        assert!(ProcessingStatus::PendingApproval.is_pending());
        assert!(ProcessingStatus::PendingEditApproval.is_pending());
        assert!(ProcessingStatus::PendingDeleteApproval.is_pending());
        assert!(!ProcessingStatus::Draft.is_pending());
        assert!(!ProcessingStatus::Approved.is_pending());
        assert!(!ProcessingStatus::Rejected.is_pending());
    }

    #[test]
    fn test_action_pending_status() {
        assert_eq!(
            ChangeAction::Create.pending_status(),
            ProcessingStatus::PendingApproval
        );
        assert_eq!(
            ChangeAction::Update.pending_status(),
            ProcessingStatus::PendingEditApproval
        );
        assert_eq!(
            ChangeAction::Delete.pending_status(),
            ProcessingStatus::PendingDeleteApproval
        );
    }

    #[test]
    fn test_new_change_request_is_pending() {
        let request = ChangeRequest::new(
            RecordId::new(),
            "bank".to_string(),
            ChangeAction::Update,
            FieldMap::new(),
            None,
            UserId::new(),
        );
        assert!(request.is_pending());
        assert!(request.checker_by.is_none());
        assert!(request.checker_at.is_none());
        assert!(request.checker_comment.is_none());
    }

    #[test]
    fn test_new_record_defaults() {
        let record = MasterRecord::new(
            "currency".to_string(),
            FieldMap::new(),
            UserId::new(),
            ProcessingStatus::Draft,
        );
        assert_eq!(record.processing_status, ProcessingStatus::Draft);
        assert_eq!(record.active_status, ActiveStatus::Active);
        assert!(record.shadow_fields.is_empty());
        assert!(!record.deleted);
    }
}
