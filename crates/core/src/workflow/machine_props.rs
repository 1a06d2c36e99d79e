//! Property-based tests for the lifecycle state machine.

use chrono::Utc;
use proptest::prelude::*;
use tresor_shared::types::{FieldMap, FieldValue, RecordId, UserId};

use crate::workflow::error::WorkflowError;
use crate::workflow::machine::LifecycleMachine;
use crate::workflow::types::{ChangeAction, ChangeRequest, MasterRecord, ProcessingStatus};

fn arb_status() -> impl Strategy<Value = ProcessingStatus> {
    prop_oneof![
        Just(ProcessingStatus::Draft),
        Just(ProcessingStatus::PendingApproval),
        Just(ProcessingStatus::PendingEditApproval),
        Just(ProcessingStatus::PendingDeleteApproval),
        Just(ProcessingStatus::Approved),
        Just(ProcessingStatus::Rejected),
    ]
}

fn arb_action() -> impl Strategy<Value = ChangeAction> {
    prop_oneof![
        Just(ChangeAction::Create),
        Just(ChangeAction::Update),
        Just(ChangeAction::Delete),
    ]
}

fn arb_fields() -> impl Strategy<Value = FieldMap> {
    proptest::collection::btree_map(
        "[a-z_]{1,10}",
        "[a-zA-Z0-9 ]{0,16}".prop_map(FieldValue::Text),
        1..6,
    )
}

fn record_with(status: ProcessingStatus, fields: FieldMap) -> MasterRecord {
    MasterRecord::new("bank".into(), fields, UserId::new(), status)
}

fn request_with(record: &MasterRecord, action: ChangeAction, proposed: FieldMap) -> ChangeRequest {
    ChangeRequest::new(
        record.id,
        record.entity_type.clone(),
        action,
        proposed,
        Some("justification".into()),
        UserId::new(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Submitting anything against a pending record is a conflict,
    /// never a transition.
    #[test]
    fn prop_pending_record_refuses_submissions(
        status in arb_status(),
        action in arb_action(),
    ) {
        prop_assume!(status.is_pending());
        let result = LifecycleMachine::submit_status(RecordId::new(), status, action);
        prop_assert!(
            matches!(result, Err(WorkflowError::PendingChangeExists { .. })),
            "pending status must refuse new submissions, got {result:?}"
        );
    }

    /// A valid submission always lands in the action's pending status.
    #[test]
    fn prop_valid_submission_enters_pending(
        status in arb_status(),
        action in arb_action(),
    ) {
        if let Ok(next) = LifecycleMachine::submit_status(RecordId::new(), status, action) {
            prop_assert_eq!(next, action.pending_status());
            prop_assert!(next.is_pending());
        }
    }

    /// Rejection never mutates fields, shadow fields, or the deletion
    /// flag, regardless of action type.
    #[test]
    fn prop_reject_preserves_fields(
        fields in arb_fields(),
        action in arb_action(),
    ) {
        let record = record_with(action.pending_status(), fields);
        let request = request_with(&record, action, FieldMap::new());

        let next = LifecycleMachine::reject(&record, &request, Utc::now()).unwrap();
        prop_assert_eq!(next.processing_status, ProcessingStatus::Rejected);
        prop_assert_eq!(&next.fields, &record.fields);
        prop_assert_eq!(&next.shadow_fields, &record.shadow_fields);
        prop_assert_eq!(next.deleted, record.deleted);
    }

    /// After an approved update, every changed key's shadow holds the
    /// value before this approval; untouched keys have no shadow.
    #[test]
    fn prop_approved_update_shadow_roundtrip(
        fields in arb_fields(),
        proposed in arb_fields(),
    ) {
        let record = record_with(ProcessingStatus::PendingEditApproval, fields.clone());
        let request = request_with(&record, ChangeAction::Update, proposed.clone());

        let next = LifecycleMachine::approve(&record, &request, UserId::new(), Utc::now()).unwrap();

        for (key, value) in &proposed {
            prop_assert_eq!(next.fields.get(key), Some(value));
            match fields.get(key) {
                Some(previous) => prop_assert_eq!(next.shadow_fields.get(key), Some(previous)),
                None => prop_assert!(next.shadow_fields.get(key).is_none()),
            }
        }
        for key in fields.keys().filter(|k| !proposed.contains_key(*k)) {
            prop_assert_eq!(next.fields.get(key), fields.get(key));
            prop_assert!(!next.shadow_fields.contains_key(key));
        }
    }

    /// An approve resolution never overwrites a record pending delete
    /// approval with a non-delete action.
    #[test]
    fn prop_delete_intent_wins(fields in arb_fields()) {
        let record = record_with(ProcessingStatus::PendingDeleteApproval, fields);
        for action in [ChangeAction::Create, ChangeAction::Update] {
            let request = request_with(&record, action, FieldMap::new());
            let result = LifecycleMachine::approve(&record, &request, UserId::new(), Utc::now());
            prop_assert!(
                matches!(result, Err(WorkflowError::DeletePrecedence(_))),
                "delete intent must win over {action:?}"
            );
        }
    }

    /// Approving a delete retains the record contents for audit.
    #[test]
    fn prop_approved_delete_is_logical(fields in arb_fields()) {
        let record = record_with(ProcessingStatus::PendingDeleteApproval, fields);
        let request = request_with(&record, ChangeAction::Delete, FieldMap::new());
        let checker = UserId::new();

        let next = LifecycleMachine::approve(&record, &request, checker, Utc::now()).unwrap();
        prop_assert!(next.deleted);
        prop_assert_eq!(next.deleted_by, Some(checker));
        prop_assert!(next.deleted_at.is_some());
        prop_assert_eq!(&next.fields, &record.fields);
    }
}
