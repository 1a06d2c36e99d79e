//! Maker-checker record lifecycle management for Tresor.
//!
//! This module implements the record lifecycle state machine, the
//! diff-based change-request model, and the bulk-operation guard rules
//! for treasury master data.
//!
//! # Modules
//!
//! - `types` - Lifecycle domain types (ProcessingStatus, ChangeRequest, MasterRecord)
//! - `error` - Workflow-specific error types
//! - `diff` - Field-level delta computation
//! - `schema` - Entity-type schema registry and field validation
//! - `machine` - Pure state transition logic
//! - `ledger` - Change request ledger
//! - `store` - Record store with per-record locking
//! - `service` - Lock-owning lifecycle coordinator
//! - `bulk` - Bulk operation coordinator

pub mod bulk;
pub mod diff;
pub mod error;
pub mod ledger;
pub mod machine;
pub mod schema;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod diff_props;
#[cfg(test)]
mod machine_props;

pub use bulk::{BulkItemFailure, BulkOutcome, UpdateRow};
pub use diff::diff;
pub use error::WorkflowError;
pub use ledger::ChangeRequestLedger;
pub use machine::LifecycleMachine;
pub use schema::{EntitySchema, FieldKind, FieldSpec, SchemaRegistry};
pub use service::{LifecycleService, SubmitOutcome};
pub use store::{AsOfFilter, RecordFilter, RecordStore};
pub use types::{
    ActiveStatus, ChangeAction, ChangeRequest, Decision, MasterRecord, ProcessingStatus, Resolution,
};
