//! Record store with per-record locking.
//!
//! The single authoritative holder of current-state records. Reads are
//! unrestricted; every write goes through the lifecycle service, which
//! serializes the read-check-write sequence per record via the lock
//! handles this store hands out. Logically deleted records stay in the
//! store for audit and are excluded from default listings.

use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tresor_shared::types::{FieldValue, RecordId};

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{ActiveStatus, MasterRecord, ProcessingStatus};

/// As-of-date constraint on a schema date field (`<=` semantics).
#[derive(Debug, Clone)]
pub struct AsOfFilter {
    /// The date attribute to compare.
    pub field: String,
    /// Records whose value is at or before this date match.
    pub date: NaiveDate,
}

/// Listing filter. Empty filter matches every non-deleted record.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Restrict to one entity type.
    pub entity_type: Option<String>,
    /// Case-insensitive substring match across all scalar field
    /// renderings.
    pub search: Option<String>,
    /// Equality filter on processing status.
    pub processing_status: Option<ProcessingStatus>,
    /// Equality filter on the business activity flag.
    pub active_status: Option<ActiveStatus>,
    /// At-or-before constraint on a date field.
    pub as_of: Option<AsOfFilter>,
    /// Include logically deleted records.
    pub include_deleted: bool,
}

impl RecordFilter {
    /// Filter for all live records of one entity type.
    #[must_use]
    pub fn for_entity_type(entity_type: &str) -> Self {
        Self {
            entity_type: Some(entity_type.to_string()),
            ..Self::default()
        }
    }

    fn matches(&self, record: &MasterRecord) -> bool {
        if record.deleted && !self.include_deleted {
            return false;
        }
        if let Some(entity_type) = &self.entity_type
            && record.entity_type != *entity_type
        {
            return false;
        }
        if let Some(status) = self.processing_status
            && record.processing_status != status
        {
            return false;
        }
        if let Some(active) = self.active_status
            && record.active_status != active
        {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let hit = record
                .fields
                .values()
                .any(|v| v.to_string().to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(as_of) = &self.as_of {
            match record.fields.get(&as_of.field) {
                Some(FieldValue::Date(d)) => {
                    if *d > as_of.date {
                        return false;
                    }
                }
                // Records without the date attribute fall outside an
                // as-of view.
                _ => return false,
            }
        }
        true
    }
}

/// In-process authoritative record store.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: DashMap<RecordId, MasterRecord>,
    locks: DashMap<RecordId, Arc<Mutex<()>>>,
}

impl RecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the write lock for one record.
    ///
    /// Callers locking several records must acquire in sorted id order.
    pub async fn lock(&self, record_id: RecordId) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(record_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Inserts a new record.
    pub fn insert(&self, record: MasterRecord) {
        self.records.insert(record.id, record);
    }

    /// Replaces a record with a new snapshot.
    pub fn put(&self, record: MasterRecord) {
        self.records.insert(record.id, record);
    }

    /// Removes a record entirely. Only drafts are ever removed; approved
    /// records are logically deleted instead.
    ///
    /// The lock entry goes with it. A caller currently holding the
    /// guard keeps it through its own `Arc` handle.
    pub fn remove(&self, record_id: RecordId) -> Option<MasterRecord> {
        self.locks.remove(&record_id);
        self.records.remove(&record_id).map(|(_, r)| r)
    }

    /// Fetches a record by id, including logically deleted ones.
    pub fn get(&self, record_id: RecordId) -> Result<MasterRecord, WorkflowError> {
        self.records
            .get(&record_id)
            .map(|r| r.clone())
            .ok_or(WorkflowError::RecordNotFound(record_id))
    }

    /// Lists records matching the filter, ordered by id (stable across
    /// concurrent pagination in the caller's view).
    #[must_use]
    pub fn list(&self, filter: &RecordFilter) -> Vec<MasterRecord> {
        let mut records: Vec<MasterRecord> = self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| r.clone())
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }
}
