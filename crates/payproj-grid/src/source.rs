//! In-memory record service
//!
//! A [`ProjectionSource`] backed by a plain vector. It assigns ids on create
//! and stamps `updated_at` on every write, the way the remote service does.

use std::cell::{Cell, RefCell};

use chrono::Utc;
use payproj_core::{
    NewProjection, ProjectionFilter, ProjectionId, ProjectionPatch, ProjectionRecord,
    ProjectionSource, SourceError,
};

#[derive(Debug)]
pub struct MemorySource {
    records: RefCell<Vec<ProjectionRecord>>,
    next_id: Cell<ProjectionId>,
    offline: Cell<bool>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<ProjectionRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            records: RefCell::new(records),
            next_id: Cell::new(next_id),
            offline: Cell::new(false),
        }
    }

    /// Make every call fail with `SourceError::Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Copy of everything the service holds
    pub fn snapshot(&self) -> Vec<ProjectionRecord> {
        self.records.borrow().clone()
    }

    pub fn into_records(self) -> Vec<ProjectionRecord> {
        self.records.into_inner()
    }

    fn check_online(&self) -> Result<(), SourceError> {
        if self.offline.get() {
            return Err(SourceError::Unavailable("record service offline".into()));
        }
        Ok(())
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectionSource for MemorySource {
    fn fetch(&self, filter: &ProjectionFilter) -> Result<Vec<ProjectionRecord>, SourceError> {
        self.check_online()?;
        Ok(self
            .records
            .borrow()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn create(&self, input: NewProjection) -> Result<ProjectionRecord, SourceError> {
        self.check_online()?;
        input.validate()?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let mut record = input.into_record(id);
        record.updated_at = Some(Utc::now());
        self.records.borrow_mut().push(record.clone());
        Ok(record)
    }

    fn update(
        &self,
        id: ProjectionId,
        patch: ProjectionPatch,
    ) -> Result<ProjectionRecord, SourceError> {
        self.check_online()?;
        let mut records = self.records.borrow_mut();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(SourceError::NotFound(id))?;

        let mut updated = record.clone();
        patch.apply_to(&mut updated);
        updated.validate()?;
        updated.updated_at = Some(Utc::now());
        *record = updated.clone();
        Ok(updated)
    }
}
