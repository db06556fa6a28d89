//! Local reconciliation store
//!
//! Holds the working copy of the projection list for one calendar view.
//! Create and update results from the record service are folded in one
//! record at a time; every other record keeps its `Arc` identity and its
//! position, so derived state for unrelated rows can be reused.
//!
//! Fetches are ticketed: each request takes a monotonically increasing
//! [`FetchTicket`] and a response is only applied when its ticket is the
//! latest one issued. A slow response for an old filter can therefore never
//! overwrite fresher data.

use std::sync::Arc;

use payproj_core::{BusinessDay, ProjectionGrid, ProjectionId, ProjectionRecord};
use tracing::{debug, warn};

use crate::builder::build_grid;

/// Identifies one fetch request; later requests compare greater
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FetchTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a single-record reconciliation did to the working set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// Record appended
    Created(ProjectionId),
    /// Record with this id replaced in place
    Updated(ProjectionId),
    /// No record with this id; the working set is unchanged
    Unmatched(ProjectionId),
}

impl Reconciliation {
    pub fn id(&self) -> ProjectionId {
        match *self {
            Reconciliation::Created(id)
            | Reconciliation::Updated(id)
            | Reconciliation::Unmatched(id) => id,
        }
    }

    /// Whether the working set changed
    pub fn is_applied(&self) -> bool {
        !matches!(self, Reconciliation::Unmatched(_))
    }
}

/// Result of completing a fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The working set was replaced
    Applied { count: usize },
    /// A newer fetch was issued after this one; response discarded
    Stale {
        ticket: FetchTicket,
        latest: FetchTicket,
    },
}

/// Authoritative in-memory record list for one view
#[derive(Clone, Debug, Default)]
pub struct ProjectionStore {
    records: Vec<Arc<ProjectionRecord>>,
    issued: u64,
    revision: u64,
}

impl ProjectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from an already fetched record list
    pub fn from_records(records: impl IntoIterator<Item = ProjectionRecord>) -> Self {
        let mut store = Self::new();
        store.replace(records);
        store
    }

    /// Read access to the working set, in order
    pub fn records(&self) -> &[Arc<ProjectionRecord>] {
        &self.records
    }

    pub fn get(&self, id: ProjectionId) -> Option<&Arc<ProjectionRecord>> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Bumped by every change to the working set
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Swap the working set wholesale
    pub fn replace(&mut self, records: impl IntoIterator<Item = ProjectionRecord>) {
        self.records = records.into_iter().map(Arc::new).collect();
        self.revision += 1;
    }

    /// Fold a freshly created record into the working set.
    ///
    /// The record is appended. If the id is already present (the record
    /// arrived through a concurrent fetch) its slot is replaced instead so
    /// ids stay unique.
    pub fn apply_create(&mut self, record: ProjectionRecord) -> Reconciliation {
        let id = record.id;
        if let Some(slot) = self.position(id) {
            debug!(id, "created projection already present, replacing");
            self.records[slot] = Arc::new(record);
            self.revision += 1;
            return Reconciliation::Updated(id);
        }
        self.records.push(Arc::new(record));
        self.revision += 1;
        Reconciliation::Created(id)
    }

    /// Replace the record with the same id; unknown ids are a no-op
    pub fn apply_update(&mut self, record: ProjectionRecord) -> Reconciliation {
        let id = record.id;
        match self.position(id) {
            Some(slot) => {
                self.records[slot] = Arc::new(record);
                self.revision += 1;
                Reconciliation::Updated(id)
            }
            None => {
                warn!(id, "update for projection not in working set ignored");
                Reconciliation::Unmatched(id)
            }
        }
    }

    /// Issue the ticket for a new fetch request
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Most recently issued ticket
    pub fn latest_ticket(&self) -> Option<FetchTicket> {
        (self.issued > 0).then_some(FetchTicket(self.issued))
    }

    /// Apply a fetch response if no newer fetch has been issued since
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        records: Vec<ProjectionRecord>,
    ) -> FetchOutcome {
        let latest = FetchTicket(self.issued);
        if ticket != latest {
            warn!(%ticket, %latest, "discarding stale fetch response");
            return FetchOutcome::Stale { ticket, latest };
        }
        let count = records.len();
        self.replace(records);
        debug!(%ticket, count, "applied fetch response");
        FetchOutcome::Applied { count }
    }

    /// Build the grid for `days` from the current working set
    pub fn grid(&self, days: &[BusinessDay]) -> ProjectionGrid {
        build_grid(&self.records, days)
    }

    fn position(&self, id: ProjectionId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use payproj_core::ProjectionStatus;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn seeded() -> ProjectionStore {
        ProjectionStore::from_records(vec![
            ProjectionRecord::new(1, 1, date(2024, 6, 3), dec!(100)),
            ProjectionRecord::new(2, 2, date(2024, 6, 4), dec!(200)),
            ProjectionRecord::new(3, 1, date(2024, 6, 5), dec!(300)),
        ])
    }

    fn ids(store: &ProjectionStore) -> Vec<ProjectionId> {
        store.records().iter().map(|r| r.id).collect()
    }

    #[test]
    fn create_appends() {
        let mut store = seeded();
        let outcome = store.apply_create(ProjectionRecord::new(4, 3, date(2024, 6, 6), dec!(5)));

        assert_eq!(outcome, Reconciliation::Created(4));
        assert_eq!(ids(&store), vec![1, 2, 3, 4]);
    }

    #[test]
    fn create_with_existing_id_replaces() {
        let mut store = seeded();
        let outcome = store.apply_create(ProjectionRecord::new(2, 2, date(2024, 6, 4), dec!(250)));

        assert_eq!(outcome, Reconciliation::Updated(2));
        assert_eq!(ids(&store), vec![1, 2, 3]);
        assert_eq!(store.get(2).unwrap().amount, dec!(250));
    }

    #[test]
    fn update_replaces_in_place() {
        let mut store = seeded();
        let updated = ProjectionRecord::new(2, 2, date(2024, 6, 4), dec!(999))
            .status(ProjectionStatus::Fulfilled);

        let outcome = store.apply_update(updated.clone());

        assert_eq!(outcome, Reconciliation::Updated(2));
        assert_eq!(ids(&store), vec![1, 2, 3]);
        assert_eq!(**store.get(2).unwrap(), updated);
    }

    #[test]
    fn update_keeps_other_records_identical() {
        let mut store = seeded();
        let before: Vec<Arc<ProjectionRecord>> = store.records().to_vec();

        store.apply_update(ProjectionRecord::new(2, 2, date(2024, 6, 4), dec!(1)));

        let after = store.records();
        assert!(Arc::ptr_eq(&before[0], &after[0]));
        assert!(!Arc::ptr_eq(&before[1], &after[1]));
        assert!(Arc::ptr_eq(&before[2], &after[2]));
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let mut store = seeded();
        let before: Vec<Arc<ProjectionRecord>> = store.records().to_vec();
        let revision = store.revision();

        let outcome = store.apply_update(ProjectionRecord::new(7, 1, date(2024, 6, 3), dec!(200)));

        assert_eq!(outcome, Reconciliation::Unmatched(7));
        assert!(!outcome.is_applied());
        assert_eq!(store.revision(), revision);
        assert_eq!(store.len(), before.len());
        for (old, new) in before.iter().zip(store.records()) {
            assert!(Arc::ptr_eq(old, new));
        }
    }

    #[test]
    fn revision_tracks_mutations() {
        let mut store = ProjectionStore::new();
        assert_eq!(store.revision(), 0);
        store.apply_create(ProjectionRecord::new(1, 1, date(2024, 6, 3), dec!(1)));
        store.apply_update(ProjectionRecord::new(1, 1, date(2024, 6, 3), dec!(2)));
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn latest_fetch_applies() {
        let mut store = seeded();
        let ticket = store.begin_fetch();

        let outcome = store.complete_fetch(
            ticket,
            vec![ProjectionRecord::new(9, 1, date(2024, 6, 3), dec!(1))],
        );

        assert_eq!(outcome, FetchOutcome::Applied { count: 1 });
        assert_eq!(ids(&store), vec![9]);
    }

    #[test]
    fn stale_fetch_is_discarded() {
        let mut store = seeded();
        let slow = store.begin_fetch();
        let fast = store.begin_fetch();

        let applied = store.complete_fetch(
            fast,
            vec![ProjectionRecord::new(20, 1, date(2024, 6, 3), dec!(1))],
        );
        let stale = store.complete_fetch(
            slow,
            vec![ProjectionRecord::new(10, 1, date(2024, 6, 3), dec!(1))],
        );

        assert_eq!(applied, FetchOutcome::Applied { count: 1 });
        assert_eq!(stale, FetchOutcome::Stale { ticket: slow, latest: fast });
        assert_eq!(ids(&store), vec![20]);
        assert!(slow < fast);
        assert_eq!(store.latest_ticket(), Some(fast));
    }

    #[test]
    fn no_ticket_before_first_fetch() {
        assert_eq!(ProjectionStore::new().latest_ticket(), None);
    }

    #[test]
    fn grid_reflects_reconciled_record() {
        let mut store = seeded();
        let days = payproj_core::generate_business_days(date(2024, 6, 3), date(2024, 6, 7), 5);
        assert_eq!(store.grid(&days).totals.grand, dec!(600));

        store.apply_update(ProjectionRecord::new(3, 1, date(2024, 6, 5), dec!(50)));

        let grid = store.grid(&days);
        assert_eq!(grid.totals.grand, dec!(350));
        assert_eq!(grid.totals.for_client(1), dec!(150));
    }
}
