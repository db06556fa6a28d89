//! Calendar view
//!
//! Wires the pieces of one projection calendar screen together: the filter
//! drives both the business-day sequence and the fetch, the store holds the
//! working set, and the grid is rebuilt from both on demand. Remote calls go
//! through a [`ProjectionSource`]; their failures are caught here and turned
//! into [`Notice`]s, so nothing the record service does can fail the caller.

use chrono::NaiveDate;
use payproj_core::{
    BusinessDay, BusinessDaySequencer, NewProjection, ProjectionFilter, ProjectionGrid,
    ProjectionId, ProjectionPatch, ProjectionRecord, ProjectionSource, ProjectionStatus,
    SourceError,
};
use tracing::{debug, info, warn};

use crate::notice::Notice;
use crate::store::{FetchOutcome, FetchTicket, ProjectionStore, Reconciliation};

/// Filter state of a calendar view
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarFilter {
    /// First date of the requested range
    pub start: NaiveDate,
    /// Last date of the requested range (the grid may extend past it)
    pub end: NaiveDate,
    /// Only show projections with this status
    pub status: Option<ProjectionStatus>,
    /// Number of business-day columns
    pub max_days: usize,
}

impl CalendarFilter {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            status: None,
            max_days: 10,
        }
    }

    pub fn status(mut self, status: ProjectionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn max_days(mut self, days: usize) -> Self {
        self.max_days = days;
        self
    }
}

/// One projection calendar: filter, working set and derived grid
#[derive(Clone, Debug)]
pub struct CalendarView {
    filter: CalendarFilter,
    sequencer: BusinessDaySequencer,
    store: ProjectionStore,
}

impl CalendarView {
    pub fn new(filter: CalendarFilter) -> Self {
        Self {
            filter,
            sequencer: BusinessDaySequencer::default(),
            store: ProjectionStore::new(),
        }
    }

    /// Use a custom business-day sequencer
    pub fn with_sequencer(mut self, sequencer: BusinessDaySequencer) -> Self {
        self.sequencer = sequencer;
        self
    }

    pub fn filter(&self) -> &CalendarFilter {
        &self.filter
    }

    /// Change the filter; call [`CalendarView::refresh`] to reload
    pub fn set_filter(&mut self, filter: CalendarFilter) {
        self.filter = filter;
    }

    pub fn store(&self) -> &ProjectionStore {
        &self.store
    }

    /// Column sequence for the current filter
    pub fn days(&self) -> Vec<BusinessDay> {
        self.sequencer
            .generate(self.filter.start, self.filter.end, self.filter.max_days)
    }

    /// Filter sent to the record service.
    ///
    /// The upper bound covers the last generated column, which lies past
    /// `end` when the sequence had to be extended.
    pub fn fetch_filter(&self) -> ProjectionFilter {
        let days = self.days();
        let date_to = days
            .last()
            .map(|d| d.date().max(self.filter.end))
            .unwrap_or(self.filter.end);
        ProjectionFilter {
            date_from: Some(self.filter.start),
            date_to: Some(date_to),
            status: self.filter.status,
        }
    }

    /// Rebuild the grid from the working set
    pub fn grid(&self) -> ProjectionGrid {
        self.store.grid(&self.days())
    }

    /// Fetch and apply in one step
    pub fn refresh<S: ProjectionSource + ?Sized>(&mut self, source: &S) -> Notice {
        let (ticket, filter) = self.begin_refresh();
        let result = source.fetch(&filter);
        self.finish_refresh(ticket, result)
    }

    /// Start a fetch: issue its ticket and the filter to send
    pub fn begin_refresh(&mut self) -> (FetchTicket, ProjectionFilter) {
        let ticket = self.store.begin_fetch();
        let filter = self.fetch_filter();
        debug!(%ticket, ?filter, "fetching projections");
        (ticket, filter)
    }

    /// Apply the response of a fetch started with [`CalendarView::begin_refresh`]
    pub fn finish_refresh(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<ProjectionRecord>, SourceError>,
    ) -> Notice {
        match result {
            Ok(records) => match self.store.complete_fetch(ticket, records) {
                FetchOutcome::Applied { count } => {
                    Notice::info(format!("Loaded {count} projections"))
                }
                FetchOutcome::Stale { .. } => {
                    Notice::info("Discarded an outdated projection response")
                }
            },
            Err(err) => {
                warn!(%ticket, error = %err, "projection fetch failed");
                Notice::error(format!("Could not load projections: {err}"))
            }
        }
    }

    /// Create a projection remotely, then fold the result into the working set
    pub fn create<S: ProjectionSource + ?Sized>(
        &mut self,
        source: &S,
        input: NewProjection,
    ) -> Notice {
        if let Err(err) = input.validate() {
            return Notice::error(format!("Could not create projection: {err}"));
        }
        match source.create(input) {
            Ok(record) => {
                let id = record.id;
                self.store.apply_create(record);
                info!(id, "projection created");
                Notice::success(format!("Projection #{id} created"))
            }
            Err(err) => {
                warn!(error = %err, "projection create failed");
                Notice::error(format!("Could not create projection: {err}"))
            }
        }
    }

    /// Update a projection remotely, then replace it in the working set
    pub fn update<S: ProjectionSource + ?Sized>(
        &mut self,
        source: &S,
        id: ProjectionId,
        patch: ProjectionPatch,
    ) -> Notice {
        if patch.is_empty() {
            return Notice::warning(format!("Nothing to update on projection #{id}"));
        }
        match source.update(id, patch) {
            Ok(record) => {
                if let Reconciliation::Unmatched(id) = self.store.apply_update(record) {
                    debug!(id, "updated projection is outside the current view");
                }
                info!(id, "projection updated");
                Notice::success(format!("Projection #{id} updated"))
            }
            Err(err) => {
                warn!(id, error = %err, "projection update failed");
                Notice::error(format!("Could not update projection #{id}: {err}"))
            }
        }
    }
}
