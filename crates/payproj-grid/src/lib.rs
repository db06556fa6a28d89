//! # payproj-grid
//!
//! Aggregation and working-state layer for projection calendars.
//!
//! This crate provides:
//! - Grid building: client × business-day matrix with per-date, per-client and grand totals
//! - A local reconciliation store that folds single create/update results into the working set
//! - Ticketed fetches so that stale responses never overwrite fresher data
//! - `CalendarView`, which wires filter, fetch, store and grid together and reports
//!   every outcome as a `Notice`
//! - `MemorySource`, an in-memory record service
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use payproj_core::ProjectionRecord;
//! use payproj_grid::{CalendarFilter, CalendarView, MemorySource};
//!
//! let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
//! let friday = NaiveDate::from_ymd_opt(2024, 6, 7).unwrap();
//! let source = MemorySource::with_records(vec![
//!     ProjectionRecord::new(1, 7, monday, 100).client_name("Acme"),
//! ]);
//!
//! let mut view = CalendarView::new(CalendarFilter::new(monday, friday).max_days(5));
//! let notice = view.refresh(&source);
//! assert!(!notice.is_error());
//!
//! let grid = view.grid();
//! assert_eq!(grid.groups.len(), 1);
//! assert!(grid.totals.is_consistent());
//! ```

pub mod builder;
pub mod notice;
pub mod source;
pub mod store;
pub mod view;

pub use builder::build_grid;
pub use notice::{Notice, NoticeLevel};
pub use source::MemorySource;
pub use store::{FetchOutcome, FetchTicket, ProjectionStore, Reconciliation};
pub use view::{CalendarFilter, CalendarView};
