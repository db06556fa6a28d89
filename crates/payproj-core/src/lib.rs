//! # payproj-core
//!
//! Core domain model and traits for the payproj projection calendar engine.
//!
//! This crate provides:
//! - Domain types: `ProjectionRecord`, `ProjectionStatus`, `BusinessDay`
//! - Input types for the record service: `NewProjection`, `ProjectionPatch`, `ProjectionFilter`
//! - Grid result types: `ProjectionGrid`, `ClientProjectionGroup`, `GridTotals`
//! - Business-day calendar arithmetic (see [`calendar`])
//! - Core traits: `ProjectionSource`, `GridRenderer`
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use payproj_core::{generate_business_days, ProjectionRecord, ProjectionStatus};
//!
//! let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
//! let friday = NaiveDate::from_ymd_opt(2024, 6, 7).unwrap();
//! let days = generate_business_days(monday, friday, 5);
//! assert_eq!(days.len(), 5);
//!
//! let record = ProjectionRecord::new(1, 42, monday, 100)
//!     .client_name("Acme")
//!     .status(ProjectionStatus::Pending);
//! assert!(record.validate().is_ok());
//! ```

pub mod calendar;

pub use calendar::{
    business_day_on_or_after, generate_business_days, is_business_day, BusinessDay,
    BusinessDaySequencer,
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for a projection record (assigned by the record service)
pub type ProjectionId = u64;

/// Opaque reference to a client owned by the client subsystem
pub type ClientId = u64;

// ============================================================================
// Projection Status
// ============================================================================

/// Lifecycle status of a payment projection
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionStatus {
    #[default]
    Pending,
    Fulfilled,
    Cancelled,
    Overdue,
}

impl ProjectionStatus {
    /// All statuses in legend order
    pub const ALL: [ProjectionStatus; 4] = [
        ProjectionStatus::Pending,
        ProjectionStatus::Fulfilled,
        ProjectionStatus::Cancelled,
        ProjectionStatus::Overdue,
    ];

    /// Wire name used by the record service
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionStatus::Pending => "PENDING",
            ProjectionStatus::Fulfilled => "FULFILLED",
            ProjectionStatus::Cancelled => "CANCELLED",
            ProjectionStatus::Overdue => "OVERDUE",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ProjectionStatus::Pending => "Pending",
            ProjectionStatus::Fulfilled => "Fulfilled",
            ProjectionStatus::Cancelled => "Cancelled",
            ProjectionStatus::Overdue => "Overdue",
        }
    }

    /// Single-letter code for compact text output
    pub fn code(&self) -> char {
        match self {
            ProjectionStatus::Pending => 'P',
            ProjectionStatus::Fulfilled => 'F',
            ProjectionStatus::Cancelled => 'C',
            ProjectionStatus::Overdue => 'O',
        }
    }
}

impl std::fmt::Display for ProjectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ProjectionStatus {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ProjectionStatus::Pending),
            "FULFILLED" => Ok(ProjectionStatus::Fulfilled),
            "CANCELLED" | "CANCELED" => Ok(ProjectionStatus::Cancelled),
            "OVERDUE" => Ok(ProjectionStatus::Overdue),
            _ => Err(ProjectionError::UnknownStatus(s.to_string())),
        }
    }
}

// ============================================================================
// Projection Record
// ============================================================================

/// A scheduled payment expectation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRecord {
    /// Unique identifier, immutable once created
    pub id: ProjectionId,
    /// Client the payment is expected from
    pub client_id: ClientId,
    /// Client display name
    #[serde(default)]
    pub client_name: String,
    /// Expected payment date (day granularity)
    #[serde(deserialize_with = "deserialize_day")]
    pub projected_date: NaiveDate,
    /// Expected amount, non-negative
    pub amount: Decimal,
    /// Current status
    #[serde(default)]
    pub status: ProjectionStatus,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Last modification time reported by the record service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectionRecord {
    /// Create a pending projection with an empty client name
    pub fn new(
        id: ProjectionId,
        client_id: ClientId,
        projected_date: NaiveDate,
        amount: impl Into<Decimal>,
    ) -> Self {
        Self {
            id,
            client_id,
            client_name: String::new(),
            projected_date,
            amount: amount.into(),
            status: ProjectionStatus::Pending,
            notes: None,
            updated_at: None,
        }
    }

    /// Set the client display name
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Set the status
    pub fn status(mut self, status: ProjectionStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the notes
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set the last-modified timestamp
    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Check the record's data invariants
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(ProjectionError::NegativeAmount {
                id: Some(self.id),
                amount: self.amount,
            });
        }
        Ok(())
    }
}

impl AsRef<ProjectionRecord> for ProjectionRecord {
    fn as_ref(&self) -> &ProjectionRecord {
        self
    }
}

/// Input for creating a projection; the record service assigns the id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjection {
    pub client_id: ClientId,
    #[serde(default)]
    pub client_name: String,
    #[serde(deserialize_with = "deserialize_day")]
    pub projected_date: NaiveDate,
    pub amount: Decimal,
    #[serde(default)]
    pub status: ProjectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewProjection {
    pub fn new(client_id: ClientId, projected_date: NaiveDate, amount: impl Into<Decimal>) -> Self {
        Self {
            client_id,
            client_name: String::new(),
            projected_date,
            amount: amount.into(),
            status: ProjectionStatus::Pending,
            notes: None,
        }
    }

    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn status(mut self, status: ProjectionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(ProjectionError::NegativeAmount {
                id: None,
                amount: self.amount,
            });
        }
        Ok(())
    }

    /// Materialize the record once the service has assigned an id
    pub fn into_record(self, id: ProjectionId) -> ProjectionRecord {
        ProjectionRecord {
            id,
            client_id: self.client_id,
            client_name: self.client_name,
            projected_date: self.projected_date,
            amount: self.amount,
            status: self.status,
            notes: self.notes,
            updated_at: None,
        }
    }
}

/// Partial update of a projection; `None` fields are left untouched
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectionStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_day"
    )]
    pub projected_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ProjectionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount(mut self, amount: impl Into<Decimal>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn status(mut self, status: ProjectionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn projected_date(mut self, date: NaiveDate) -> Self {
        self.projected_date = Some(date);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.status.is_none()
            && self.projected_date.is_none()
            && self.notes.is_none()
    }

    /// Apply the patch to a record in place
    pub fn apply_to(&self, record: &mut ProjectionRecord) {
        if let Some(amount) = self.amount {
            record.amount = amount;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(date) = self.projected_date {
            record.projected_date = date;
        }
        if let Some(ref notes) = self.notes {
            record.notes = Some(notes.clone());
        }
    }
}

/// Filter sent along with a fetch; date bounds are inclusive
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectionStatus>,
}

impl ProjectionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn status(mut self, status: ProjectionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Check whether a record passes this filter
    pub fn matches(&self, record: &ProjectionRecord) -> bool {
        if self.date_from.is_some_and(|from| record.projected_date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| record.projected_date > to) {
            return false;
        }
        if self.status.is_some_and(|status| record.status != status) {
            return false;
        }
        true
    }
}

// ============================================================================
// Day-granularity parsing
// ============================================================================

/// Parse a date that may carry a time-of-day component.
///
/// Accepts `2024-06-03`, RFC 3339 timestamps and naive ISO datetimes; the
/// time part is discarded.
pub fn parse_day(raw: &str) -> Result<NaiveDate, ProjectionError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.date());
        }
    }
    Err(ProjectionError::InvalidDate(raw.to_string()))
}

fn deserialize_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_day(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_day(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

// ============================================================================
// Grid (Result)
// ============================================================================

/// All matched projections of one client, slotted into date cells
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientProjectionGroup {
    pub client_id: ClientId,
    pub display_name: String,
    /// Matched records in working-set order
    pub records: Vec<ProjectionRecord>,
    /// Index into `records` of the record displayed for each occupied day
    pub cells: BTreeMap<BusinessDay, usize>,
}

impl ClientProjectionGroup {
    pub fn new(client_id: ClientId, display_name: impl Into<String>) -> Self {
        Self {
            client_id,
            display_name: display_name.into(),
            records: Vec::new(),
            cells: BTreeMap::new(),
        }
    }

    /// Record displayed in the cell for `day`
    pub fn cell(&self, day: BusinessDay) -> Option<&ProjectionRecord> {
        self.cells.get(&day).and_then(|&idx| self.records.get(idx))
    }

    /// All matched records falling on `day`, including ones not displayed
    pub fn records_on(&self, day: BusinessDay) -> impl Iterator<Item = &ProjectionRecord> + '_ {
        self.records
            .iter()
            .filter(move |r| r.projected_date == day.date())
    }

    /// Number of same-day records the cell for `day` does not display
    pub fn hidden_on(&self, day: BusinessDay) -> usize {
        self.records_on(day).count().saturating_sub(1)
    }
}

/// Row, column and grand totals of a grid
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridTotals {
    /// Sum per business day (an entry for every day of the grid)
    pub per_date: BTreeMap<BusinessDay, Decimal>,
    /// Sum per client
    pub per_client: BTreeMap<ClientId, Decimal>,
    /// Sum of every matched record
    pub grand: Decimal,
}

impl GridTotals {
    /// Both axes independently add up to the grand total
    pub fn is_consistent(&self) -> bool {
        let by_date: Decimal = self.per_date.values().copied().sum();
        let by_client: Decimal = self.per_client.values().copied().sum();
        by_date == self.grand && by_client == self.grand
    }

    pub fn for_date(&self, day: BusinessDay) -> Decimal {
        self.per_date.get(&day).copied().unwrap_or_default()
    }

    pub fn for_client(&self, client_id: ClientId) -> Decimal {
        self.per_client.get(&client_id).copied().unwrap_or_default()
    }
}

/// The client × business-day matrix of projections
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectionGrid {
    /// Column sequence the grid was built for
    pub days: Vec<BusinessDay>,
    /// One row per client, sorted by display name
    pub groups: Vec<ClientProjectionGroup>,
    pub totals: GridTotals,
}

impl ProjectionGrid {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, client_id: ClientId) -> Option<&ClientProjectionGroup> {
        self.groups.iter().find(|g| g.client_id == client_id)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// The remote record service the engine consumes
pub trait ProjectionSource {
    /// Fetch every projection matching `filter`
    fn fetch(&self, filter: &ProjectionFilter) -> Result<Vec<ProjectionRecord>, SourceError>;

    /// Create a projection; the returned record carries the assigned id
    fn create(&self, input: NewProjection) -> Result<ProjectionRecord, SourceError>;

    /// Update a projection and return its new state
    fn update(
        &self,
        id: ProjectionId,
        patch: ProjectionPatch,
    ) -> Result<ProjectionRecord, SourceError>;
}

/// Output rendering
pub trait GridRenderer {
    type Output;

    /// Render a grid to the output format
    fn render(&self, grid: &ProjectionGrid) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Invalid projection data
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Negative amount: {amount}")]
    NegativeAmount {
        id: Option<ProjectionId>,
        amount: Decimal,
    },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),
}

/// Record service error
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Projection not found: {0}")]
    NotFound(ProjectionId),

    #[error("Invalid projection: {0}")]
    Invalid(#[from] ProjectionError),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn record_builder() {
        let record = ProjectionRecord::new(7, 3, date(2024, 6, 3), dec!(125.50))
            .client_name("Acme")
            .status(ProjectionStatus::Overdue)
            .notes("second instalment");

        assert_eq!(record.id, 7);
        assert_eq!(record.client_id, 3);
        assert_eq!(record.client_name, "Acme");
        assert_eq!(record.amount, dec!(125.50));
        assert_eq!(record.status, ProjectionStatus::Overdue);
        assert_eq!(record.notes.as_deref(), Some("second instalment"));
        assert!(record.updated_at.is_none());
    }

    #[test]
    fn negative_amount_rejected() {
        let record = ProjectionRecord::new(1, 1, date(2024, 6, 3), dec!(-0.01));
        assert!(matches!(
            record.validate(),
            Err(ProjectionError::NegativeAmount { id: Some(1), .. })
        ));

        let zero = ProjectionRecord::new(2, 1, date(2024, 6, 3), dec!(0));
        assert!(zero.validate().is_ok());

        let input = NewProjection::new(1, date(2024, 6, 3), dec!(-5));
        assert!(input.validate().is_err());
    }

    #[test]
    fn status_round_trips_through_names() {
        for status in ProjectionStatus::ALL {
            assert_eq!(status.as_str().parse::<ProjectionStatus>().unwrap(), status);
            assert_eq!(status.label().parse::<ProjectionStatus>().unwrap(), status);
        }
        assert_eq!(
            "canceled".parse::<ProjectionStatus>().unwrap(),
            ProjectionStatus::Cancelled
        );
        assert!("LATE".parse::<ProjectionStatus>().is_err());
    }

    #[test]
    fn status_display_and_code() {
        assert_eq!(ProjectionStatus::Pending.to_string(), "Pending");
        assert_eq!(ProjectionStatus::Fulfilled.code(), 'F');
        assert_eq!(ProjectionStatus::default(), ProjectionStatus::Pending);
    }

    #[test]
    fn parse_day_discards_time_of_day() {
        assert_eq!(parse_day("2024-06-03").unwrap(), date(2024, 6, 3));
        assert_eq!(parse_day("2024-06-03T23:15:00Z").unwrap(), date(2024, 6, 3));
        assert_eq!(parse_day("2024-06-03T08:00:00").unwrap(), date(2024, 6, 3));
        assert_eq!(parse_day("2024-06-03T08:00:00.250").unwrap(), date(2024, 6, 3));
        assert_eq!(parse_day("2024-06-03 08:00:00").unwrap(), date(2024, 6, 3));
        assert!(matches!(
            parse_day("June 3rd"),
            Err(ProjectionError::InvalidDate(_))
        ));
    }

    #[test]
    fn record_deserializes_service_payload() {
        let json = r#"{
            "id": 12,
            "clientId": 4,
            "clientName": "Globex",
            "projectedDate": "2024-06-04T00:00:00.000Z",
            "amount": "300.25",
            "status": "FULFILLED"
        }"#;
        let record: ProjectionRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, 12);
        assert_eq!(record.client_id, 4);
        assert_eq!(record.projected_date, date(2024, 6, 4));
        assert_eq!(record.amount, dec!(300.25));
        assert_eq!(record.status, ProjectionStatus::Fulfilled);
        assert!(record.notes.is_none());
    }

    #[test]
    fn record_status_defaults_to_pending() {
        let json = r#"{"id": 1, "clientId": 1, "projectedDate": "2024-06-04", "amount": 10}"#;
        let record: ProjectionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, ProjectionStatus::Pending);
        assert_eq!(record.client_name, "");
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut record = ProjectionRecord::new(1, 1, date(2024, 6, 3), dec!(100));
        let patch = ProjectionPatch::new()
            .amount(dec!(200))
            .status(ProjectionStatus::Fulfilled);
        assert!(!patch.is_empty());

        patch.apply_to(&mut record);

        assert_eq!(record.amount, dec!(200));
        assert_eq!(record.status, ProjectionStatus::Fulfilled);
        assert_eq!(record.projected_date, date(2024, 6, 3));
        assert!(ProjectionPatch::new().is_empty());
    }

    #[test]
    fn patch_accepts_timestamped_date() {
        let patch: ProjectionPatch =
            serde_json::from_str(r#"{"projectedDate": "2024-06-05T00:00:00.000Z"}"#).unwrap();
        assert_eq!(patch.projected_date, Some(date(2024, 6, 5)));

        let empty: ProjectionPatch = serde_json::from_str(r#"{"projectedDate": null}"#).unwrap();
        assert!(empty.is_empty());
        assert!(serde_json::from_str::<ProjectionPatch>(r#"{"projectedDate": "soon"}"#).is_err());
    }

    #[test]
    fn new_projection_into_record() {
        let record = NewProjection::new(9, date(2024, 6, 5), dec!(50))
            .client_name("Initech")
            .status(ProjectionStatus::Overdue)
            .into_record(31);

        assert_eq!(record.id, 31);
        assert_eq!(record.client_id, 9);
        assert_eq!(record.client_name, "Initech");
        assert_eq!(record.status, ProjectionStatus::Overdue);
    }

    #[test]
    fn filter_bounds_are_inclusive() {
        let filter = ProjectionFilter::new()
            .date_from(date(2024, 6, 3))
            .date_to(date(2024, 6, 7));

        let inside = ProjectionRecord::new(1, 1, date(2024, 6, 3), 1);
        let edge = ProjectionRecord::new(2, 1, date(2024, 6, 7), 1);
        let before = ProjectionRecord::new(3, 1, date(2024, 6, 2), 1);
        let after = ProjectionRecord::new(4, 1, date(2024, 6, 8), 1);

        assert!(filter.matches(&inside));
        assert!(filter.matches(&edge));
        assert!(!filter.matches(&before));
        assert!(!filter.matches(&after));
    }

    #[test]
    fn filter_by_status() {
        let filter = ProjectionFilter::new().status(ProjectionStatus::Overdue);
        let overdue = ProjectionRecord::new(1, 1, date(2024, 6, 3), 1).status(ProjectionStatus::Overdue);
        let pending = ProjectionRecord::new(2, 1, date(2024, 6, 3), 1);

        assert!(filter.matches(&overdue));
        assert!(!filter.matches(&pending));
        assert!(ProjectionFilter::default().matches(&pending));
    }

    #[test]
    fn group_cell_lookup_and_hidden_count() {
        let monday = BusinessDay::new(date(2024, 6, 3)).unwrap();
        let tuesday = BusinessDay::new(date(2024, 6, 4)).unwrap();

        let mut group = ClientProjectionGroup::new(1, "Acme");
        group.records.push(ProjectionRecord::new(1, 1, date(2024, 6, 3), 10));
        group.records.push(ProjectionRecord::new(2, 1, date(2024, 6, 3), 20));
        group.cells.insert(monday, 1);

        assert_eq!(group.cell(monday).map(|r| r.id), Some(2));
        assert!(group.cell(tuesday).is_none());
        assert_eq!(group.records_on(monday).count(), 2);
        assert_eq!(group.hidden_on(monday), 1);
        assert_eq!(group.hidden_on(tuesday), 0);
    }

    #[test]
    fn stale_cell_index_is_empty() {
        let monday = BusinessDay::new(date(2024, 6, 3)).unwrap();
        let mut group = ClientProjectionGroup::new(1, "Acme");
        group.cells.insert(monday, 3);

        assert!(group.cell(monday).is_none());
    }

    #[test]
    fn totals_consistency_check() {
        let monday = BusinessDay::new(date(2024, 6, 3)).unwrap();
        let mut totals = GridTotals::default();
        totals.per_date.insert(monday, dec!(30));
        totals.per_client.insert(1, dec!(30));
        totals.grand = dec!(30);
        assert!(totals.is_consistent());
        assert_eq!(totals.for_date(monday), dec!(30));
        assert_eq!(totals.for_client(2), dec!(0));

        totals.per_client.insert(2, dec!(1));
        assert!(!totals.is_consistent());
    }
}
