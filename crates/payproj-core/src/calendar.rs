//! Business-day calendar arithmetic
//!
//! A business day is a Monday–Friday calendar date; no holiday calendar is
//! considered. The sequencer turns a date range plus a requested column count
//! into the ordered list of business days the projection grid is laid out on.
//!
//! ```text
//! start=Fri 06-07, end=Fri 06-07, max_count=5
//!
//!   [06-07]            -> 1 day, short by 4
//!   [06-07 .. 06-17]   -> window extended by the lookahead
//!   Fri 07, Mon 10, Tue 11, Wed 12, Thu 13
//! ```

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A calendar date known to fall on Monday–Friday
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "NaiveDate", into = "NaiveDate")]
pub struct BusinessDay(NaiveDate);

impl BusinessDay {
    /// Wrap `date` if it is a weekday
    pub fn new(date: NaiveDate) -> Option<Self> {
        is_business_day(date).then_some(Self(date))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Full English weekday name, e.g. "Monday"
    pub fn weekday_name(&self) -> &'static str {
        match self.0.weekday() {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }

    /// The following business day
    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().and_then(business_day_on_or_after)
    }
}

impl std::fmt::Display for BusinessDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl TryFrom<NaiveDate> for BusinessDay {
    type Error = String;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        Self::new(date).ok_or_else(|| format!("{date} is not a business day"))
    }
}

impl From<BusinessDay> for NaiveDate {
    fn from(day: BusinessDay) -> Self {
        day.0
    }
}

impl PartialEq<NaiveDate> for BusinessDay {
    fn eq(&self, other: &NaiveDate) -> bool {
        self.0 == *other
    }
}

/// Monday–Friday check
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First business day on or after `date`
pub fn business_day_on_or_after(date: NaiveDate) -> Option<BusinessDay> {
    match date.weekday() {
        Weekday::Sat => date.checked_add_days(Days::new(2)).map(BusinessDay),
        Weekday::Sun => date.checked_add_days(Days::new(1)).map(BusinessDay),
        _ => Some(BusinessDay(date)),
    }
}

/// Produces ordered business-day sequences for the grid columns
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusinessDaySequencer {
    /// Calendar days added to the window each time it falls short
    pub lookahead_days: u32,
    /// Hard cap on how far past `end` the window may grow
    pub max_extension_days: u32,
}

impl Default for BusinessDaySequencer {
    fn default() -> Self {
        Self {
            lookahead_days: 10,
            max_extension_days: 366,
        }
    }
}

impl BusinessDaySequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window extension step
    pub fn lookahead_days(mut self, days: u32) -> Self {
        self.lookahead_days = days;
        self
    }

    /// Set the extension cap
    pub fn max_extension_days(mut self, days: u32) -> Self {
        self.max_extension_days = days;
        self
    }

    /// Business days from `start`, at most `max_count` of them.
    ///
    /// Every weekday in `[start, end]` is taken first. When that yields fewer
    /// than `max_count`, the window grows forward by `lookahead_days` until
    /// enough days are collected or the window reaches `max_extension_days`
    /// past `end`. A weekend `start` is skipped, not shifted. Returns an empty
    /// sequence when `start > end` or `max_count == 0`.
    pub fn generate(&self, start: NaiveDate, end: NaiveDate, max_count: usize) -> Vec<BusinessDay> {
        if start > end || max_count == 0 {
            return Vec::new();
        }

        let limit = end
            .checked_add_days(Days::new(u64::from(self.max_extension_days)))
            .unwrap_or(NaiveDate::MAX);
        let step = Days::new(u64::from(self.lookahead_days.max(1)));

        let mut days = Vec::with_capacity(max_count.min(512));
        let mut cursor = Some(start);
        let mut window_end = end;

        loop {
            while let Some(date) = cursor {
                if date > window_end || days.len() >= max_count {
                    break;
                }
                if let Some(day) = BusinessDay::new(date) {
                    days.push(day);
                }
                cursor = date.succ_opt();
            }

            if days.len() >= max_count || window_end >= limit || cursor.is_none() {
                break;
            }
            window_end = window_end.checked_add_days(step).unwrap_or(limit).min(limit);
        }

        days
    }
}

/// Business days in `[start, end]`, extended forward to reach `max_count`.
///
/// Uses the default lookahead and extension cap of [`BusinessDaySequencer`].
pub fn generate_business_days(start: NaiveDate, end: NaiveDate, max_count: usize) -> Vec<BusinessDay> {
    BusinessDaySequencer::default().generate(start, end, max_count)
}
