//! Grid builder
//!
//! Projects a flat record list onto a business-day sequence: records are
//! grouped per client, slotted into their date column and summed along both
//! axes. Records outside the sequence are left out of the grid only.

use std::collections::btree_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use feruca::Collator;
use payproj_core::{
    BusinessDay, ClientId, ClientProjectionGroup, GridTotals, ProjectionGrid, ProjectionRecord,
};
use rust_decimal::Decimal;
use tracing::debug;

/// Build the client × day grid for `days` from `records`.
///
/// When several records of one client fall on the same day, the cell shows
/// the one with the latest `updated_at` (records without a timestamp rank
/// lowest, then the earliest in `records` wins). Every matched record counts
/// toward the totals whether displayed or not.
pub fn build_grid<R: AsRef<ProjectionRecord>>(records: &[R], days: &[BusinessDay]) -> ProjectionGrid {
    let columns: HashSet<NaiveDate> = days.iter().map(BusinessDay::date).collect();

    let mut totals = GridTotals::default();
    for day in days {
        totals.per_date.insert(*day, Decimal::ZERO);
    }

    let mut groups: HashMap<ClientId, ClientProjectionGroup> = HashMap::new();
    let mut dropped = 0usize;

    for record in records.iter().map(AsRef::as_ref) {
        let day = match BusinessDay::new(record.projected_date) {
            Some(day) if columns.contains(&day.date()) => day,
            _ => {
                dropped += 1;
                continue;
            }
        };

        let group = groups
            .entry(record.client_id)
            .or_insert_with(|| ClientProjectionGroup::new(record.client_id, String::new()));
        if group.display_name.is_empty() && !record.client_name.is_empty() {
            group.display_name = record.client_name.clone();
        }

        let idx = group.records.len();
        group.records.push(record.clone());
        match group.cells.entry(day) {
            Entry::Vacant(slot) => {
                slot.insert(idx);
            }
            Entry::Occupied(mut slot) => {
                if supersedes(record, &group.records[*slot.get()]) {
                    slot.insert(idx);
                }
            }
        }

        *totals.per_date.entry(day).or_default() += record.amount;
        *totals.per_client.entry(record.client_id).or_default() += record.amount;
        totals.grand += record.amount;
    }

    let mut groups: Vec<ClientProjectionGroup> = groups
        .into_values()
        .map(|mut group| {
            if group.display_name.is_empty() {
                group.display_name = format!("Client #{}", group.client_id);
            }
            group
        })
        .collect();
    // Unicode collation: accents and case break ties only after the base letters
    let mut collator = Collator::default();
    groups.sort_by(|a, b| {
        collator
            .collate(a.display_name.as_str(), b.display_name.as_str())
            .then(a.client_id.cmp(&b.client_id))
    });

    debug!(
        days = days.len(),
        clients = groups.len(),
        dropped,
        grand = %totals.grand,
        "built projection grid"
    );

    ProjectionGrid {
        days: days.to_vec(),
        groups,
        totals,
    }
}

/// Whether `candidate` should replace `current` in a shared cell
fn supersedes(candidate: &ProjectionRecord, current: &ProjectionRecord) -> bool {
    match (candidate.updated_at, current.updated_at) {
        (Some(new), Some(old)) => new > old,
        (Some(_), None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use payproj_core::{generate_business_days, ProjectionStatus};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn bday(year: i32, month: u32, day: u32) -> BusinessDay {
        BusinessDay::new(date(year, month, day)).unwrap()
    }

    #[test]
    fn two_day_single_client_totals() {
        let records = vec![
            ProjectionRecord::new(1, 10, date(2024, 6, 3), dec!(100))
                .client_name("A")
                .status(ProjectionStatus::Pending),
            ProjectionRecord::new(2, 10, date(2024, 6, 4), dec!(50))
                .client_name("A")
                .status(ProjectionStatus::Fulfilled),
        ];
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 4), 2);

        let grid = build_grid(&records, &days);

        assert_eq!(grid.totals.for_client(10), dec!(150));
        assert_eq!(grid.totals.for_date(bday(2024, 6, 3)), dec!(100));
        assert_eq!(grid.totals.for_date(bday(2024, 6, 4)), dec!(50));
        assert_eq!(grid.totals.grand, dec!(150));
        assert!(grid.totals.is_consistent());

        assert_eq!(grid.groups.len(), 1);
        let group = &grid.groups[0];
        assert_eq!(group.display_name, "A");
        assert_eq!(group.cell(bday(2024, 6, 3)).unwrap().id, 1);
        assert_eq!(group.cell(bday(2024, 6, 4)).unwrap().id, 2);
    }

    #[test]
    fn records_outside_sequence_are_dropped() {
        let records = vec![
            ProjectionRecord::new(1, 1, date(2024, 6, 3), dec!(10)),
            // Next week, not in the grid
            ProjectionRecord::new(2, 1, date(2024, 6, 10), dec!(20)),
            // Weekend dates can never match
            ProjectionRecord::new(3, 2, date(2024, 6, 8), dec!(30)),
        ];
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 7), 5);

        let grid = build_grid(&records, &days);

        assert_eq!(grid.groups.len(), 1);
        assert_eq!(grid.groups[0].records.len(), 1);
        assert_eq!(grid.totals.grand, dec!(10));
        assert!(grid.group(2).is_none());
    }

    #[test]
    fn every_day_has_a_date_total() {
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 7), 5);
        let grid = build_grid::<ProjectionRecord>(&[], &days);

        assert_eq!(grid.totals.per_date.len(), 5);
        assert!(grid.totals.per_date.values().all(|v| v.is_zero()));
        assert!(grid.totals.per_client.is_empty());
        assert!(grid.is_empty());
        assert!(grid.totals.is_consistent());
    }

    #[test]
    fn groups_sorted_by_collated_display_name() {
        let records = vec![
            ProjectionRecord::new(1, 1, date(2024, 6, 3), 1).client_name("beta"),
            ProjectionRecord::new(2, 2, date(2024, 6, 3), 1).client_name("Alpha"),
            ProjectionRecord::new(3, 3, date(2024, 6, 3), 1).client_name("Beta"),
        ];
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 3), 1);

        let grid = build_grid(&records, &days);
        let names: Vec<&str> = grid.groups.iter().map(|g| g.display_name.as_str()).collect();

        // Same letters: lowercase sorts first
        assert_eq!(names, vec!["Alpha", "beta", "Beta"]);
    }

    #[test]
    fn accented_and_lowercase_names_sort_with_their_letters() {
        let records = vec![
            ProjectionRecord::new(1, 1, date(2024, 6, 3), 1).client_name("Zapata"),
            ProjectionRecord::new(2, 2, date(2024, 6, 3), 1).client_name("Álvarez"),
            ProjectionRecord::new(3, 3, date(2024, 6, 3), 1).client_name("banco"),
            ProjectionRecord::new(4, 4, date(2024, 6, 3), 1).client_name("Castro"),
        ];
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 3), 1);

        let grid = build_grid(&records, &days);
        let names: Vec<&str> = grid.groups.iter().map(|g| g.display_name.as_str()).collect();

        assert_eq!(names, vec!["Álvarez", "banco", "Castro", "Zapata"]);
    }

    #[test]
    fn same_name_orders_by_client_id() {
        let records = vec![
            ProjectionRecord::new(1, 9, date(2024, 6, 3), 1).client_name("Acme"),
            ProjectionRecord::new(2, 4, date(2024, 6, 3), 1).client_name("Acme"),
        ];
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 3), 1);

        let grid = build_grid(&records, &days);
        let ids: Vec<u64> = grid.groups.iter().map(|g| g.client_id).collect();

        assert_eq!(ids, vec![4, 9]);
    }

    #[test]
    fn missing_client_name_falls_back_to_id() {
        let records = vec![
            ProjectionRecord::new(1, 77, date(2024, 6, 3), 1),
            ProjectionRecord::new(2, 77, date(2024, 6, 4), 1).client_name("Umbrella"),
            ProjectionRecord::new(3, 78, date(2024, 6, 4), 1),
        ];
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 4), 2);

        let grid = build_grid(&records, &days);

        assert_eq!(grid.group(77).unwrap().display_name, "Umbrella");
        assert_eq!(grid.group(78).unwrap().display_name, "Client #78");
    }

    #[test]
    fn duplicate_cell_first_wins_without_timestamps() {
        let records = vec![
            ProjectionRecord::new(1, 1, date(2024, 6, 3), dec!(10)),
            ProjectionRecord::new(2, 1, date(2024, 6, 3), dec!(20)),
        ];
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 3), 1);

        let grid = build_grid(&records, &days);
        let group = &grid.groups[0];

        assert_eq!(group.cell(days[0]).unwrap().id, 1);
        assert_eq!(group.hidden_on(days[0]), 1);
        // Hidden records still count
        assert_eq!(grid.totals.grand, dec!(30));
        assert_eq!(grid.totals.for_date(days[0]), dec!(30));
    }

    #[test]
    fn duplicate_cell_latest_update_wins() {
        let earlier = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap();
        let records = vec![
            ProjectionRecord::new(1, 1, date(2024, 6, 3), dec!(10)),
            ProjectionRecord::new(2, 1, date(2024, 6, 3), dec!(20)).updated_at(later),
            ProjectionRecord::new(3, 1, date(2024, 6, 3), dec!(30)).updated_at(earlier),
        ];
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 3), 1);

        let grid = build_grid(&records, &days);

        assert_eq!(grid.groups[0].cell(days[0]).unwrap().id, 2);
        assert_eq!(grid.groups[0].hidden_on(days[0]), 2);
    }

    #[test]
    fn totals_consistent_for_mixed_clients() {
        let records: Vec<ProjectionRecord> = (0..40u64)
            .map(|i| {
                let day = date(2024, 6, 3) + chrono::Days::new(i % 12);
                ProjectionRecord::new(i, i % 5, day, Decimal::new((i * 137 % 1000) as i64, 2))
                    .client_name(format!("Client {}", i % 5))
            })
            .collect();
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 14), 10);

        let grid = build_grid(&records, &days);

        let by_date: Decimal = grid.totals.per_date.values().copied().sum();
        let by_client: Decimal = grid.totals.per_client.values().copied().sum();
        assert_eq!(by_date, grid.totals.grand);
        assert_eq!(by_client, grid.totals.grand);
        assert!(grid.totals.is_consistent());
    }

    #[test]
    fn building_twice_is_structurally_equal() {
        let records = vec![
            ProjectionRecord::new(1, 1, date(2024, 6, 3), dec!(10)).client_name("A"),
            ProjectionRecord::new(2, 2, date(2024, 6, 4), dec!(20)).client_name("B"),
            ProjectionRecord::new(3, 1, date(2024, 6, 4), dec!(5)).client_name("A"),
        ];
        let snapshot = records.clone();
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 7), 5);

        let first = build_grid(&records, &days);
        let second = build_grid(&records, &days);

        assert_eq!(first, second);
        assert_eq!(records, snapshot);
    }

    #[test]
    fn accepts_shared_records() {
        let records: Vec<Arc<ProjectionRecord>> = vec![Arc::new(ProjectionRecord::new(
            1,
            1,
            date(2024, 6, 3),
            dec!(10),
        ))];
        let days = generate_business_days(date(2024, 6, 3), date(2024, 6, 3), 1);

        let grid = build_grid(&records, &days);

        assert_eq!(grid.totals.grand, dec!(10));
    }
}
