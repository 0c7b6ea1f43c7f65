//! Code age: days since each entity was last changed.
//!
//! Age is measured against the most recent date in the log rather than
//! the wall clock, so the result is reproducible from a fixed log.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use coevo_core::CoevoError;
use serde::Serialize;

use crate::changeset::EntityStats;
use crate::table::{Cell, TableRow};

/// Row order for analyses that support both directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Parameters for [`analyze_age`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgeOptions {
    /// Entities with fewer revisions are left out.
    pub min_revs: u32,
    /// Date to measure against; the latest log date when `None`.
    pub reference_date: Option<NaiveDate>,
    /// Ascending puts the most recently changed entities first.
    pub order: SortOrder,
}

/// Age of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntityAge {
    /// Entity path.
    pub entity: String,
    /// Whole days between the last change and the reference date.
    pub age_days: i64,
    /// Date of the last change.
    pub last_date: NaiveDate,
}

impl TableRow for EntityAge {
    const COLUMNS: &'static [&'static str] = &["entity", "age-days", "last-date"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.entity),
            Cell::from(self.age_days),
            Cell::from(self.last_date),
        ]
    }
}

/// Compute entity ages.
///
/// `latest` is the most recent changeset date in the log.
///
/// # Errors
///
/// Returns [`CoevoError::InvalidParameter`] if an explicit reference date
/// lies before `latest`, which would produce negative ages.
///
/// # Examples
///
/// ```
/// use std::collections::{BTreeMap, BTreeSet};
/// use chrono::NaiveDate;
/// use coevo_history::age::{analyze_age, AgeOptions};
/// use coevo_history::changeset::EntityStats;
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
/// let stats = BTreeMap::from([(
///     "a.rs".to_string(),
///     EntityStats { revisions: 1, authors: BTreeSet::new(), first_date: day(1), last_date: day(3) },
/// )]);
/// let rows = analyze_age(&stats, Some(day(10)), &AgeOptions::default()).unwrap();
/// assert_eq!(rows[0].age_days, 7);
/// ```
pub fn analyze_age(
    stats: &BTreeMap<String, EntityStats>,
    latest: Option<NaiveDate>,
    options: &AgeOptions,
) -> Result<Vec<EntityAge>, CoevoError> {
    let reference = match (options.reference_date, latest) {
        (Some(reference), Some(latest)) if reference < latest => {
            return Err(CoevoError::invalid(
                "age_time_now",
                format!("{reference} is earlier than the latest change on {latest}"),
            ));
        }
        (Some(reference), _) => reference,
        (None, Some(latest)) => latest,
        (None, None) => return Ok(Vec::new()),
    };

    let mut rows: Vec<EntityAge> = stats
        .iter()
        .filter(|(_, s)| s.revisions >= options.min_revs)
        .map(|(entity, s)| EntityAge {
            entity: entity.clone(),
            age_days: (reference - s.last_date).num_days(),
            last_date: s.last_date,
        })
        .collect();

    match options.order {
        SortOrder::Ascending => {
            rows.sort_by(|a, b| a.age_days.cmp(&b.age_days).then_with(|| a.entity.cmp(&b.entity)));
        }
        SortOrder::Descending => {
            rows.sort_by(|a, b| b.age_days.cmp(&a.age_days).then_with(|| a.entity.cmp(&b.entity)));
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::entity_stats;
    use crate::changeset::tests::{day, plain};
    use coevo_core::ErrorKind;

    fn fixture() -> BTreeMap<String, EntityStats> {
        entity_stats(&[
            plain("c1", "ann", 1, &["old.rs", "mid.rs"]),
            plain("c2", "ann", 5, &["mid.rs"]),
            plain("c3", "bo", 9, &["new.rs", "also_new.rs"]),
        ])
    }

    #[test]
    fn newest_entity_has_age_zero() {
        let rows = analyze_age(&fixture(), Some(day(9)), &AgeOptions::default()).unwrap();
        let got: Vec<_> = rows.iter().map(|r| (r.entity.as_str(), r.age_days)).collect();
        assert_eq!(
            got,
            vec![("also_new.rs", 0), ("new.rs", 0), ("mid.rs", 4), ("old.rs", 8)]
        );
    }

    #[test]
    fn descending_puts_oldest_first() {
        let options = AgeOptions {
            order: SortOrder::Descending,
            ..AgeOptions::default()
        };
        let rows = analyze_age(&fixture(), Some(day(9)), &options).unwrap();
        assert_eq!(rows[0].entity, "old.rs");
        assert_eq!(rows[3].entity, "new.rs");
    }

    #[test]
    fn min_revs_filters_entities() {
        let options = AgeOptions {
            min_revs: 2,
            ..AgeOptions::default()
        };
        let rows = analyze_age(&fixture(), Some(day(9)), &options).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity, "mid.rs");
    }

    #[test]
    fn explicit_reference_date_shifts_ages() {
        let options = AgeOptions {
            reference_date: Some(day(19)),
            ..AgeOptions::default()
        };
        let rows = analyze_age(&fixture(), Some(day(9)), &options).unwrap();
        assert_eq!(rows[0].age_days, 10);
    }

    #[test]
    fn reference_before_latest_change_is_rejected() {
        let options = AgeOptions {
            reference_date: Some(day(2)),
            ..AgeOptions::default()
        };
        let err = analyze_age(&fixture(), Some(day(9)), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn empty_log_yields_no_rows() {
        let rows = analyze_age(&BTreeMap::new(), None, &AgeOptions::default()).unwrap();
        assert!(rows.is_empty());
    }
}
