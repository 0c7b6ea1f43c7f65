//! Whole-log summary and the raw identity table.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::changeset::Changeset;
use crate::table::{Cell, TableRow};

/// One summary statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Statistic {
    /// Statistic name.
    pub statistic: &'static str,
    /// Its value.
    pub value: u64,
}

impl TableRow for Statistic {
    const COLUMNS: &'static [&'static str] = &["statistic", "value"];

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::from(self.statistic), Cell::from(self.value)]
    }
}

/// Commit, entity, and author totals for a log.
///
/// `number-of-entities-changed` counts entity changes across all
/// changesets; `number-of-entities` counts distinct entities.
///
/// # Examples
///
/// ```
/// use coevo_history::summary::summarize;
///
/// let rows = summarize(&[]);
/// assert_eq!(rows.len(), 4);
/// assert!(rows.iter().all(|r| r.value == 0));
/// ```
pub fn summarize(changesets: &[Changeset]) -> Vec<Statistic> {
    let entities: BTreeSet<&str> = changesets.iter().flat_map(Changeset::entities).collect();
    let authors: BTreeSet<&str> = changesets.iter().map(|c| c.author.as_str()).collect();
    let changed: usize = changesets.iter().map(Changeset::len).sum();

    vec![
        Statistic {
            statistic: "number-of-commits",
            value: changesets.len() as u64,
        },
        Statistic {
            statistic: "number-of-entities",
            value: entities.len() as u64,
        },
        Statistic {
            statistic: "number-of-entities-changed",
            value: changed as u64,
        },
        Statistic {
            statistic: "number-of-authors",
            value: authors.len() as u64,
        },
    ]
}

/// One entity change as mined, after grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Identity {
    /// Entity path.
    pub entity: String,
    /// Changeset id.
    pub rev: String,
    /// Changeset author.
    pub author: String,
    /// Changeset date.
    pub date: NaiveDate,
    /// Lines added, when known.
    pub added: Option<u64>,
    /// Lines deleted, when known.
    pub deleted: Option<u64>,
}

impl TableRow for Identity {
    const COLUMNS: &'static [&'static str] = &["entity", "rev", "author", "date", "added", "deleted"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.entity),
            Cell::from(&self.rev),
            Cell::from(&self.author),
            Cell::from(self.date),
            Cell::from(self.added),
            Cell::from(self.deleted),
        ]
    }
}

/// Every entity change in log order, for inspecting what was mined.
pub fn identity(changesets: &[Changeset]) -> Vec<Identity> {
    changesets
        .iter()
        .flat_map(|changeset| {
            changeset.changes.iter().map(move |change| Identity {
                entity: change.entity.clone(),
                rev: changeset.id.clone(),
                author: changeset.author.clone(),
                date: changeset.date,
                added: change.lines.map(|l| l.added),
                deleted: change.lines.map(|l| l.deleted),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::tests::changeset;

    fn sample() -> Vec<Changeset> {
        vec![
            changeset("c1", "ann", 1, &[("a.rs", Some((1, 2))), ("b.rs", None)]),
            changeset("c2", "bo", 2, &[("a.rs", Some((3, 0)))]),
        ]
    }

    #[test]
    fn summary_counts() {
        let values: Vec<_> = summarize(&sample())
            .into_iter()
            .map(|s| (s.statistic, s.value))
            .collect();
        assert_eq!(
            values,
            vec![
                ("number-of-commits", 2),
                ("number-of-entities", 2),
                ("number-of-entities-changed", 3),
                ("number-of-authors", 2),
            ]
        );
    }

    #[test]
    fn identity_preserves_log_order_and_unknown_counts() {
        let rows = identity(&sample());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].rev, "c1");
        assert_eq!(rows[1].entity, "b.rs");
        assert_eq!(rows[1].added, None);
        assert_eq!(rows[1].cells()[4], Cell::Missing);
        assert_eq!(rows[2].author, "bo");
        assert_eq!(rows[2].added, Some(3));
    }
}
