//! Code churn: lines added and deleted, keyed by entity, author, or day.
//!
//! Entity changes without line counts (binary files, formats without
//! stats) add nothing to the sums but still count as a commit.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use coevo_core::CoevoError;
use serde::Serialize;

use crate::changeset::Changeset;
use crate::table::{Cell, TableRow};

/// Which key churn is aggregated on.
///
/// # Examples
///
/// ```
/// use coevo_history::churn::ChurnKind;
///
/// let kind: ChurnKind = "author-churn".parse().unwrap();
/// assert_eq!(kind, ChurnKind::Author);
/// assert_eq!(kind.to_string(), "author-churn");
/// assert!("line-churn".parse::<ChurnKind>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChurnKind {
    /// Per entity.
    Entity,
    /// Per author.
    Author,
    /// Per day.
    Absolute,
}

impl ChurnKind {
    /// Analysis name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            ChurnKind::Entity => "entity-churn",
            ChurnKind::Author => "author-churn",
            ChurnKind::Absolute => "abs-churn",
        }
    }
}

impl fmt::Display for ChurnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChurnKind {
    type Err = CoevoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "entity-churn" => Ok(ChurnKind::Entity),
            "author-churn" => Ok(ChurnKind::Author),
            "abs-churn" => Ok(ChurnKind::Absolute),
            other => Err(CoevoError::invalid(
                "churn_type",
                format!("expected entity-churn, author-churn or abs-churn, got {other:?}"),
            )),
        }
    }
}

/// Churn totals for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Churn {
    /// Entity path or author name.
    pub name: String,
    /// Lines added.
    pub added: u64,
    /// Lines deleted.
    pub deleted: u64,
    /// Changesets counted, with or without line data.
    pub commits: u32,
}

impl Churn {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            added: 0,
            deleted: 0,
            commits: 0,
        }
    }

    /// `added + deleted`.
    pub fn total(&self) -> u64 {
        self.added + self.deleted
    }
}

/// A [`Churn`] row keyed by entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntityChurn(pub Churn);

/// A [`Churn`] row keyed by author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuthorChurn(pub Churn);

impl TableRow for EntityChurn {
    const COLUMNS: &'static [&'static str] = &["entity", "added", "deleted", "commits"];

    fn cells(&self) -> Vec<Cell> {
        churn_cells(&self.0)
    }
}

impl TableRow for AuthorChurn {
    const COLUMNS: &'static [&'static str] = &["author", "added", "deleted", "commits"];

    fn cells(&self) -> Vec<Cell> {
        churn_cells(&self.0)
    }
}

fn churn_cells(churn: &Churn) -> Vec<Cell> {
    vec![
        Cell::from(&churn.name),
        Cell::from(churn.added),
        Cell::from(churn.deleted),
        Cell::from(churn.commits),
    ]
}

/// Churn per entity, sorted by total churn descending, then name.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use coevo_history::changeset::{Changeset, EntityChange};
/// use coevo_history::churn::entity_churn;
/// use coevo_history::mining::LineCounts;
///
/// let changesets = vec![Changeset {
///     id: "c1".into(),
///     author: "alice".into(),
///     date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     message: None,
///     changes: vec![
///         EntityChange { entity: "a.rs".into(), lines: Some(LineCounts { added: 10, deleted: 2 }) },
///         EntityChange { entity: "logo.png".into(), lines: None },
///     ],
/// }];
/// let rows = entity_churn(&changesets);
/// assert_eq!(rows[0].0.name, "a.rs");
/// assert_eq!(rows[0].0.total(), 12);
/// assert_eq!(rows[1].0.commits, 1);
/// ```
pub fn entity_churn(changesets: &[Changeset]) -> Vec<EntityChurn> {
    let mut by_entity: BTreeMap<&str, Churn> = BTreeMap::new();
    for changeset in changesets {
        for change in &changeset.changes {
            let churn = by_entity
                .entry(change.entity.as_str())
                .or_insert_with(|| Churn::new(&change.entity));
            churn.commits += 1;
            if let Some(lines) = change.lines {
                churn.added += lines.added;
                churn.deleted += lines.deleted;
            }
        }
    }
    sorted(by_entity).into_iter().map(EntityChurn).collect()
}

/// Churn per author, sorted by total churn descending, then name.
pub fn author_churn(changesets: &[Changeset]) -> Vec<AuthorChurn> {
    let mut by_author: BTreeMap<&str, Churn> = BTreeMap::new();
    for changeset in changesets {
        let churn = by_author
            .entry(changeset.author.as_str())
            .or_insert_with(|| Churn::new(&changeset.author));
        churn.commits += 1;
        for lines in changeset.changes.iter().filter_map(|c| c.lines) {
            churn.added += lines.added;
            churn.deleted += lines.deleted;
        }
    }
    sorted(by_author).into_iter().map(AuthorChurn).collect()
}

fn sorted(map: BTreeMap<&str, Churn>) -> Vec<Churn> {
    let mut rows: Vec<Churn> = map.into_values().collect();
    rows.sort_by(|a, b| b.total().cmp(&a.total()).then_with(|| a.name.cmp(&b.name)));
    rows
}

/// Churn for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DailyChurn {
    /// The day.
    pub date: NaiveDate,
    /// Lines added that day.
    pub added: u64,
    /// Lines deleted that day.
    pub deleted: u64,
    /// Changesets that day.
    pub commits: u32,
}

impl TableRow for DailyChurn {
    const COLUMNS: &'static [&'static str] = &["date", "added", "deleted", "commits"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.date),
            Cell::from(self.added),
            Cell::from(self.deleted),
            Cell::from(self.commits),
        ]
    }
}

/// Churn per day, ascending by date.
pub fn absolute_churn(changesets: &[Changeset]) -> Vec<DailyChurn> {
    let mut by_day: BTreeMap<NaiveDate, DailyChurn> = BTreeMap::new();
    for changeset in changesets {
        let day = by_day.entry(changeset.date).or_insert(DailyChurn {
            date: changeset.date,
            added: 0,
            deleted: 0,
            commits: 0,
        });
        day.commits += 1;
        for lines in changeset.changes.iter().filter_map(|c| c.lines) {
            day.added += lines.added;
            day.deleted += lines.deleted;
        }
    }
    by_day.into_values().collect()
}

/// Lines contributed by one author to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Ownership {
    /// Entity path.
    pub entity: String,
    /// Contributing author.
    pub author: String,
    /// Lines added by the author.
    pub added: u64,
    /// Lines deleted by the author.
    pub deleted: u64,
}

impl TableRow for Ownership {
    const COLUMNS: &'static [&'static str] = &["entity", "author", "added", "deleted"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.entity),
            Cell::from(&self.author),
            Cell::from(self.added),
            Cell::from(self.deleted),
        ]
    }
}

/// Per-entity, per-author line contributions.
///
/// Sorted by entity, then the author's total lines descending, then author.
pub fn entity_ownership(changesets: &[Changeset]) -> Vec<Ownership> {
    let mut by_pair: BTreeMap<(&str, &str), (u64, u64)> = BTreeMap::new();
    for changeset in changesets {
        for change in &changeset.changes {
            let entry = by_pair
                .entry((change.entity.as_str(), changeset.author.as_str()))
                .or_default();
            if let Some(lines) = change.lines {
                entry.0 += lines.added;
                entry.1 += lines.deleted;
            }
        }
    }

    let mut rows: Vec<Ownership> = by_pair
        .into_iter()
        .map(|((entity, author), (added, deleted))| Ownership {
            entity: entity.to_string(),
            author: author.to_string(),
            added,
            deleted,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.entity
            .cmp(&b.entity)
            .then_with(|| (b.added + b.deleted).cmp(&(a.added + a.deleted)))
            .then_with(|| a.author.cmp(&b.author))
    });
    rows
}
