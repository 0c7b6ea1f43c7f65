//! Entity effort: how each entity's revisions and lines split across its
//! authors, and the ownership measures derived from that split.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::changeset::Changeset;
use crate::stats::{ratio2, round2};
use crate::table::{Cell, TableRow};

/// One author's revisions on one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntityEffort {
    /// Entity path.
    pub entity: String,
    /// Contributing author.
    pub author: String,
    /// Changesets by `author` touching `entity`.
    pub author_revs: u32,
    /// Changesets touching `entity` in total.
    pub total_revs: u32,
}

impl TableRow for EntityEffort {
    const COLUMNS: &'static [&'static str] = &["entity", "author", "author-revs", "total-revs"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.entity),
            Cell::from(&self.author),
            Cell::from(self.author_revs),
            Cell::from(self.total_revs),
        ]
    }
}

/// Per-author accumulation for one entity.
#[derive(Default)]
struct AuthorWork {
    revisions: u32,
    added: u64,
    deleted: u64,
}

/// `entity -> author -> work`, both levels sorted by name.
fn work_by_entity(changesets: &[Changeset]) -> BTreeMap<&str, BTreeMap<&str, AuthorWork>> {
    let mut work: BTreeMap<&str, BTreeMap<&str, AuthorWork>> = BTreeMap::new();
    for changeset in changesets {
        for change in &changeset.changes {
            let entry = work
                .entry(change.entity.as_str())
                .or_default()
                .entry(changeset.author.as_str())
                .or_default();
            entry.revisions += 1;
            if let Some(lines) = change.lines {
                entry.added += lines.added;
                entry.deleted += lines.deleted;
            }
        }
    }
    work
}

fn total_revisions(authors: &BTreeMap<&str, AuthorWork>) -> u32 {
    authors.values().map(|w| w.revisions).sum()
}

/// Revisions per author on each entity.
///
/// Entities with fewer than `min_revs` revisions in total are left out.
/// Rows are grouped by entity; within an entity the most active author
/// comes first.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use coevo_history::changeset::{Changeset, EntityChange};
/// use coevo_history::effort::entity_effort;
///
/// let cs = |author: &str| Changeset {
///     id: author.into(),
///     author: author.into(),
///     date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     message: None,
///     changes: vec![EntityChange { entity: "a.rs".into(), lines: None }],
/// };
/// let rows = entity_effort(&[cs("ann"), cs("bo"), cs("ann")], 1);
/// assert_eq!(rows[0].author, "ann");
/// assert_eq!(rows[0].author_revs, 2);
/// assert_eq!(rows[0].total_revs, 3);
/// ```
pub fn entity_effort(changesets: &[Changeset], min_revs: u32) -> Vec<EntityEffort> {
    let mut rows = Vec::new();
    for (entity, authors) in work_by_entity(changesets) {
        let total_revs = total_revisions(&authors);
        if total_revs < min_revs {
            continue;
        }
        let mut entity_rows: Vec<EntityEffort> = authors
            .into_iter()
            .map(|(author, work)| EntityEffort {
                entity: entity.to_string(),
                author: author.to_string(),
                author_revs: work.revisions,
                total_revs,
            })
            .collect();
        entity_rows.sort_by(|a, b| {
            b.author_revs
                .cmp(&a.author_revs)
                .then_with(|| a.author.cmp(&b.author))
        });
        rows.extend(entity_rows);
    }
    rows
}

/// What a main developer is measured by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainDevMetric {
    /// Lines added (`main-dev`).
    AddedLines,
    /// Lines deleted (`refactoring-main-dev`).
    DeletedLines,
    /// Revisions (`main-dev-by-revs`).
    Revisions,
}

impl MainDevMetric {
    /// Analysis name for this metric.
    pub fn name(self) -> &'static str {
        match self {
            MainDevMetric::AddedLines => "main-dev",
            MainDevMetric::DeletedLines => "refactoring-main-dev",
            MainDevMetric::Revisions => "main-dev-by-revs",
        }
    }

    fn measure(self, work: &AuthorWork) -> u64 {
        match self {
            MainDevMetric::AddedLines => work.added,
            MainDevMetric::DeletedLines => work.deleted,
            MainDevMetric::Revisions => u64::from(work.revisions),
        }
    }
}

impl fmt::Display for MainDevMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The top contributor to one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MainDeveloper {
    /// Entity path.
    pub entity: String,
    /// Author with the largest contribution.
    pub main_dev: String,
    /// That author's contribution.
    pub value: u64,
    /// Contribution of all authors.
    pub total: u64,
    /// `value / total`, two decimals.
    pub ownership: f64,
}

impl TableRow for MainDeveloper {
    const COLUMNS: &'static [&'static str] = &["entity", "main-dev", "value", "total", "ownership"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.entity),
            Cell::from(&self.main_dev),
            Cell::from(self.value),
            Cell::from(self.total),
            Cell::from(self.ownership),
        ]
    }
}

/// Main developer of each entity, in entity order.
///
/// Entities with fewer than `min_revs` revisions are left out, as are
/// entities with no measurable contribution (no line data for a line
/// metric). Equal contributions go to the alphabetically first author.
pub fn main_developers(
    changesets: &[Changeset],
    metric: MainDevMetric,
    min_revs: u32,
) -> Vec<MainDeveloper> {
    let mut rows = Vec::new();
    for (entity, authors) in work_by_entity(changesets) {
        if total_revisions(&authors) < min_revs {
            continue;
        }
        let total: u64 = authors.values().map(|w| metric.measure(w)).sum();
        if total == 0 {
            continue;
        }
        let mut best: Option<(&str, u64)> = None;
        for (author, work) in &authors {
            let value = metric.measure(work);
            if best.map_or(true, |(_, top)| value > top) {
                best = Some((*author, value));
            }
        }
        if let Some((author, value)) = best {
            rows.push(MainDeveloper {
                entity: entity.to_string(),
                main_dev: author.to_string(),
                value,
                total,
                ownership: ratio2(value, total),
            });
        }
    }
    rows
}

/// How scattered the work on one entity is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Fragmentation {
    /// Entity path.
    pub entity: String,
    /// `1 - sum(share^2)` over author revision shares; 0 for one author.
    pub fractal_value: f64,
    /// Changesets touching the entity.
    pub total_revs: u32,
    /// Distinct authors.
    pub n_authors: u32,
}

impl TableRow for Fragmentation {
    const COLUMNS: &'static [&'static str] = &["entity", "fractal-value", "total-revs", "n-authors"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.entity),
            Cell::from(self.fractal_value),
            Cell::from(self.total_revs),
            Cell::from(self.n_authors),
        ]
    }
}

/// Fractal value of every entity, most fragmented first.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use coevo_history::changeset::{Changeset, EntityChange};
/// use coevo_history::effort::fragmentation;
///
/// let cs = |author: &str| Changeset {
///     id: author.into(),
///     author: author.into(),
///     date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     message: None,
///     changes: vec![EntityChange { entity: "a.rs".into(), lines: None }],
/// };
/// let rows = fragmentation(&[cs("ann"), cs("bo")], 1);
/// assert_eq!(rows[0].fractal_value, 0.5);
/// ```
pub fn fragmentation(changesets: &[Changeset], min_revs: u32) -> Vec<Fragmentation> {
    let mut rows: Vec<Fragmentation> = work_by_entity(changesets)
        .into_iter()
        .filter_map(|(entity, authors)| {
            let total_revs = total_revisions(&authors);
            if total_revs < min_revs || total_revs == 0 {
                return None;
            }
            let total = f64::from(total_revs);
            let concentration: f64 = authors
                .values()
                .map(|w| {
                    let share = f64::from(w.revisions) / total;
                    share * share
                })
                .sum();
            Some(Fragmentation {
                entity: entity.to_string(),
                fractal_value: round2(1.0 - concentration),
                total_revs,
                n_authors: authors.len() as u32,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.fractal_value
            .total_cmp(&a.fractal_value)
            .then_with(|| a.entity.cmp(&b.entity))
    });
    rows
}
