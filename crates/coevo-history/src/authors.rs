//! Authorship and revision counts per entity.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::changeset::EntityStats;
use crate::table::{Cell, TableRow};

/// Number of distinct authors of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntityAuthors {
    /// Entity path.
    pub entity: String,
    /// Distinct authors.
    pub n_authors: u32,
    /// Changesets touching the entity.
    pub revisions: u32,
}

impl TableRow for EntityAuthors {
    const COLUMNS: &'static [&'static str] = &["entity", "n-authors", "revs"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.entity),
            Cell::from(self.n_authors),
            Cell::from(self.revisions),
        ]
    }
}

/// Entities ranked by number of authors, then revisions, then name.
///
/// Entities with fewer than `min_revs` revisions are left out.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use coevo_history::authors::analyze_authors;
/// use coevo_history::changeset::{entity_stats, Changeset, EntityChange};
///
/// let cs = |author: &str| Changeset {
///     id: author.into(),
///     author: author.into(),
///     date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     message: None,
///     changes: vec![EntityChange { entity: "a.rs".into(), lines: None }],
/// };
/// let stats = entity_stats(&[cs("ann"), cs("bo"), cs("ann")]);
/// let rows = analyze_authors(&stats, 1);
/// assert_eq!(rows[0].n_authors, 2);
/// assert_eq!(rows[0].revisions, 3);
/// ```
pub fn analyze_authors(stats: &BTreeMap<String, EntityStats>, min_revs: u32) -> Vec<EntityAuthors> {
    let mut rows: Vec<EntityAuthors> = stats
        .iter()
        .filter(|(_, s)| s.revisions >= min_revs)
        .map(|(entity, s)| EntityAuthors {
            entity: entity.clone(),
            n_authors: s.authors.len() as u32,
            revisions: s.revisions,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.n_authors
            .cmp(&a.n_authors)
            .then_with(|| b.revisions.cmp(&a.revisions))
            .then_with(|| a.entity.cmp(&b.entity))
    });
    rows
}

/// Revision count of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntityRevisions {
    /// Entity path.
    pub entity: String,
    /// Changesets touching the entity.
    pub n_revs: u32,
}

impl TableRow for EntityRevisions {
    const COLUMNS: &'static [&'static str] = &["entity", "n-revs"];

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::from(&self.entity), Cell::from(self.n_revs)]
    }
}

/// Entities ranked by revision count, then name.
pub fn analyze_revisions(
    stats: &BTreeMap<String, EntityStats>,
    min_revs: u32,
) -> Vec<EntityRevisions> {
    let mut rows: Vec<EntityRevisions> = stats
        .iter()
        .filter(|(_, s)| s.revisions >= min_revs)
        .map(|(entity, s)| EntityRevisions {
            entity: entity.clone(),
            n_revs: s.revisions,
        })
        .collect();
    rows.sort_by(|a, b| b.n_revs.cmp(&a.n_revs).then_with(|| a.entity.cmp(&b.entity)));
    rows
}
