//! Changesets and per-entity statistics.
//!
//! A changeset is the set of entities one author touched in one logical
//! commit. Grouping follows commit identity when the log carries it and
//! falls back to `(author, date)` otherwise.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use coevo_core::{CoevoError, VcsFormat};
use serde::Serialize;

use crate::mining::{LineCounts, Revision};

/// How revisions are grouped into changesets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grouping {
    /// By commit id when the format has ids and the revision carries one,
    /// otherwise by `(author, date)`.
    #[default]
    Auto,
    /// Always by commit id.
    ById,
    /// Always by `(author, date)`.
    ByAuthorDate,
}

/// One entity's change inside a changeset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityChange {
    /// Normalized entity name.
    pub entity: String,
    /// Summed line counts, `None` when no revision of this entity had any.
    pub lines: Option<LineCounts>,
}

/// A group of entities changed together by one author on one day.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use coevo_history::changeset::{Changeset, EntityChange};
///
/// let cs = Changeset {
///     id: "c1".into(),
///     author: "alice".into(),
///     date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
///     message: None,
///     changes: vec![
///         EntityChange { entity: "a.rs".into(), lines: None },
///         EntityChange { entity: "b.rs".into(), lines: None },
///     ],
/// };
/// assert_eq!(cs.len(), 2);
/// assert!(cs.contains("b.rs"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Changeset {
    /// Shared commit identifier (synthesized as `author@date` when absent).
    pub id: String,
    /// Author shared by every revision in the set.
    pub author: String,
    /// Date shared by every revision in the set.
    pub date: NaiveDate,
    /// Commit message of the first revision, if any.
    pub message: Option<String>,
    /// Distinct entities in order of first appearance.
    pub changes: Vec<EntityChange>,
}

impl Changeset {
    /// Distinct entity names touched.
    pub fn entities(&self) -> impl Iterator<Item = &str> + '_ {
        self.changes.iter().map(|c| c.entity.as_str())
    }

    /// Number of distinct entities touched.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether no entity was touched.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Whether `entity` was touched.
    pub fn contains(&self, entity: &str) -> bool {
        self.entities().any(|e| e == entity)
    }
}

/// Aggregate history of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityStats {
    /// Changesets touching the entity.
    pub revisions: u32,
    /// Distinct authors of those changesets.
    pub authors: BTreeSet<String>,
    /// Earliest changeset date.
    pub first_date: NaiveDate,
    /// Latest changeset date.
    pub last_date: NaiveDate,
}

#[derive(Hash, PartialEq, Eq)]
enum ChangesetKey {
    Id(String),
    AuthorDate(String, NaiveDate),
}

/// Group an ordered revision sequence into changesets.
///
/// Changesets keep the order in which their first revision appears.
/// Duplicate entities inside one changeset collapse to one, summing any
/// known line counts.
///
/// # Errors
///
/// Returns [`CoevoError::Parse`] if a commit id reappears with a different
/// author or date.
pub fn build_changesets(
    revisions: Vec<Revision>,
    format: VcsFormat,
    grouping: Grouping,
) -> Result<Vec<Changeset>, CoevoError> {
    let mut changesets: Vec<Changeset> = Vec::new();
    let mut entity_index: Vec<HashMap<String, usize>> = Vec::new();
    let mut by_key: HashMap<ChangesetKey, usize> = HashMap::new();

    for rev in revisions {
        let by_id = match grouping {
            Grouping::Auto => format.has_native_ids() && !rev.revision_id.is_empty(),
            Grouping::ById => true,
            Grouping::ByAuthorDate => false,
        };
        let key = if by_id {
            ChangesetKey::Id(rev.revision_id.clone())
        } else {
            ChangesetKey::AuthorDate(rev.author.clone(), rev.date)
        };

        let idx = match by_key.get(&key) {
            Some(&idx) => {
                let existing = &changesets[idx];
                if existing.author != rev.author || existing.date != rev.date {
                    return Err(CoevoError::parse(
                        format,
                        rev.line,
                        rev.revision_id.clone(),
                        format!(
                            "revision reappears as {} on {}, first seen as {} on {}",
                            rev.author, rev.date, existing.author, existing.date
                        ),
                    ));
                }
                idx
            }
            None => {
                let id = if rev.revision_id.is_empty() {
                    format!("{}@{}", rev.author, rev.date)
                } else {
                    rev.revision_id.clone()
                };
                changesets.push(Changeset {
                    id,
                    author: rev.author.clone(),
                    date: rev.date,
                    message: rev.message.clone(),
                    changes: Vec::new(),
                });
                entity_index.push(HashMap::new());
                by_key.insert(key, changesets.len() - 1);
                changesets.len() - 1
            }
        };

        let changeset = &mut changesets[idx];
        match entity_index[idx].get(&rev.entity) {
            Some(&pos) => {
                let change = &mut changeset.changes[pos];
                change.lines = merge_lines(change.lines, rev.lines);
            }
            None => {
                entity_index[idx].insert(rev.entity.clone(), changeset.changes.len());
                changeset.changes.push(EntityChange {
                    entity: rev.entity,
                    lines: rev.lines,
                });
            }
        }
    }

    changesets.retain(|c| !c.is_empty());
    Ok(changesets)
}

fn merge_lines(a: Option<LineCounts>, b: Option<LineCounts>) -> Option<LineCounts> {
    match (a, b) {
        (Some(a), Some(b)) => Some(LineCounts {
            added: a.added + b.added,
            deleted: a.deleted + b.deleted,
        }),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Aggregate per-entity statistics in one linear pass.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use coevo_history::changeset::{entity_stats, Changeset, EntityChange};
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
/// let cs = |id: &str, author: &str, d, files: &[&str]| Changeset {
///     id: id.into(),
///     author: author.into(),
///     date: day(d),
///     message: None,
///     changes: files
///         .iter()
///         .map(|f| EntityChange { entity: f.to_string(), lines: None })
///         .collect(),
/// };
/// let stats = entity_stats(&[cs("1", "ann", 3, &["a"]), cs("2", "bo", 1, &["a", "b"])]);
/// assert_eq!(stats["a"].revisions, 2);
/// assert_eq!(stats["a"].authors.len(), 2);
/// assert_eq!(stats["a"].first_date, day(1));
/// assert_eq!(stats["a"].last_date, day(3));
/// ```
pub fn entity_stats<'a>(
    changesets: impl IntoIterator<Item = &'a Changeset>,
) -> BTreeMap<String, EntityStats> {
    let mut stats: BTreeMap<String, EntityStats> = BTreeMap::new();
    for changeset in changesets {
        for entity in changeset.entities() {
            match stats.get_mut(entity) {
                Some(entry) => {
                    entry.revisions += 1;
                    entry.authors.insert(changeset.author.clone());
                    if changeset.date < entry.first_date {
                        entry.first_date = changeset.date;
                    }
                    if changeset.date > entry.last_date {
                        entry.last_date = changeset.date;
                    }
                }
                None => {
                    stats.insert(
                        entity.to_string(),
                        EntityStats {
                            revisions: 1,
                            authors: BTreeSet::from([changeset.author.clone()]),
                            first_date: changeset.date,
                            last_date: changeset.date,
                        },
                    );
                }
            }
        }
    }
    stats
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use coevo_core::ErrorKind;

    pub(crate) fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    /// Changeset fixture; each file gets `(added, deleted)` counts.
    pub(crate) fn changeset(
        id: &str,
        author: &str,
        d: u32,
        files: &[(&str, Option<(u64, u64)>)],
    ) -> Changeset {
        Changeset {
            id: id.into(),
            author: author.into(),
            date: day(d),
            message: None,
            changes: files
                .iter()
                .map(|(entity, lines)| EntityChange {
                    entity: entity.to_string(),
                    lines: lines.map(|(added, deleted)| LineCounts { added, deleted }),
                })
                .collect(),
        }
    }

    /// Changeset fixture without line counts.
    pub(crate) fn plain(id: &str, author: &str, d: u32, files: &[&str]) -> Changeset {
        let files: Vec<(&str, Option<(u64, u64)>)> = files.iter().map(|f| (*f, None)).collect();
        changeset(id, author, d, &files)
    }

    fn rev(id: &str, author: &str, d: u32, entity: &str, lines: Option<(u64, u64)>) -> Revision {
        Revision {
            entity: entity.into(),
            revision_id: id.into(),
            author: author.into(),
            date: day(d),
            message: None,
            lines: lines.map(|(added, deleted)| LineCounts { added, deleted }),
            line: 1,
        }
    }

    #[test]
    fn groups_by_id_in_first_appearance_order() {
        let revs = vec![
            rev("c2", "bo", 2, "x", None),
            rev("c1", "ann", 1, "a", None),
            rev("c2", "bo", 2, "y", None),
        ];
        let sets = build_changesets(revs, VcsFormat::Git2, Grouping::Auto).unwrap();
        let ids: Vec<_> = sets.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
        assert_eq!(sets[0].entities().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn duplicate_entities_collapse_and_sum_counts() {
        let revs = vec![
            rev("c1", "ann", 1, "a", Some((3, 1))),
            rev("c1", "ann", 1, "a", None),
            rev("c1", "ann", 1, "a", Some((2, 2))),
        ];
        let sets = build_changesets(revs, VcsFormat::Git2, Grouping::Auto).unwrap();
        assert_eq!(sets[0].len(), 1);
        assert_eq!(sets[0].changes[0].lines, Some(LineCounts { added: 5, deleted: 3 }));
    }

    #[test]
    fn conflicting_author_for_same_id_is_a_parse_error() {
        let revs = vec![rev("c1", "ann", 1, "a", None), rev("c1", "bo", 1, "b", None)];
        let err = build_changesets(revs, VcsFormat::Git2, Grouping::Auto).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn author_date_grouping_merges_distinct_ids() {
        let revs = vec![
            rev("r1", "ann", 1, "a", None),
            rev("r2", "ann", 1, "b", None),
            rev("r3", "bo", 1, "c", None),
        ];
        let sets = build_changesets(revs, VcsFormat::Svn, Grouping::ByAuthorDate).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].id, "r1");
        assert_eq!(sets[0].len(), 2);
    }

    #[test]
    fn missing_ids_fall_back_to_author_and_date() {
        let revs = vec![rev("", "ann", 1, "a", None), rev("", "ann", 1, "b", None)];
        let sets = build_changesets(revs, VcsFormat::Hg, Grouping::Auto).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].id, "ann@2024-01-01");
    }

    #[test]
    fn stats_count_changesets_per_entity() {
        let sets = vec![
            plain("c1", "ann", 1, &["A", "B"]),
            plain("c2", "bo", 5, &["A", "B", "C"]),
            plain("c3", "ann", 3, &["B"]),
        ];
        let stats = entity_stats(&sets);
        assert_eq!(stats["A"].revisions, 2);
        assert_eq!(stats["B"].revisions, 3);
        assert_eq!(stats["C"].revisions, 1);
        assert_eq!(stats["B"].first_date, day(1));
        assert_eq!(stats["B"].last_date, day(5));
        assert_eq!(
            stats["B"].authors.iter().cloned().collect::<Vec<_>>(),
            vec!["ann".to_string(), "bo".to_string()]
        );
    }
}
