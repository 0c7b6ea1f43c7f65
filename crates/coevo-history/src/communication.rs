//! Implicit communication between authors who work on the same entities.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::changeset::Changeset;
use crate::stats::percentage;
use crate::table::{Cell, TableRow};

/// Overlap between two authors, seen from `author`'s side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Communication {
    /// The author whose perspective the row takes.
    pub author: String,
    /// The other author.
    pub peer: String,
    /// Entities both have touched.
    pub shared: u32,
    /// Entities `author` has touched.
    pub own_entities: u32,
    /// `shared / own_entities` in whole percent.
    pub strength: u32,
}

impl TableRow for Communication {
    const COLUMNS: &'static [&'static str] = &["author", "peer", "shared", "own-entities", "strength"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.author),
            Cell::from(&self.peer),
            Cell::from(self.shared),
            Cell::from(self.own_entities),
            Cell::from(self.strength),
        ]
    }
}

/// Link every ordered pair of authors that share at least
/// `min_shared_revs` entities.
///
/// The measure is asymmetric: `(A, B)` and `(B, A)` share the same count
/// but divide it by different totals. Sorted by strength descending, then
/// shared count descending, then author and peer names.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use coevo_history::changeset::{Changeset, EntityChange};
/// use coevo_history::communication::analyze_communication;
///
/// let cs = |author: &str, files: &[&str]| Changeset {
///     id: author.into(),
///     author: author.into(),
///     date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     message: None,
///     changes: files
///         .iter()
///         .map(|f| EntityChange { entity: f.to_string(), lines: None })
///         .collect(),
/// };
/// let rows = analyze_communication(&[cs("ann", &["a", "b"]), cs("bo", &["a"])], 1);
/// assert_eq!(rows[0].author, "bo");
/// assert_eq!(rows[0].strength, 100);
/// assert_eq!(rows[1].author, "ann");
/// assert_eq!(rows[1].strength, 50);
/// ```
pub fn analyze_communication(changesets: &[Changeset], min_shared_revs: u32) -> Vec<Communication> {
    let mut authors_of: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut entities_of: HashMap<&str, u32> = HashMap::new();
    for changeset in changesets {
        for entity in changeset.entities() {
            if authors_of
                .entry(entity)
                .or_default()
                .insert(changeset.author.as_str())
            {
                *entities_of.entry(changeset.author.as_str()).or_default() += 1;
            }
        }
    }

    let mut shared: HashMap<(&str, &str), u32> = HashMap::new();
    for authors in authors_of.values() {
        for a in authors {
            for b in authors {
                if a != b {
                    *shared.entry((*a, *b)).or_default() += 1;
                }
            }
        }
    }

    let mut rows: Vec<Communication> = shared
        .into_iter()
        .filter(|(_, count)| *count >= min_shared_revs)
        .map(|((author, peer), count)| {
            let own = entities_of.get(author).copied().unwrap_or(0);
            Communication {
                author: author.to_string(),
                peer: peer.to_string(),
                shared: count,
                own_entities: own,
                strength: percentage(u64::from(count), u64::from(own)),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.strength
            .cmp(&a.strength)
            .then_with(|| b.shared.cmp(&a.shared))
            .then_with(|| a.author.cmp(&b.author))
            .then_with(|| a.peer.cmp(&b.peer))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::tests::plain;

    fn sample() -> Vec<Changeset> {
        vec![
            plain("c1", "ann", 1, &["a", "b", "c"]),
            plain("c2", "bo", 2, &["a", "b"]),
            plain("c3", "cy", 3, &["c"]),
            plain("c4", "ann", 4, &["a"]),
        ]
    }

    #[test]
    fn strength_is_from_the_authors_perspective() {
        let rows = analyze_communication(&sample(), 1);
        let got: Vec<_> = rows
            .iter()
            .map(|r| (r.author.as_str(), r.peer.as_str(), r.shared, r.strength))
            .collect();
        assert_eq!(
            got,
            vec![
                ("bo", "ann", 2, 100),
                ("cy", "ann", 1, 100),
                ("ann", "bo", 2, 67),
                ("ann", "cy", 1, 33),
            ]
        );
    }

    #[test]
    fn repeated_touches_do_not_inflate_counts() {
        let rows = analyze_communication(&sample(), 1);
        let ann = rows.iter().find(|r| r.author == "ann").unwrap();
        assert_eq!(ann.own_entities, 3);
    }

    #[test]
    fn min_shared_revs_filters_weak_links() {
        let rows = analyze_communication(&sample(), 2);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.shared == 2));
    }

    #[test]
    fn solo_author_has_no_links() {
        let rows = analyze_communication(&[plain("c1", "ann", 1, &["a"])], 0);
        assert!(rows.is_empty());
    }
}
