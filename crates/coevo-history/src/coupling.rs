//! Logical coupling detection.
//!
//! Identifies pairs of entities that change together in the same
//! changesets, independent of any declared dependency between them.

use std::collections::HashMap;

use coevo_core::{CoevoError, CouplingConfig};
use serde::Serialize;

use crate::changeset::Changeset;
use crate::stats::{average_rounded, percentage};
use crate::table::{Cell, TableRow};

/// Thresholds for [`analyze_coupling`].
///
/// # Examples
///
/// ```
/// use coevo_history::coupling::CouplingOptions;
///
/// let opts = CouplingOptions::default();
/// assert_eq!(opts.min_coupling, 30);
/// assert_eq!(opts.max_coupling, 100);
/// assert_eq!(opts.min_revs, 5);
/// assert_eq!(opts.max_changeset_size, 30);
/// assert!(opts.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouplingOptions {
    /// Lowest coupling degree reported, in percent.
    pub min_coupling: u32,
    /// Highest coupling degree reported, in percent.
    pub max_coupling: u32,
    /// Minimum revisions per entity for either side of a pair.
    pub min_revs: u32,
    /// Changesets touching more entities than this are ignored.
    pub max_changeset_size: usize,
}

impl Default for CouplingOptions {
    fn default() -> Self {
        CouplingConfig::default().into()
    }
}

impl From<CouplingConfig> for CouplingOptions {
    fn from(config: CouplingConfig) -> Self {
        Self {
            min_coupling: config.min_coupling,
            max_coupling: config.max_coupling,
            min_revs: config.min_revs,
            max_changeset_size: config.max_changeset_size,
        }
    }
}

impl CouplingOptions {
    /// Reject thresholds outside their domain.
    ///
    /// # Errors
    ///
    /// Returns [`CoevoError::InvalidParameter`] if a percentage exceeds 100,
    /// `min_coupling > max_coupling`, or `max_changeset_size` is zero.
    pub fn validate(&self) -> Result<(), CoevoError> {
        if self.min_coupling > 100 {
            return Err(CoevoError::invalid("min_coupling", "must be between 0 and 100"));
        }
        if self.max_coupling > 100 {
            return Err(CoevoError::invalid("max_coupling", "must be between 0 and 100"));
        }
        if self.min_coupling > self.max_coupling {
            return Err(CoevoError::invalid(
                "min_coupling",
                format!(
                    "{} exceeds max_coupling {}",
                    self.min_coupling, self.max_coupling
                ),
            ));
        }
        validate_changeset_size(self.max_changeset_size)
    }
}

pub(crate) fn validate_changeset_size(max_changeset_size: usize) -> Result<(), CoevoError> {
    if max_changeset_size == 0 {
        return Err(CoevoError::invalid(
            "max_changeset_size",
            "must be at least 1",
        ));
    }
    Ok(())
}

/// Two entities that change together.
///
/// `entity` always sorts before `coupled`, so a pair is reported once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CouplingPair {
    /// Lexicographically smaller entity.
    pub entity: String,
    /// Lexicographically larger entity.
    pub coupled: String,
    /// `shared_revisions / min(revs(entity), revs(coupled))` in whole percent.
    pub degree: u32,
    /// Mean of both entities' revision counts, rounded half-up.
    pub average_revisions: u32,
    /// Changesets containing both entities.
    pub shared_revisions: u32,
}

impl TableRow for CouplingPair {
    const COLUMNS: &'static [&'static str] =
        &["entity", "coupled", "degree", "average-revs", "shared-revs"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.entity),
            Cell::from(&self.coupled),
            Cell::from(self.degree),
            Cell::from(self.average_revisions),
            Cell::from(self.shared_revisions),
        ]
    }
}

/// Detect logical coupling between entities.
///
/// Changesets larger than `max_changeset_size` are skipped entirely, both
/// for pair counting and for the per-entity revision counts the degree is
/// computed against. Pairs are sorted by degree descending, then average
/// revisions descending, then by name.
///
/// # Errors
///
/// Returns [`CoevoError::InvalidParameter`] if `options` fail
/// [`CouplingOptions::validate`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use coevo_history::changeset::{Changeset, EntityChange};
/// use coevo_history::coupling::{analyze_coupling, CouplingOptions};
///
/// let cs = |id: &str, files: &[&str]| Changeset {
///     id: id.into(),
///     author: "alice".into(),
///     date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     message: None,
///     changes: files
///         .iter()
///         .map(|f| EntityChange { entity: f.to_string(), lines: None })
///         .collect(),
/// };
/// let changesets = vec![cs("1", &["a.rs", "b.rs"]), cs("2", &["a.rs", "b.rs"])];
/// let opts = CouplingOptions { min_revs: 1, ..CouplingOptions::default() };
/// let pairs = analyze_coupling(&changesets, &opts).unwrap();
/// assert_eq!(pairs.len(), 1);
/// assert_eq!(pairs[0].degree, 100);
/// ```
pub fn analyze_coupling(
    changesets: &[Changeset],
    options: &CouplingOptions,
) -> Result<Vec<CouplingPair>, CoevoError> {
    options.validate()?;

    let mut revisions: HashMap<&str, u32> = HashMap::new();
    let mut shared: HashMap<(&str, &str), u32> = HashMap::new();

    for changeset in within_size(changesets, options.max_changeset_size) {
        let entities: Vec<&str> = changeset.entities().collect();
        for entity in &entities {
            *revisions.entry(*entity).or_default() += 1;
        }
        for i in 0..entities.len() {
            for j in (i + 1)..entities.len() {
                *shared.entry(normalize_pair(entities[i], entities[j])).or_default() += 1;
            }
        }
    }

    let mut pairs = Vec::new();
    for ((entity, coupled), shared_revisions) in shared {
        let revs_a = revisions.get(entity).copied().unwrap_or(0);
        let revs_b = revisions.get(coupled).copied().unwrap_or(0);
        if revs_a < options.min_revs || revs_b < options.min_revs {
            continue;
        }

        let degree = percentage(u64::from(shared_revisions), u64::from(revs_a.min(revs_b)));
        if degree < options.min_coupling || degree > options.max_coupling {
            continue;
        }

        pairs.push(CouplingPair {
            entity: entity.to_string(),
            coupled: coupled.to_string(),
            degree,
            average_revisions: average_rounded(revs_a, revs_b),
            shared_revisions,
        });
    }

    pairs.sort_by(|a, b| {
        b.degree
            .cmp(&a.degree)
            .then_with(|| b.average_revisions.cmp(&a.average_revisions))
            .then_with(|| a.entity.cmp(&b.entity))
            .then_with(|| a.coupled.cmp(&b.coupled))
    });

    tracing::debug!(pairs = pairs.len(), "coupling analysis complete");
    Ok(pairs)
}

/// Sum of coupling for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SumOfCoupling {
    /// Entity name.
    pub entity: String,
    /// Number of other entities it was changed with, summed over changesets.
    pub soc: u64,
}

impl TableRow for SumOfCoupling {
    const COLUMNS: &'static [&'static str] = &["entity", "soc"];

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::from(&self.entity), Cell::from(self.soc)]
    }
}

/// Sum of coupling: for each entity, add `k - 1` for every size-filtered
/// changeset of `k` entities it appears in.
///
/// Sorted by `soc` descending, then entity name.
pub fn sum_of_coupling(
    changesets: &[Changeset],
    max_changeset_size: usize,
) -> Result<Vec<SumOfCoupling>, CoevoError> {
    validate_changeset_size(max_changeset_size)?;

    let mut soc: HashMap<&str, u64> = HashMap::new();
    for changeset in within_size(changesets, max_changeset_size) {
        let others = changeset.len() as u64 - 1;
        for entity in changeset.entities() {
            *soc.entry(entity).or_default() += others;
        }
    }

    let mut rows: Vec<SumOfCoupling> = soc
        .into_iter()
        .map(|(entity, soc)| SumOfCoupling {
            entity: entity.to_string(),
            soc,
        })
        .collect();
    rows.sort_by(|a, b| b.soc.cmp(&a.soc).then_with(|| a.entity.cmp(&b.entity)));
    Ok(rows)
}

fn within_size(
    changesets: &[Changeset],
    max_changeset_size: usize,
) -> impl Iterator<Item = &Changeset> {
    changesets
        .iter()
        .filter(move |c| !c.is_empty() && c.len() <= max_changeset_size)
}

fn normalize_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::tests::plain;
    use coevo_core::ErrorKind;

    fn opts(min_revs: u32, max_changeset_size: usize) -> CouplingOptions {
        CouplingOptions {
            min_coupling: 0,
            max_coupling: 100,
            min_revs,
            max_changeset_size,
        }
    }

    fn find<'a>(pairs: &'a [CouplingPair], a: &str, b: &str) -> Option<&'a CouplingPair> {
        pairs.iter().find(|p| p.entity == a && p.coupled == b)
    }

    #[test]
    fn three_changeset_scenario() {
        let changesets = vec![
            plain("c1", "ann", 1, &["A", "B"]),
            plain("c2", "ann", 2, &["A", "B", "C"]),
            plain("c3", "ann", 3, &["B"]),
        ];
        let pairs = analyze_coupling(&changesets, &opts(1, 10)).unwrap();
        assert_eq!(pairs.len(), 3);

        let ab = find(&pairs, "A", "B").unwrap();
        assert_eq!(ab.shared_revisions, 2);
        assert_eq!(ab.degree, 100);
        assert_eq!(ab.average_revisions, 3);

        assert_eq!(find(&pairs, "A", "C").unwrap().degree, 100);
        assert_eq!(find(&pairs, "B", "C").unwrap().degree, 100);

        // Equal degrees: higher average revisions first, then names.
        let order: Vec<_> = pairs
            .iter()
            .map(|p| (p.entity.as_str(), p.coupled.as_str()))
            .collect();
        assert_eq!(order, vec![("A", "B"), ("A", "C"), ("B", "C")]);
    }

    #[test]
    fn degree_is_relative_to_the_less_changed_entity() {
        let changesets = vec![
            plain("c1", "ann", 1, &["A", "B"]),
            plain("c2", "ann", 2, &["A", "B"]),
            plain("c3", "ann", 3, &["A"]),
            plain("c4", "ann", 4, &["B"]),
            plain("c5", "ann", 5, &["B", "C"]),
        ];
        let pairs = analyze_coupling(&changesets, &opts(1, 10)).unwrap();
        let ab = find(&pairs, "A", "B").unwrap();
        assert_eq!(ab.shared_revisions, 2);
        assert_eq!(ab.degree, 67);
        assert_eq!(find(&pairs, "B", "C").unwrap().degree, 100);
    }

    #[test]
    fn pairs_are_never_reported_twice() {
        let changesets = vec![
            plain("c1", "ann", 1, &["b.rs", "a.rs"]),
            plain("c2", "ann", 2, &["a.rs", "b.rs"]),
        ];
        let pairs = analyze_coupling(&changesets, &opts(1, 10)).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].entity, "a.rs");
        assert_eq!(pairs[0].coupled, "b.rs");
        assert_eq!(pairs[0].shared_revisions, 2);
    }

    #[test]
    fn oversized_changesets_contribute_no_pairs() {
        let files: Vec<String> = (0..40).map(|i| format!("f{i:02}.rs")).collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let changesets = vec![plain("big", "ann", 1, &refs)];
        let pairs = analyze_coupling(&changesets, &opts(1, 30)).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn min_revs_excludes_rarely_changed_entities() {
        let changesets = vec![
            plain("c1", "ann", 1, &["A", "B"]),
            plain("c2", "ann", 2, &["A", "B", "C"]),
            plain("c3", "ann", 3, &["B"]),
        ];
        let pairs = analyze_coupling(&changesets, &opts(2, 10)).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].entity, "A");
        assert_eq!(pairs[0].coupled, "B");
    }

    #[test]
    fn degree_bounds_use_rounded_percentage() {
        let changesets = vec![
            plain("c1", "ann", 1, &["A", "B"]),
            plain("c2", "ann", 2, &["A", "B"]),
            plain("c3", "ann", 3, &["A"]),
            plain("c4", "ann", 4, &["B", "C"]),
        ];
        // A-B is 2/3 = 66.7%, reported as 67; B-C is 100%.
        let options = CouplingOptions {
            min_coupling: 67,
            max_coupling: 99,
            ..opts(1, 10)
        };
        let pairs = analyze_coupling(&changesets, &options).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].entity, "A");
        assert_eq!(pairs[0].degree, 67);
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        let err = analyze_coupling(
            &[],
            &CouplingOptions {
                min_coupling: 80,
                max_coupling: 50,
                ..CouplingOptions::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        let err = analyze_coupling(&[], &opts(1, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        let err = analyze_coupling(
            &[],
            &CouplingOptions {
                max_coupling: 101,
                ..CouplingOptions::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_coupling"));
    }

    #[test]
    fn sum_of_coupling_counts_partners() {
        let changesets = vec![
            plain("c1", "ann", 1, &["A", "B"]),
            plain("c2", "ann", 2, &["A", "B", "C"]),
            plain("c3", "ann", 3, &["B"]),
        ];
        let rows = sum_of_coupling(&changesets, 10).unwrap();
        let soc: Vec<_> = rows.iter().map(|r| (r.entity.as_str(), r.soc)).collect();
        assert_eq!(soc, vec![("A", 3), ("B", 3), ("C", 2)]);
    }
}
