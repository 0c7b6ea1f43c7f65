//! Commit message matching per entity.

use std::collections::BTreeMap;

use coevo_core::CoevoError;
use regex::Regex;
use serde::Serialize;

use crate::changeset::Changeset;
use crate::table::{Cell, TableRow};

/// How often an entity was changed by a matching commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MessageMatches {
    /// Entity path.
    pub entity: String,
    /// Changesets whose message matched.
    pub matches: u32,
}

impl TableRow for MessageMatches {
    const COLUMNS: &'static [&'static str] = &["entity", "matches"];

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::from(&self.entity), Cell::from(self.matches)]
    }
}

/// Count, per entity, the changesets whose message matches `expression`.
///
/// Changesets without a message never match. Entities without a match are
/// left out; the rest are sorted by match count descending, then name.
///
/// # Errors
///
/// Returns [`CoevoError::InvalidParameter`] if `expression` is empty or not
/// a valid regular expression.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use coevo_history::changeset::{Changeset, EntityChange};
/// use coevo_history::messages::analyze_messages;
///
/// let changesets = vec![Changeset {
///     id: "c1".into(),
///     author: "alice".into(),
///     date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     message: Some("Fix crash on startup".into()),
///     changes: vec![EntityChange { entity: "main.rs".into(), lines: None }],
/// }];
/// let rows = analyze_messages(&changesets, "(?i)fix").unwrap();
/// assert_eq!(rows[0].matches, 1);
/// assert!(analyze_messages(&changesets, "(").is_err());
/// ```
pub fn analyze_messages(
    changesets: &[Changeset],
    expression: &str,
) -> Result<Vec<MessageMatches>, CoevoError> {
    if expression.trim().is_empty() {
        return Err(CoevoError::invalid("expression", "must not be empty"));
    }
    let pattern = Regex::new(expression)
        .map_err(|e| CoevoError::invalid("expression", e.to_string()))?;

    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for changeset in changesets {
        let matched = changeset
            .message
            .as_deref()
            .is_some_and(|message| pattern.is_match(message));
        if !matched {
            continue;
        }
        for entity in changeset.entities() {
            *counts.entry(entity).or_default() += 1;
        }
    }

    let mut rows: Vec<MessageMatches> = counts
        .into_iter()
        .map(|(entity, matches)| MessageMatches {
            entity: entity.to_string(),
            matches,
        })
        .collect();
    rows.sort_by(|a, b| b.matches.cmp(&a.matches).then_with(|| a.entity.cmp(&b.entity)));
    Ok(rows)
}
