//! Log mining: revision records and the end-to-end ingestion pass.
//!
//! Reads a log once, parses it with the grammar for its format, applies
//! team and layer mappings, and groups the revisions into changesets.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDate;
use coevo_core::{CoevoError, VcsFormat};
use serde::Serialize;

use crate::changeset::{build_changesets, entity_stats, Changeset, EntityStats, Grouping};
use crate::grammar::{self, ParsedLog};
use crate::layers::{LayerMap, TeamMap};

/// Added and deleted line counts for one file in one commit.
///
/// # Examples
///
/// ```
/// use coevo_history::mining::LineCounts;
///
/// let counts = LineCounts { added: 10, deleted: 3 };
/// assert_eq!(counts.total(), 13);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineCounts {
    /// Lines added.
    pub added: u64,
    /// Lines deleted.
    pub deleted: u64,
}

impl LineCounts {
    /// `added + deleted`.
    pub fn total(self) -> u64 {
        self.added + self.deleted
    }
}

/// One file touched in one commit.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use coevo_history::mining::{LineCounts, Revision};
///
/// let rev = Revision {
///     entity: "src/main.rs".into(),
///     revision_id: "abc123".into(),
///     author: "alice".into(),
///     date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
///     message: None,
///     lines: Some(LineCounts { added: 4, deleted: 1 }),
///     line: 1,
/// };
/// assert_eq!(rev.entity, "src/main.rs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    /// Normalized path.
    pub entity: String,
    /// VCS-native commit identifier; never assumed numeric or ordered.
    pub revision_id: String,
    /// Normalized author identity.
    pub author: String,
    /// Commit date, truncated to the day.
    pub date: NaiveDate,
    /// Commit message when the format carries one.
    pub message: Option<String>,
    /// Line counts, `None` for binary files or formats without stats.
    pub lines: Option<LineCounts>,
    /// 1-based line of the commit header in the log.
    pub line: usize,
}

/// A non-fatal condition met while mining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MiningWarning {
    /// A file-change line that could not be tokenized.
    SkippedLine {
        /// 1-based line number.
        line: usize,
        /// The raw line.
        text: String,
    },
    /// No revisions survived parsing and filtering; analyses return empty tables.
    EmptyLog,
}

impl fmt::Display for MiningWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiningWarning::SkippedLine { line, text } => {
                write!(f, "line {line}: skipped {text:?}")
            }
            MiningWarning::EmptyLog => write!(f, "log contains no revisions"),
        }
    }
}

/// Options for log mining.
///
/// # Examples
///
/// ```
/// use coevo_history::changeset::Grouping;
/// use coevo_history::mining::MiningOptions;
///
/// let opts = MiningOptions::default();
/// assert_eq!(opts.grouping, Grouping::Auto);
/// assert!(opts.layers.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    /// How revisions are grouped into changesets.
    pub grouping: Grouping,
    /// Map entities onto architectural layers, dropping unmapped ones.
    pub layers: Option<LayerMap>,
    /// Map authors onto teams.
    pub teams: Option<TeamMap>,
}

/// An immutable, fully validated snapshot of a mined log.
///
/// Entity statistics are derived on first use and shared by every
/// analysis run against the snapshot.
#[derive(Debug)]
pub struct MinedLog {
    format: VcsFormat,
    changesets: Vec<Changeset>,
    warnings: Vec<MiningWarning>,
    stats: OnceLock<BTreeMap<String, EntityStats>>,
}

impl MinedLog {
    /// Wrap already-built changesets.
    pub fn new(format: VcsFormat, changesets: Vec<Changeset>, warnings: Vec<MiningWarning>) -> Self {
        Self {
            format,
            changesets,
            warnings,
            stats: OnceLock::new(),
        }
    }

    /// The grammar the log was parsed with.
    pub fn format(&self) -> VcsFormat {
        self.format
    }

    /// Changesets in order of first appearance.
    pub fn changesets(&self) -> &[Changeset] {
        &self.changesets
    }

    /// Skipped lines and the empty-log marker.
    pub fn warnings(&self) -> &[MiningWarning] {
        &self.warnings
    }

    /// Whether no changeset survived mining.
    pub fn is_empty(&self) -> bool {
        self.changesets.is_empty()
    }

    /// Per-entity aggregates over every changeset.
    pub fn entity_stats(&self) -> &BTreeMap<String, EntityStats> {
        self.stats.get_or_init(|| entity_stats(&self.changesets))
    }

    /// The most recent changeset date anywhere in the log.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.changesets.iter().map(|c| c.date).max()
    }
}

/// Mine the log file at `path`.
///
/// The file is read once up front; invalid UTF-8 is replaced rather than
/// rejected.
///
/// # Errors
///
/// Returns [`CoevoError::FileNotFound`] if `path` does not exist,
/// [`CoevoError::Io`] if it cannot be read, and everything
/// [`mine_str`] returns.
pub fn mine_log(
    path: &Path,
    format: VcsFormat,
    options: &MiningOptions,
) -> Result<MinedLog, CoevoError> {
    if !path.exists() {
        return Err(CoevoError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "read log");
    mine_str(&text, format, options)
}

/// Mine an in-memory log.
///
/// # Errors
///
/// Returns [`CoevoError::Parse`] if any commit header is malformed or a
/// commit id reappears with a different author or date. No partial model
/// is returned.
///
/// # Examples
///
/// ```
/// use coevo_core::VcsFormat;
/// use coevo_history::mining::{mine_str, MiningOptions};
///
/// let log = "--a1--2024-03-01--alice\n1\t0\ta.rs\n2\t2\tb.rs\n\n--b2--2024-03-02--bob\n5\t1\ta.rs\n";
/// let mined = mine_str(log, VcsFormat::Git2, &MiningOptions::default()).unwrap();
/// assert_eq!(mined.changesets().len(), 2);
/// assert_eq!(mined.entity_stats()["a.rs"].revisions, 2);
/// ```
pub fn mine_str(
    text: &str,
    format: VcsFormat,
    options: &MiningOptions,
) -> Result<MinedLog, CoevoError> {
    let ParsedLog {
        mut revisions,
        mut warnings,
    } = grammar::parse_log(text, format)?;

    if let Some(teams) = &options.teams {
        for rev in &mut revisions {
            if let Some(team) = teams.team_of(&rev.author) {
                rev.author = team.to_string();
            }
        }
    }

    if let Some(layers) = &options.layers {
        revisions.retain_mut(|rev| match layers.layer_of(&rev.entity) {
            Some(layer) => {
                rev.entity = layer.to_string();
                true
            }
            None => false,
        });
    }

    if revisions.is_empty() {
        tracing::warn!(%format, "log contains no revisions");
        warnings.push(MiningWarning::EmptyLog);
    }

    let changesets = build_changesets(revisions, format, options.grouping)?;
    tracing::debug!(%format, changesets = changesets.len(), "mined log");

    Ok(MinedLog::new(format, changesets, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coevo_core::ErrorKind;

    const LOG: &str = "\
--a1--2024-03-01--alice
1\t0\tsrc/a.rs
2\t2\tsrc/b.rs

--b2--2024-03-05--bob
5\t1\tsrc/a.rs
-\t-\tassets/logo.png
";

    #[test]
    fn mining_options_defaults_are_correct() {
        let opts = MiningOptions::default();
        assert_eq!(opts.grouping, Grouping::Auto);
        assert!(opts.layers.is_none());
        assert!(opts.teams.is_none());
    }

    #[test]
    fn mines_changesets_and_stats() {
        let mined = mine_str(LOG, VcsFormat::Git2, &MiningOptions::default()).unwrap();
        assert_eq!(mined.format(), VcsFormat::Git2);
        assert_eq!(mined.changesets().len(), 2);
        assert!(mined.warnings().is_empty());
        assert_eq!(
            mined.latest_date(),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        let stats = mined.entity_stats();
        assert_eq!(stats["src/a.rs"].revisions, 2);
        assert_eq!(stats["assets/logo.png"].revisions, 1);
    }

    #[test]
    fn empty_log_is_a_warning_not_an_error() {
        let mined = mine_str("", VcsFormat::Git, &MiningOptions::default()).unwrap();
        assert!(mined.is_empty());
        assert_eq!(mined.warnings(), &[MiningWarning::EmptyLog]);
        assert!(mined.latest_date().is_none());
    }

    #[test]
    fn teams_replace_authors() {
        let options = MiningOptions {
            teams: Some(TeamMap::parse("alice,Core\n").unwrap()),
            ..MiningOptions::default()
        };
        let mined = mine_str(LOG, VcsFormat::Git2, &options).unwrap();
        assert_eq!(mined.changesets()[0].author, "Core");
        assert_eq!(mined.changesets()[1].author, "bob");
    }

    #[test]
    fn layers_collapse_and_drop_entities() {
        let options = MiningOptions {
            layers: Some(LayerMap::parse("src => Code\n").unwrap()),
            ..MiningOptions::default()
        };
        let mined = mine_str(LOG, VcsFormat::Git2, &options).unwrap();
        let first: Vec<_> = mined.changesets()[0].entities().collect();
        assert_eq!(first, vec!["Code"]);
        assert_eq!(mined.changesets()[0].changes[0].lines, Some(LineCounts { added: 3, deleted: 2 }));
        assert!(mined.entity_stats().get("assets/logo.png").is_none());
    }

    #[test]
    fn layers_matching_nothing_leave_an_empty_log() {
        let options = MiningOptions {
            layers: Some(LayerMap::parse("lib => Lib\n").unwrap()),
            ..MiningOptions::default()
        };
        let mined = mine_str(LOG, VcsFormat::Git2, &options).unwrap();
        assert!(mined.is_empty());
        assert_eq!(mined.warnings(), &[MiningWarning::EmptyLog]);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = mine_log(
            Path::new("/nonexistent/coevo/history.log"),
            VcsFormat::Git2,
            &MiningOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(matches!(err, CoevoError::FileNotFound(_)));
    }

    #[test]
    fn warning_display() {
        let w = MiningWarning::SkippedLine {
            line: 3,
            text: "noise".into(),
        };
        assert_eq!(w.to_string(), "line 3: skipped \"noise\"");
    }
}
