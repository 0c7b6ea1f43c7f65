use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoevoError;

/// The closed set of log grammars the miner understands.
///
/// Each variant names the log layout produced by one VCS invocation:
/// - `git`: `git log --pretty=format:'[%h] %aN %ad %s' --date=short --numstat`
/// - `git2`: `git log --pretty=format:'--%h--%ad--%aN' --date=short --numstat --no-renames`
/// - `svn`: `svn log -v --xml`
/// - `hg`: `hg log --template "rev: {rev} author: {author} date: {date|shortdate} files:\n{files %'{file}\n'}\n"`
/// - `p4`: concatenated `p4 describe -s` output, one blank line between changes
/// - `tfs`: `tf hist /format:detailed /recursive`
///
/// # Examples
///
/// ```
/// use coevo_core::VcsFormat;
///
/// let fmt: VcsFormat = "git2".parse().unwrap();
/// assert_eq!(fmt, VcsFormat::Git2);
/// assert!(fmt.has_line_counts());
/// assert!("cvs".parse::<VcsFormat>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsFormat {
    /// Git log with bracketed short hash, author, date, and subject.
    Git,
    /// Compact git log with `--hash--date--author` headers.
    Git2,
    /// Subversion verbose XML log.
    Svn,
    /// Mercurial templated log.
    Hg,
    /// Perforce change descriptions.
    P4,
    /// Team Foundation detailed history.
    Tfs,
}

impl VcsFormat {
    /// Every supported format, in documentation order.
    pub const ALL: [VcsFormat; 6] = [
        VcsFormat::Git,
        VcsFormat::Git2,
        VcsFormat::Svn,
        VcsFormat::Hg,
        VcsFormat::P4,
        VcsFormat::Tfs,
    ];

    /// Whether the grammar carries a commit identifier in every header.
    ///
    /// Changesets are grouped by `(author, date)` when it does not.
    pub fn has_native_ids(self) -> bool {
        true
    }

    /// Whether file-change lines carry added/deleted line counts.
    pub fn has_line_counts(self) -> bool {
        matches!(self, VcsFormat::Git | VcsFormat::Git2)
    }

    /// Whether commit headers carry a message.
    pub fn has_messages(self) -> bool {
        matches!(
            self,
            VcsFormat::Git | VcsFormat::Svn | VcsFormat::P4 | VcsFormat::Tfs
        )
    }
}

impl fmt::Display for VcsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VcsFormat::Git => "git",
            VcsFormat::Git2 => "git2",
            VcsFormat::Svn => "svn",
            VcsFormat::Hg => "hg",
            VcsFormat::P4 => "p4",
            VcsFormat::Tfs => "tfs",
        };
        f.write_str(name)
    }
}

impl FromStr for VcsFormat {
    type Err = CoevoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "git" => Ok(VcsFormat::Git),
            "git2" => Ok(VcsFormat::Git2),
            "svn" => Ok(VcsFormat::Svn),
            "hg" => Ok(VcsFormat::Hg),
            "p4" => Ok(VcsFormat::P4),
            "tfs" => Ok(VcsFormat::Tfs),
            _ => Err(CoevoError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Output format for rendered result tables.
///
/// # Examples
///
/// ```
/// use coevo_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain-text columns.
    #[default]
    Text,
    /// Machine-readable JSON records with kebab-case keys.
    Json,
    /// Markdown tables.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
