//! Log grammars.
//!
//! One tokenizer per supported layout, all producing the same ordered
//! [`Revision`] sequence. Dispatch is a plain match on [`VcsFormat`].
//!
//! Failure policy shared by every grammar: a malformed commit header aborts
//! the whole parse with [`CoevoError::Parse`]; a file-change line that cannot
//! be tokenized is skipped and recorded as a [`MiningWarning::SkippedLine`].

mod git;
mod hg;
mod p4;
mod svn;
mod tfs;

use chrono::NaiveDate;
use coevo_core::{CoevoError, VcsFormat};

use crate::mining::{LineCounts, MiningWarning, Revision};

/// Raw output of a grammar: revisions in log order plus skipped-line warnings.
#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    /// One record per file touched per commit, in encounter order.
    pub revisions: Vec<Revision>,
    /// Lines that were skipped as noise.
    pub warnings: Vec<MiningWarning>,
}

/// Fields every commit header yields.
#[derive(Debug, Clone)]
pub(crate) struct CommitHeader {
    pub id: String,
    pub author: String,
    pub date: NaiveDate,
    pub message: Option<String>,
    /// 1-based line of the header.
    pub line: usize,
}

impl ParsedLog {
    /// Record one file change under `header`.
    pub(crate) fn push_change(
        &mut self,
        header: &CommitHeader,
        raw_path: &str,
        lines: Option<LineCounts>,
    ) {
        let entity = normalize_entity(raw_path);
        if entity.is_empty() {
            return;
        }
        self.revisions.push(Revision {
            entity,
            revision_id: header.id.clone(),
            author: header.author.clone(),
            date: header.date,
            message: header.message.clone(),
            lines,
            line: header.line,
        });
    }

    /// Record a noise line that carried no usable file change.
    pub(crate) fn skip(&mut self, format: VcsFormat, line: usize, text: &str) {
        tracing::warn!(%format, line, text, "skipping unrecognized log line");
        self.warnings.push(MiningWarning::SkippedLine {
            line,
            text: text.to_string(),
        });
    }
}

/// Parse `text` with the grammar for `format`.
///
/// # Errors
///
/// Returns [`CoevoError::Parse`] at the first malformed commit header.
///
/// # Examples
///
/// ```
/// use coevo_core::VcsFormat;
/// use coevo_history::grammar::parse_log;
///
/// let log = "--a1b2c3d--2024-03-01--alice\n12\t3\tsrc/main.rs\n-\t-\tlogo.png\n";
/// let parsed = parse_log(log, VcsFormat::Git2).unwrap();
/// assert_eq!(parsed.revisions.len(), 2);
/// assert!(parsed.revisions[1].lines.is_none());
/// ```
pub fn parse_log(text: &str, format: VcsFormat) -> Result<ParsedLog, CoevoError> {
    let parsed = match format {
        VcsFormat::Git => git::parse_git(text)?,
        VcsFormat::Git2 => git::parse_git2(text)?,
        VcsFormat::Svn => svn::parse(text)?,
        VcsFormat::Hg => hg::parse(text)?,
        VcsFormat::P4 => p4::parse(text)?,
        VcsFormat::Tfs => tfs::parse(text)?,
    };
    tracing::debug!(
        %format,
        revisions = parsed.revisions.len(),
        skipped = parsed.warnings.len(),
        "parsed log"
    );
    Ok(parsed)
}

/// Normalize a path as it appears in a log into an entity name.
///
/// Backslashes become slashes, drive letters and a leading `./` are
/// stripped, surrounding whitespace is trimmed. Case is preserved.
///
/// # Examples
///
/// ```
/// use coevo_history::grammar::normalize_entity;
///
/// assert_eq!(normalize_entity(" C:\\src\\Main.cs "), "src/Main.cs");
/// assert_eq!(normalize_entity("./lib/a.rs"), "lib/a.rs");
/// ```
pub fn normalize_entity(raw: &str) -> String {
    let mut path = raw.trim().replace('\\', "/");
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        path = path[2..].trim_start_matches('/').to_string();
    }
    while let Some(rest) = path.strip_prefix("./") {
        path = rest.to_string();
    }
    path
}

/// Normalize an author identity. Distinct display names are never merged.
pub fn normalize_author(raw: &str) -> String {
    raw.trim().to_string()
}

/// Parse an ISO `YYYY-MM-DD` prefix, ignoring any time component.
pub(crate) fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// The raw text of 1-based `line` in `text`, for error reporting.
pub(crate) fn line_at(text: &str, line: usize) -> String {
    text.lines()
        .nth(line.saturating_sub(1))
        .unwrap_or_default()
        .to_string()
}
