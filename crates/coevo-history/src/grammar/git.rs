//! Git grammars.
//!
//! `git` headers look like `[990442e] Ada Lovelace 2013-11-10 Subject line`,
//! `git2` headers like `--990442e--2013-11-10--Ada Lovelace`. Both are
//! followed by `--numstat` lines: `added<TAB>deleted<TAB>path`, with `-`
//! counts for binary files.

use chrono::NaiveDate;
use coevo_core::{CoevoError, VcsFormat};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{normalize_author, CommitHeader, ParsedLog};
use crate::mining::LineCounts;

static GIT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([^\]\s]+)\]\s+(.+?)\s+(\d{4}-\d{2}-\d{2})(?:\s+(.*))?$")
        .expect("git header regex")
});

static GIT2_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^--([^-\s]+)--(\d{4}-\d{2}-\d{2})--(.+)$").expect("git2 header regex")
});

pub(crate) fn parse_git(text: &str) -> Result<ParsedLog, CoevoError> {
    parse_numstat_log(text, VcsFormat::Git, |line, line_no| {
        if !line.starts_with('[') {
            return Ok(None);
        }
        let caps = GIT_HEADER.captures(line).ok_or_else(|| {
            CoevoError::parse(
                VcsFormat::Git,
                line_no,
                line,
                "expected `[hash] author YYYY-MM-DD subject`",
            )
        })?;
        let message = caps
            .get(4)
            .map(|m| m.as_str().trim().to_string())
            .filter(|m| !m.is_empty());
        header(VcsFormat::Git, line, line_no, &caps[1], &caps[2], &caps[3], message).map(Some)
    })
}

pub(crate) fn parse_git2(text: &str) -> Result<ParsedLog, CoevoError> {
    parse_numstat_log(text, VcsFormat::Git2, |line, line_no| {
        if !line.starts_with("--") {
            return Ok(None);
        }
        let caps = GIT2_HEADER.captures(line).ok_or_else(|| {
            CoevoError::parse(
                VcsFormat::Git2,
                line_no,
                line,
                "expected `--hash--YYYY-MM-DD--author`",
            )
        })?;
        header(VcsFormat::Git2, line, line_no, &caps[1], &caps[3], &caps[2], None).map(Some)
    })
}

/// Shared driver: `recognize` returns `Ok(Some(_))` for a header line,
/// `Ok(None)` for anything that is not a header, and an error for a line
/// that claims to be a header but is malformed.
fn parse_numstat_log<F>(text: &str, format: VcsFormat, recognize: F) -> Result<ParsedLog, CoevoError>
where
    F: Fn(&str, usize) -> Result<Option<CommitHeader>, CoevoError>,
{
    let mut parsed = ParsedLog::default();
    let mut current: Option<CommitHeader> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if let Some(header) = recognize(line, line_no)? {
            current = Some(header);
            continue;
        }

        match (&current, parse_numstat(line)) {
            (Some(header), Some((lines, path))) => {
                parsed.push_change(header, &resolve_rename(path), lines);
            }
            _ => parsed.skip(format, line_no, line),
        }
    }

    Ok(parsed)
}

fn header(
    format: VcsFormat,
    line: &str,
    line_no: usize,
    id: &str,
    author: &str,
    date: &str,
    message: Option<String>,
) -> Result<CommitHeader, CoevoError> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| CoevoError::parse(format, line_no, line, format!("invalid date: {e}")))?;
    let author = normalize_author(author);
    if author.is_empty() {
        return Err(CoevoError::parse(format, line_no, line, "missing author"));
    }
    Ok(CommitHeader {
        id: id.to_string(),
        author,
        date,
        message,
        line: line_no,
    })
}

/// Split a numstat line into its counts and path.
///
/// `-\t-\tpath` (binary) yields `None` counts; anything that is not three
/// tab-separated fields with numeric or `-` counts is rejected.
fn parse_numstat(line: &str) -> Option<(Option<LineCounts>, &str)> {
    let mut parts = line.splitn(3, '\t');
    let added = parts.next()?.trim();
    let deleted = parts.next()?.trim();
    let path = parts.next()?.trim();
    if path.is_empty() {
        return None;
    }
    if added == "-" && deleted == "-" {
        return Some((None, path));
    }
    let counts = LineCounts {
        added: added.parse().ok()?,
        deleted: deleted.parse().ok()?,
    };
    Some((Some(counts), path))
}

/// Resolve numstat rename notation to the new path.
///
/// `src/{old => new}/a.rs` becomes `src/new/a.rs`; `old.rs => new.rs`
/// becomes `new.rs`. The old name stays a distinct entity.
fn resolve_rename(path: &str) -> String {
    if let (Some(open), Some(close)) = (path.find('{'), path.rfind('}')) {
        if open < close {
            let inner = &path[open + 1..close];
            if let Some((_, new)) = inner.split_once(" => ") {
                let joined = format!("{}{}{}", &path[..open], new, &path[close + 1..]);
                return joined.replace("//", "/");
            }
        }
    }
    match path.split_once(" => ") {
        Some((_, new)) => new.to_string(),
        None => path.to_string(),
    }
}
