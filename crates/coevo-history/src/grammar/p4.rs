//! Perforce grammar.
//!
//! Input is a concatenation of `p4 describe -s <change>` outputs:
//!
//! ```text
//! Change 1234 by ada@ada-ws on 2014/02/04 15:04:21
//!
//!     Fixed the frobnicator
//!
//! Affected files ...
//!
//! ... //depot/project/src/frob.c#3 edit
//! ```

use chrono::NaiveDate;
use coevo_core::{CoevoError, VcsFormat};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{normalize_author, CommitHeader, ParsedLog};

static CHANGE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Change\s+(\d+)\s+by\s+([^@\s]+)@(\S+)\s+on\s+(\d{4}/\d{2}/\d{2})(?:\s+\d{1,2}:\d{2}:\d{2})?(?:\s+\*pending\*)?\s*$")
        .expect("p4 change header regex")
});

static AFFECTED_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\.\.\.\s+(.+?)#\d+\s+\S+\s*$").expect("p4 affected file regex")
});

enum Section {
    Description,
    Files,
}

pub(crate) fn parse(text: &str) -> Result<ParsedLog, CoevoError> {
    let mut parsed = ParsedLog::default();
    let mut current: Option<(CommitHeader, Section)> = None;
    let mut description: Vec<&str> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if line.starts_with("Change ") {
            current = Some((parse_header(line, line_no)?, Section::Description));
            description.clear();
            continue;
        }

        let Some((header, section)) = current.as_mut() else {
            parsed.skip(VcsFormat::P4, line_no, line);
            continue;
        };

        match section {
            Section::Description if trimmed.starts_with("Affected files") => {
                if !description.is_empty() {
                    header.message = Some(description.join(" "));
                }
                *section = Section::Files;
            }
            Section::Description => description.push(trimmed),
            Section::Files => match AFFECTED_FILE.captures(line) {
                Some(caps) => parsed.push_change(header, &caps[1], None),
                None => parsed.skip(VcsFormat::P4, line_no, line),
            },
        }
    }

    Ok(parsed)
}

fn parse_header(line: &str, line_no: usize) -> Result<CommitHeader, CoevoError> {
    let caps = CHANGE_HEADER.captures(line).ok_or_else(|| {
        CoevoError::parse(
            VcsFormat::P4,
            line_no,
            line,
            "expected `Change N by user@client on YYYY/MM/DD`",
        )
    })?;
    let date = NaiveDate::parse_from_str(&caps[4], "%Y/%m/%d").map_err(|e| {
        CoevoError::parse(VcsFormat::P4, line_no, line, format!("invalid date: {e}"))
    })?;

    Ok(CommitHeader {
        id: caps[1].to_string(),
        author: normalize_author(&caps[2]),
        date,
        message: None,
        line: line_no,
    })
}
