//! Team Foundation grammar for `tf hist /format:detailed /recursive`.
//!
//! ```text
//! -------------------------------------------------------------
//! Changeset: 9
//! User: Ada Lovelace
//! Date: Friday, June 4, 2010 8:34:32 AM
//!
//! Comment:
//!   Fixed bug
//!
//! Items:
//!   edit $/Project/Module/File.cs
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use coevo_core::{CoevoError, VcsFormat};

use super::{line_at, normalize_author, CommitHeader, ParsedLog};

const DATETIME_FORMATS: &[&str] = &[
    "%A, %B %d, %Y %I:%M:%S %p",
    "%B %d, %Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%A, %B %d, %Y", "%B %d, %Y", "%m/%d/%Y", "%Y-%m-%d"];

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Header,
    Comment,
    Items,
    Other,
}

struct Record {
    id: String,
    line: usize,
    author: Option<String>,
    date: Option<NaiveDate>,
    comment: Vec<String>,
    header: Option<CommitHeader>,
}

impl Record {
    /// The resolved header, built once the author and date lines have been seen.
    fn header(&mut self, text: &str) -> Result<&CommitHeader, CoevoError> {
        let header = match self.header.take() {
            Some(header) => header,
            None => self.resolve(text)?,
        };
        Ok(self.header.insert(header))
    }

    fn resolve(&self, text: &str) -> Result<CommitHeader, CoevoError> {
        let malformed = |message: &str| {
            CoevoError::parse(VcsFormat::Tfs, self.line, line_at(text, self.line), message)
        };
        let author = self
            .author
            .clone()
            .ok_or_else(|| malformed("changeset without a User line"))?;
        let date = self
            .date
            .ok_or_else(|| malformed("changeset without a Date line"))?;
        Ok(CommitHeader {
            id: self.id.clone(),
            author,
            date,
            message: Some(self.comment.join(" ")).filter(|m| !m.is_empty()),
            line: self.line,
        })
    }
}

pub(crate) fn parse(text: &str) -> Result<ParsedLog, CoevoError> {
    let mut parsed = ParsedLog::default();
    let mut record: Option<Record> = None;
    let mut section = Section::Other;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Separators start at column 0; indented dashes belong to a comment.
        if !line.starts_with(char::is_whitespace) && trimmed.chars().all(|c| c == '-') {
            finish(&mut record, text)?;
            section = Section::Other;
            continue;
        }

        if let Some(id) = trimmed.strip_prefix("Changeset:") {
            finish(&mut record, text)?;
            let id = id.trim();
            if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
                return Err(CoevoError::parse(
                    VcsFormat::Tfs,
                    line_no,
                    line,
                    "expected a numeric changeset id",
                ));
            }
            record = Some(Record {
                id: id.to_string(),
                line: line_no,
                author: None,
                date: None,
                comment: Vec::new(),
                header: None,
            });
            section = Section::Header;
            continue;
        }

        let Some(current) = record.as_mut() else {
            parsed.skip(VcsFormat::Tfs, line_no, line);
            continue;
        };

        if section == Section::Header || !line.starts_with(char::is_whitespace) {
            if let Some(user) = trimmed.strip_prefix("User:") {
                let author = normalize_author(user);
                if author.is_empty() {
                    return Err(CoevoError::parse(VcsFormat::Tfs, line_no, line, "empty User"));
                }
                current.author = Some(author);
                continue;
            }
            if let Some(raw) = trimmed.strip_prefix("Date:") {
                let date = parse_date(raw).ok_or_else(|| {
                    CoevoError::parse(VcsFormat::Tfs, line_no, line, "unrecognized date")
                })?;
                current.date = Some(date);
                continue;
            }
            match trimmed {
                "Comment:" => {
                    section = Section::Comment;
                    continue;
                }
                "Items:" => {
                    current.header(text)?;
                    section = Section::Items;
                    continue;
                }
                _ if trimmed.ends_with(':') && !line.starts_with(char::is_whitespace) => {
                    section = Section::Other;
                    continue;
                }
                _ => {}
            }
        }

        match section {
            Section::Comment => current.comment.push(trimmed.to_string()),
            Section::Items => match trimmed.find("$/") {
                Some(start) => {
                    let header = current.header(text)?;
                    parsed.push_change(header, &trimmed[start..], None);
                }
                None => parsed.skip(VcsFormat::Tfs, line_no, line),
            },
            Section::Header => parsed.skip(VcsFormat::Tfs, line_no, line),
            Section::Other => {}
        }
    }

    finish(&mut record, text)?;
    Ok(parsed)
}

/// Close the current record, validating its header even if it listed no items.
fn finish(record: &mut Option<Record>, text: &str) -> Result<(), CoevoError> {
    if let Some(mut done) = record.take() {
        done.header(text)?;
    }
    Ok(())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use coevo_core::ErrorKind;

    const LOG: &str = "\
-----------------------------------------------------------------------------
Changeset: 9
User: Ada Lovelace
Date: Friday, June 4, 2010 8:34:32 AM

Comment:
  Fixed bug in the
  connection pool

Items:
  edit $/Project/Module/File.cs
  add, edit $/Project/Module/New File.cs

Check-in Notes:
  Code Reviewer:
  Performance Reviewer:
-----------------------------------------------------------------------------
Changeset: 8
User: Grace Hopper
Date: 2010-06-03 10:00:00

Items:
  add $/Project/README.md
";

    #[test]
    fn parses_detailed_history() {
        let parsed = parse(LOG).unwrap();
        assert_eq!(parsed.revisions.len(), 3);
        let first = &parsed.revisions[0];
        assert_eq!(first.revision_id, "9");
        assert_eq!(first.author, "Ada Lovelace");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2010, 6, 4).unwrap());
        assert_eq!(first.entity, "$/Project/Module/File.cs");
        assert_eq!(
            first.message.as_deref(),
            Some("Fixed bug in the connection pool")
        );
        assert_eq!(first.line, 2);
        assert_eq!(parsed.revisions[1].entity, "$/Project/Module/New File.cs");
        assert_eq!(parsed.revisions[2].author, "Grace Hopper");
        assert!(parsed.revisions[2].message.is_none());
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
    }

    #[test]
    fn date_formats() {
        let june4 = NaiveDate::from_ymd_opt(2010, 6, 4).unwrap();
        assert_eq!(parse_date("Friday, June 4, 2010 8:34:32 AM"), Some(june4));
        assert_eq!(parse_date("6/4/2010 8:34:32 PM"), Some(june4));
        assert_eq!(parse_date("2010-06-04"), Some(june4));
        assert_eq!(parse_date("sometime"), None);
    }

    #[test]
    fn missing_user_is_fatal_at_changeset_line() {
        let log = "Changeset: 3\nDate: 2010-06-03\nItems:\n  edit $/P/a.cs\n";
        let err = parse(log).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn non_numeric_changeset_is_fatal() {
        let err = parse("Changeset: nine\n").unwrap_err();
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn unparseable_date_is_fatal() {
        let err = parse("Changeset: 1\nUser: ada\nDate: the other day\n").unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn indented_dashes_in_a_comment_do_not_end_the_record() {
        let log = "\
-----------------------------------------------------------------------------
Changeset: 9
User: Ada Lovelace
Date: 2010-06-04 08:34:32

Comment:
  Summary of the change
  -------
  Details below the rule

Items:
  edit $/Project/A.cs
  edit $/Project/B.cs
";
        let parsed = parse(log).unwrap();
        assert_eq!(parsed.revisions.len(), 2, "{:?}", parsed.warnings);
        assert!(parsed.warnings.is_empty());
        assert_eq!(
            parsed.revisions[0].message.as_deref(),
            Some("Summary of the change ------- Details below the rule")
        );
    }

    #[test]
    fn item_without_server_path_is_skipped() {
        let log = "Changeset: 1\nUser: ada\nDate: 2010-06-03\nItems:\n  edit local.cs\n  edit $/P/a.cs\n";
        let parsed = parse(log).unwrap();
        assert_eq!(parsed.revisions.len(), 1);
        assert_eq!(parsed.warnings.len(), 1);
    }
}
