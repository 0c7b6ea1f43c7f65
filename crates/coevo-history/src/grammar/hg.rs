//! Mercurial grammar.
//!
//! Produced by `hg log --template "rev: {rev} author: {author} date:
//! {date|shortdate} files:\n{files %'{file}\n'}\n"`: one header line, then
//! one path per line. Older templates list the files space-separated on the
//! header line itself; both layouts are accepted. The inline list has no
//! quoting, so a path containing a space only survives in the per-line
//! layout.

use chrono::NaiveDate;
use coevo_core::{CoevoError, VcsFormat};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{normalize_author, CommitHeader, ParsedLog};

static HG_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rev:\s*(\S+)\s+author:\s*(.*?)\s+date:\s*(\S+)\s+files:(.*)$")
        .expect("hg header regex")
});

pub(crate) fn parse(text: &str) -> Result<ParsedLog, CoevoError> {
    let mut parsed = ParsedLog::default();
    let mut current: Option<CommitHeader> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with("rev:") {
            let (header, inline_files) = parse_header(line, line_no)?;
            // Space-separated, so paths with spaces split here.
            for file in inline_files.split_whitespace() {
                parsed.push_change(&header, file, None);
            }
            current = Some(header);
            continue;
        }

        match &current {
            Some(header) => parsed.push_change(header, line, None),
            None => parsed.skip(VcsFormat::Hg, line_no, line),
        }
    }

    Ok(parsed)
}

fn parse_header(line: &str, line_no: usize) -> Result<(CommitHeader, &str), CoevoError> {
    let malformed = |message: &str| CoevoError::parse(VcsFormat::Hg, line_no, line, message);

    let caps = HG_HEADER
        .captures(line)
        .ok_or_else(|| malformed("expected `rev: N author: NAME date: YYYY-MM-DD files:`"))?;
    let date = NaiveDate::parse_from_str(&caps[3], "%Y-%m-%d")
        .map_err(|e| malformed(&format!("invalid date: {e}")))?;
    let author = normalize_author(&caps[2]);
    if author.is_empty() {
        return Err(malformed("missing author"));
    }
    let inline_files = caps.get(4).map_or("", |m| m.as_str());

    Ok((
        CommitHeader {
            id: caps[1].to_string(),
            author,
            date,
            message: None,
            line: line_no,
        },
        inline_files,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coevo_core::ErrorKind;

    #[test]
    fn parses_templated_log() {
        let log = "\
rev: 33 author: Ada Lovelace <ada@example.com> date: 2012-02-19 files:
src/parsers/hg.clj
test/parsers/hg_test.clj

rev: 32 author: Grace date: 2012-02-18 files:
README.md
";
        let parsed = parse(log).unwrap();
        assert_eq!(parsed.revisions.len(), 3);
        assert_eq!(parsed.revisions[0].revision_id, "33");
        assert_eq!(parsed.revisions[0].author, "Ada Lovelace <ada@example.com>");
        assert_eq!(parsed.revisions[1].entity, "test/parsers/hg_test.clj");
        assert_eq!(parsed.revisions[2].revision_id, "32");
        assert!(parsed.revisions.iter().all(|r| r.lines.is_none()));
    }

    #[test]
    fn inline_file_list_is_accepted() {
        let parsed = parse("rev: 1 author: ada date: 2012-01-01 files: a.c b.c\n").unwrap();
        let entities: Vec<_> = parsed.revisions.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(entities, vec!["a.c", "b.c"]);
    }

    #[test]
    fn paths_with_spaces_need_the_per_line_layout() {
        let per_line = parse("rev: 1 author: ada date: 2012-01-01 files:\ndocs/User Guide.md\n").unwrap();
        assert_eq!(per_line.revisions.len(), 1);
        assert_eq!(per_line.revisions[0].entity, "docs/User Guide.md");

        let inline = parse("rev: 1 author: ada date: 2012-01-01 files: docs/User Guide.md\n").unwrap();
        let entities: Vec<_> = inline.revisions.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(entities, vec!["docs/User", "Guide.md"]);
    }

    #[test]
    fn malformed_header_is_fatal() {
        let log = "rev: 1 author: ada date: 2012-01-01 files:\na.c\nrev: 2 author: bob\n";
        let err = parse(log).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn bad_date_is_fatal() {
        let err = parse("rev: 1 author: ada date: yesterday files:\n").unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }

    #[test]
    fn paths_before_first_header_are_skipped() {
        let parsed = parse("stray.c\nrev: 1 author: ada date: 2012-01-01 files:\na.c\n").unwrap();
        assert_eq!(parsed.revisions.len(), 1);
        assert_eq!(parsed.warnings.len(), 1);
    }
}
