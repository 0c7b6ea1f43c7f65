//! Subversion grammar for `svn log -v --xml`.
//!
//! The XML is scanned with a small tag tokenizer that tracks line numbers;
//! only the elements a log entry carries are interpreted:
//!
//! ```text
//! <logentry revision="2">
//!   <author>ada</author>
//!   <date>2013-02-08T11:46:13.844538Z</date>
//!   <paths><path kind="file" action="M">/trunk/src/a.c</path></paths>
//!   <msg>Fix</msg>
//! </logentry>
//! ```
//!
//! Subversion records no line counts, and directory paths are not entities.

use coevo_core::{CoevoError, VcsFormat};

use super::{line_at, normalize_author, parse_iso_date, CommitHeader, ParsedLog};

/// Author recorded for anonymous commits, as `svn log` prints it.
const NO_AUTHOR: &str = "(no author)";

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Open {
        name: &'a str,
        attrs: Vec<(&'a str, String)>,
        self_closing: bool,
        line: usize,
    },
    Close {
        name: &'a str,
    },
    Text(&'a str),
}

#[derive(Default)]
struct Entry {
    revision: String,
    line: usize,
    author: Option<String>,
    date: Option<String>,
    message: Option<String>,
    paths: Vec<(String, usize)>,
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Author,
    Date,
    Msg,
    Path { is_dir: bool, line: usize },
}

pub(crate) fn parse(text: &str) -> Result<ParsedLog, CoevoError> {
    let mut parsed = ParsedLog::default();
    let mut entry: Option<Entry> = None;
    let mut field: Option<(Field, String)> = None;

    for token in tokenize(text)? {
        match token {
            Token::Open {
                name: "logentry",
                attrs,
                line,
                ..
            } => {
                let revision = attr(&attrs, "revision")
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| {
                        CoevoError::parse(
                            VcsFormat::Svn,
                            line,
                            line_at(text, line),
                            "logentry without a revision attribute",
                        )
                    })?;
                entry = Some(Entry {
                    revision: revision.trim().to_string(),
                    line,
                    ..Entry::default()
                });
            }
            Token::Open {
                name,
                attrs,
                self_closing: false,
                line,
            } if entry.is_some() => {
                field = match name {
                    "author" => Some((Field::Author, String::new())),
                    "date" => Some((Field::Date, String::new())),
                    "msg" => Some((Field::Msg, String::new())),
                    "path" => {
                        let is_dir = attr(&attrs, "kind").is_some_and(|k| k == "dir");
                        Some((Field::Path { is_dir, line }, String::new()))
                    }
                    _ => field,
                };
            }
            Token::Text(chunk) => {
                if let Some((_, buf)) = field.as_mut() {
                    buf.push_str(&unescape(chunk));
                }
            }
            Token::Close { name: "logentry" } => {
                if let Some(done) = entry.take() {
                    push_entry(&mut parsed, text, done)?;
                }
                field = None;
            }
            Token::Close { name } => {
                let Some(current) = entry.as_mut() else {
                    continue;
                };
                let Some((kind, value)) = field.take_if(|(kind, _)| closes(*kind, name)) else {
                    continue;
                };
                match kind {
                    Field::Author => current.author = Some(value),
                    Field::Date => current.date = Some(value),
                    Field::Msg => current.message = Some(value.trim().to_string()),
                    Field::Path { is_dir: true, .. } => {}
                    Field::Path { is_dir: false, line } => current.paths.push((value, line)),
                }
            }
            Token::Open { .. } => {}
        }
    }

    if let Some(open) = entry {
        return Err(CoevoError::parse(
            VcsFormat::Svn,
            open.line,
            line_at(text, open.line),
            "unterminated logentry",
        ));
    }

    Ok(parsed)
}

fn closes(kind: Field, name: &str) -> bool {
    matches!(
        (kind, name),
        (Field::Author, "author")
            | (Field::Date, "date")
            | (Field::Msg, "msg")
            | (Field::Path { .. }, "path")
    )
}

fn push_entry(parsed: &mut ParsedLog, text: &str, entry: Entry) -> Result<(), CoevoError> {
    let malformed = |message: &str| {
        CoevoError::parse(VcsFormat::Svn, entry.line, line_at(text, entry.line), message)
    };

    let author = entry
        .author
        .as_deref()
        .map(normalize_author)
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| NO_AUTHOR.to_string());
    let raw_date = entry
        .date
        .as_deref()
        .ok_or_else(|| malformed("logentry without a date"))?;
    let date = parse_iso_date(raw_date)
        .ok_or_else(|| malformed(&format!("invalid date {raw_date:?}")))?;

    let header = CommitHeader {
        id: entry.revision.clone(),
        author,
        date,
        message: entry.message.clone().filter(|m| !m.is_empty()),
        line: entry.line,
    };
    for (path, line) in &entry.paths {
        if path.trim().is_empty() {
            parsed.skip(VcsFormat::Svn, *line, &line_at(text, *line));
            continue;
        }
        parsed.push_change(&header, path.trim_start_matches('/'), None);
    }
    Ok(())
}

fn attr<'a>(attrs: &'a [(&str, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}

/// Split XML into open tags, close tags, and text runs.
///
/// Declarations, comments, and doctype are dropped.
fn tokenize(text: &str) -> Result<Vec<Token<'_>>, CoevoError> {
    let mut tokens = Vec::new();
    let mut rest = text;
    let mut line = 1usize;

    while !rest.is_empty() {
        let Some(start) = rest.find('<') else {
            tokens.push(Token::Text(rest));
            break;
        };
        if start > 0 {
            tokens.push(Token::Text(&rest[..start]));
            line += rest[..start].matches('\n').count();
        }
        let tag_start_line = line;
        let after = &rest[start..];

        let end = if after.starts_with("<!--") {
            after.find("-->").map(|i| i + 3)
        } else {
            tag_end(after)
        };
        let Some(end) = end else {
            return Err(CoevoError::parse(
                VcsFormat::Svn,
                tag_start_line,
                line_at(text, tag_start_line),
                "unterminated XML tag",
            ));
        };

        let tag = &after[..end];
        line += tag.matches('\n').count();
        rest = &after[end..];

        if tag.starts_with("<?") || tag.starts_with("<!") {
            continue;
        }
        if let Some(name) = tag.strip_prefix("</") {
            tokens.push(Token::Close {
                name: name.trim_end_matches('>').trim(),
            });
            continue;
        }

        let self_closing = tag.ends_with("/>");
        let body = tag[1..tag.len() - if self_closing { 2 } else { 1 }].trim();
        let (name, attr_src) = match body.find(char::is_whitespace) {
            Some(i) => (&body[..i], &body[i..]),
            None => (body, ""),
        };
        tokens.push(Token::Open {
            name,
            attrs: parse_attrs(attr_src),
            self_closing,
            line: tag_start_line,
        });
    }

    Ok(tokens)
}

/// Byte offset just past the `>` closing the tag at the start of `s`,
/// skipping `>` inside quoted attribute values.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i + 1),
            (None, _) => {}
        }
    }
    None
}

fn parse_attrs(src: &str) -> Vec<(&str, String)> {
    let mut attrs = Vec::new();
    let mut rest = src.trim_start();
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim();
        let value_src = rest[eq + 1..].trim_start();
        let Some(quote) = value_src.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            break;
        };
        let Some(close) = value_src[1..].find(quote) else {
            break;
        };
        attrs.push((key, unescape(&value_src[1..1 + close])));
        rest = value_src[close + 2..].trim_start();
    }
    attrs
}

fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
