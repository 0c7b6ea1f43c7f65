use std::fmt;
use std::path::PathBuf;

use crate::types::VcsFormat;

/// Errors that can occur while mining a log or running an analysis.
///
/// Library crates return this type directly; the binary converts to a
/// `miette` diagnostic at the boundary.
///
/// # Examples
///
/// ```
/// use coevo_core::{CoevoError, ErrorKind};
///
/// let err = CoevoError::UnsupportedFormat("cvs".into());
/// assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
/// assert!(err.to_string().contains("cvs"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CoevoError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration, including layer and team map files.
    #[error("configuration error: {0}")]
    Config(String),

    /// The requested log format is not one of the supported VCS grammars.
    #[error("unsupported VCS format '{0}' (expected one of: git, git2, svn, hg, p4, tfs)")]
    UnsupportedFormat(String),

    /// A commit header could not be parsed. Mining stops at the first one.
    #[error("{format} log, line {line}: {message}: {raw:?}")]
    Parse {
        /// Grammar in use when the failure happened.
        format: VcsFormat,
        /// 1-based line number of the offending record.
        line: usize,
        /// The raw offending line.
        raw: String,
        /// What was wrong with it.
        message: String,
    },

    /// An analysis parameter outside its valid domain.
    #[error("invalid parameter `{name}`: {message}")]
    InvalidParameter {
        /// Parameter name as the caller spells it.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

/// The closed classification of [`CoevoError`] values surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Requested VCS format is not supported.
    UnsupportedFormat,
    /// Malformed commit header; no model was built.
    ParseError,
    /// An analysis threshold was rejected before computation.
    InvalidParameter,
    /// Reading the log or a side file failed.
    Io,
    /// Configuration could not be loaded.
    Config,
    /// Anything else (serialization).
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnsupportedFormat => "unsupported-format",
            ErrorKind::ParseError => "parse-error",
            ErrorKind::InvalidParameter => "invalid-parameter",
            ErrorKind::Io => "io",
            ErrorKind::Config => "config",
            ErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

impl CoevoError {
    /// Build a [`CoevoError::Parse`] for `raw` at 1-based `line`.
    pub fn parse(
        format: VcsFormat,
        line: usize,
        raw: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CoevoError::Parse {
            format,
            line,
            raw: raw.into(),
            message: message.into(),
        }
    }

    /// Build a [`CoevoError::InvalidParameter`].
    pub fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        CoevoError::InvalidParameter {
            name,
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoevoError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            CoevoError::Parse { .. } => ErrorKind::ParseError,
            CoevoError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            CoevoError::Io(_) | CoevoError::FileNotFound(_) => ErrorKind::Io,
            CoevoError::Config(_) | CoevoError::Toml(_) => ErrorKind::Config,
            CoevoError::Serialization(_) => ErrorKind::Other,
        }
    }

    /// The 1-based input line for parse errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            CoevoError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CoevoError = io_err.into();
        assert!(err.to_string().contains("gone"));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn parse_error_carries_line_and_raw_text() {
        let err = CoevoError::parse(VcsFormat::Git2, 7, "--abc--bad-date--bob", "invalid date");
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.line(), Some(7));
        let msg = err.to_string();
        assert!(msg.contains("git2 log, line 7"), "{msg}");
        assert!(msg.contains("--abc--bad-date--bob"), "{msg}");
    }

    #[test]
    fn invalid_parameter_names_the_parameter() {
        let err = CoevoError::invalid("min_coupling", "must not exceed max_coupling");
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(
            err.to_string(),
            "invalid parameter `min_coupling`: must not exceed max_coupling"
        );
        assert_eq!(err.line(), None);
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = CoevoError::FileNotFound(PathBuf::from("/tmp/missing.log"));
        assert!(err.to_string().contains("/tmp/missing.log"));
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::ParseError.to_string(), "parse-error");
        assert_eq!(ErrorKind::UnsupportedFormat.to_string(), "unsupported-format");
    }
}
