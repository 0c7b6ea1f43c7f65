//! Architectural layer and team mappings.
//!
//! Both mappings are plain text files read once before mining. A layer
//! file maps path prefixes (or anchored regexes) to layer names; a team
//! file maps authors to teams.

use std::collections::HashMap;
use std::path::Path;

use coevo_core::CoevoError;
use regex::Regex;

#[derive(Debug, Clone)]
enum Pattern {
    Prefix(String),
    Regex(Regex),
}

impl Pattern {
    fn matches(&self, entity: &str) -> bool {
        match self {
            Pattern::Prefix(prefix) => {
                entity == prefix
                    || entity
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            Pattern::Regex(re) => re.is_match(entity),
        }
    }
}

/// Ordered `pattern => layer` rules. The first matching rule wins.
///
/// # Examples
///
/// ```
/// use coevo_history::layers::LayerMap;
///
/// let layers = LayerMap::parse("# layers\nsrc/ui => UI\n^.*Test\\.java$ => Tests\n").unwrap();
/// assert_eq!(layers.layer_of("src/ui/button.rs"), Some("UI"));
/// assert_eq!(layers.layer_of("src/core/FooTest.java"), Some("Tests"));
/// assert_eq!(layers.layer_of("src/uikit.rs"), None);
/// ```
#[derive(Debug, Clone)]
pub struct LayerMap {
    rules: Vec<(Pattern, String)>,
}

impl LayerMap {
    /// Parse a layer definition.
    ///
    /// Blank lines and lines starting with `#` are ignored. A pattern
    /// wrapped in `^...$` is a regular expression; anything else is a
    /// path prefix matched on whole segments.
    ///
    /// # Errors
    ///
    /// Returns [`CoevoError::Config`] for a line without `=>`, an empty
    /// side, or an invalid regex.
    pub fn parse(text: &str) -> Result<Self, CoevoError> {
        let mut rules = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((pattern, layer)) = line.split_once("=>") else {
                return Err(CoevoError::Config(format!(
                    "layer definition line {}: expected `pattern => layer`, got {line:?}",
                    idx + 1
                )));
            };
            let (pattern, layer) = (pattern.trim(), layer.trim());
            if pattern.is_empty() || layer.is_empty() {
                return Err(CoevoError::Config(format!(
                    "layer definition line {}: empty pattern or layer name",
                    idx + 1
                )));
            }
            let pattern = if pattern.starts_with('^') && pattern.ends_with('$') {
                Regex::new(pattern).map(Pattern::Regex).map_err(|e| {
                    CoevoError::Config(format!("layer definition line {}: {e}", idx + 1))
                })?
            } else {
                Pattern::Prefix(pattern.trim_end_matches('/').to_string())
            };
            rules.push((pattern, layer.to_string()));
        }
        Ok(Self { rules })
    }

    /// Read and parse a layer file.
    pub fn from_file(path: &Path) -> Result<Self, CoevoError> {
        if !path.exists() {
            return Err(CoevoError::FileNotFound(path.to_path_buf()));
        }
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// The layer `entity` belongs to, if any.
    pub fn layer_of(&self, entity: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(entity))
            .map(|(_, layer)| layer.as_str())
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// `author,team` assignments.
///
/// # Examples
///
/// ```
/// use coevo_history::layers::TeamMap;
///
/// let teams = TeamMap::parse("author,team\nalice,Core\nbob,Web\n").unwrap();
/// assert_eq!(teams.team_of("alice"), Some("Core"));
/// assert_eq!(teams.team_of("carol"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TeamMap {
    teams: HashMap<String, String>,
}

impl TeamMap {
    /// Parse a team CSV. An `author,team` header line is optional.
    ///
    /// # Errors
    ///
    /// Returns [`CoevoError::Config`] for a line that is not two
    /// non-empty comma-separated fields.
    pub fn parse(text: &str) -> Result<Self, CoevoError> {
        let mut teams = HashMap::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((author, team)) = line.split_once(',') else {
                return Err(CoevoError::Config(format!(
                    "team definition line {}: expected `author,team`, got {line:?}",
                    idx + 1
                )));
            };
            let (author, team) = (author.trim(), team.trim());
            if idx == 0 && author.eq_ignore_ascii_case("author") && team.eq_ignore_ascii_case("team")
            {
                continue;
            }
            if author.is_empty() || team.is_empty() || team.contains(',') {
                return Err(CoevoError::Config(format!(
                    "team definition line {}: expected `author,team`, got {line:?}",
                    idx + 1
                )));
            }
            teams.insert(author.to_string(), team.to_string());
        }
        Ok(Self { teams })
    }

    /// Read and parse a team file.
    pub fn from_file(path: &Path) -> Result<Self, CoevoError> {
        if !path.exists() {
            return Err(CoevoError::FileNotFound(path.to_path_buf()));
        }
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// The team `author` belongs to, if any.
    pub fn team_of(&self, author: &str) -> Option<&str> {
        self.teams.get(author).map(String::as_str)
    }

    /// Number of assigned authors.
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    /// Whether no author is assigned.
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}
