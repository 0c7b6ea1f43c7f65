use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoevoError;
use crate::types::VcsFormat;

/// Top-level configuration loaded from `.coevo.toml`.
///
/// Supports layered resolution: CLI flags > config file > defaults.
///
/// # Examples
///
/// ```
/// use coevo_core::CoevoConfig;
///
/// let config = CoevoConfig::default();
/// assert_eq!(config.coupling.min_coupling, 30);
/// assert_eq!(config.thresholds.min_revs, 5);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoevoConfig {
    /// Log ingestion settings.
    #[serde(default)]
    pub mining: MiningConfig,
    /// Logical coupling thresholds.
    #[serde(default)]
    pub coupling: CouplingConfig,
    /// Thresholds shared by the per-entity and per-author analyses.
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

impl CoevoConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoevoError::Io`] if the file cannot be read, or
    /// [`CoevoError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, CoevoError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CoevoError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use coevo_core::{CoevoConfig, VcsFormat};
    ///
    /// let toml = r#"
    /// [mining]
    /// vcs = "hg"
    ///
    /// [coupling]
    /// min_revs = 10
    /// "#;
    /// let config = CoevoConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.mining.vcs, Some(VcsFormat::Hg));
    /// assert_eq!(config.coupling.min_revs, 10);
    /// assert_eq!(config.coupling.max_changeset_size, 30);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CoevoError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// How the log is ingested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Default log grammar when `--vcs` is not given.
    pub vcs: Option<VcsFormat>,
    /// Architectural layer definitions (`prefix => Name` per line).
    pub layers: Option<PathBuf>,
    /// Author to team mapping (`author,team` per line).
    pub teams: Option<PathBuf>,
}

/// Logical coupling thresholds.
///
/// # Examples
///
/// ```
/// use coevo_core::CouplingConfig;
///
/// let config = CouplingConfig::default();
/// assert_eq!(config.max_coupling, 100);
/// assert_eq!(config.max_changeset_size, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingConfig {
    /// Lowest coupling percentage reported (default: 30).
    #[serde(default = "default_min_coupling")]
    pub min_coupling: u32,
    /// Highest coupling percentage reported (default: 100).
    #[serde(default = "default_max_coupling")]
    pub max_coupling: u32,
    /// Minimum revisions per entity to be eligible (default: 5).
    #[serde(default = "default_min_revs")]
    pub min_revs: u32,
    /// Changesets touching more entities are ignored (default: 30).
    #[serde(default = "default_max_changeset_size")]
    pub max_changeset_size: usize,
}

fn default_min_coupling() -> u32 {
    30
}

fn default_max_coupling() -> u32 {
    100
}

fn default_min_revs() -> u32 {
    5
}

fn default_min_shared_revs() -> u32 {
    5
}

fn default_max_changeset_size() -> usize {
    30
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            min_coupling: default_min_coupling(),
            max_coupling: default_max_coupling(),
            min_revs: default_min_revs(),
            max_changeset_size: default_max_changeset_size(),
        }
    }
}

/// Thresholds for authors, age, effort, and communication analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Minimum revisions per entity (default: 5).
    #[serde(default = "default_min_revs")]
    pub min_revs: u32,
    /// Minimum shared entities per author pair (default: 5).
    #[serde(default = "default_min_shared_revs")]
    pub min_shared_revs: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_revs: default_min_revs(),
            min_shared_revs: default_min_shared_revs(),
        }
    }
}
