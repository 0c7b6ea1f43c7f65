//! Analysis dispatch and the parallel runner.
//!
//! Every analysis is a pure function of one [`MinedLog`] and its
//! parameters. [`run_many`] fans independent requests out across the
//! rayon pool; they share the log read-only.

use coevo_core::{CoevoError, VcsFormat};
use rayon::prelude::*;
use regex::Regex;

use crate::age::{analyze_age, AgeOptions};
use crate::authors::{analyze_authors, analyze_revisions};
use crate::churn::{absolute_churn, author_churn, entity_churn, entity_ownership, ChurnKind};
use crate::communication::analyze_communication;
use crate::coupling::{analyze_coupling, sum_of_coupling, validate_changeset_size, CouplingOptions};
use crate::effort::{entity_effort, fragmentation, main_developers, MainDevMetric};
use crate::messages::analyze_messages;
use crate::mining::MinedLog;
use crate::summary::{identity, summarize, Statistic};
use crate::table::ResultTable;

/// One analysis request with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    /// Logical coupling between entity pairs.
    Coupling(CouplingOptions),
    /// Sum of coupling per entity.
    SumOfCoupling {
        /// Changesets touching more entities are ignored.
        max_changeset_size: usize,
    },
    /// Lines added and deleted.
    Churn(ChurnKind),
    /// Lines per entity and author.
    EntityOwnership,
    /// Days since last change.
    Age(AgeOptions),
    /// Distinct authors per entity.
    Authors {
        /// Minimum revisions per entity.
        min_revs: u32,
    },
    /// Revisions per entity.
    Revisions {
        /// Minimum revisions per entity.
        min_revs: u32,
    },
    /// Revisions per entity and author.
    EntityEffort {
        /// Minimum revisions per entity.
        min_revs: u32,
    },
    /// Top contributor per entity.
    MainDev {
        /// What contribution is measured by.
        metric: MainDevMetric,
        /// Minimum revisions per entity.
        min_revs: u32,
    },
    /// How scattered authorship is per entity.
    Fragmentation {
        /// Minimum revisions per entity.
        min_revs: u32,
    },
    /// Shared entities between authors.
    Communication {
        /// Minimum shared entities for a link.
        min_shared_revs: u32,
    },
    /// Commit message matches per entity.
    Messages {
        /// Regular expression matched against commit messages.
        expression: String,
    },
    /// Whole-log totals.
    Summary,
    /// Every mined entity change.
    Identity,
}

impl Analysis {
    /// The analysis name used in result tables and on the command line.
    ///
    /// # Examples
    ///
    /// ```
    /// use coevo_history::analysis::Analysis;
    /// use coevo_history::churn::ChurnKind;
    ///
    /// assert_eq!(Analysis::Churn(ChurnKind::Author).name(), "author-churn");
    /// assert_eq!(Analysis::Summary.name(), "summary");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            Analysis::Coupling(_) => "coupling",
            Analysis::SumOfCoupling { .. } => "soc",
            Analysis::Churn(kind) => kind.name(),
            Analysis::EntityOwnership => "entity-ownership",
            Analysis::Age(_) => "age",
            Analysis::Authors { .. } => "authors",
            Analysis::Revisions { .. } => "revisions",
            Analysis::EntityEffort { .. } => "entity-effort",
            Analysis::MainDev { metric, .. } => metric.name(),
            Analysis::Fragmentation { .. } => "fragmentation",
            Analysis::Communication { .. } => "communication",
            Analysis::Messages { .. } => "messages",
            Analysis::Summary => "summary",
            Analysis::Identity => "identity",
        }
    }

    /// Check parameters without touching any log data.
    ///
    /// # Errors
    ///
    /// Returns [`CoevoError::InvalidParameter`] naming the offending
    /// parameter.
    pub fn validate(&self) -> Result<(), CoevoError> {
        match self {
            Analysis::Coupling(options) => options.validate(),
            Analysis::SumOfCoupling { max_changeset_size } => {
                validate_changeset_size(*max_changeset_size)
            }
            Analysis::Messages { expression } => {
                if expression.trim().is_empty() {
                    return Err(CoevoError::invalid("expression", "must not be empty"));
                }
                Regex::new(expression)
                    .map(|_| ())
                    .map_err(|e| CoevoError::invalid("expression", e.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Check that logs in `format` carry the data this analysis reads.
    ///
    /// # Errors
    ///
    /// Returns [`CoevoError::InvalidParameter`] for `messages` on a format
    /// without commit messages.
    pub fn check_format(&self, format: VcsFormat) -> Result<(), CoevoError> {
        match self {
            Analysis::Messages { .. } if !format.has_messages() => Err(CoevoError::invalid(
                "analysis",
                format!("messages needs commit messages, which {format} logs do not carry"),
            )),
            _ => Ok(()),
        }
    }
}

/// Run one analysis against a mined log.
///
/// An empty log yields an empty table once the parameters are valid.
///
/// # Errors
///
/// Returns [`CoevoError::InvalidParameter`] if the parameters are rejected.
///
/// # Examples
///
/// ```
/// use coevo_core::VcsFormat;
/// use coevo_history::analysis::{run, Analysis};
/// use coevo_history::mining::{mine_str, MiningOptions};
///
/// let log = "--a1--2024-03-01--alice\n1\t0\ta.rs\n";
/// let mined = mine_str(log, VcsFormat::Git2, &MiningOptions::default()).unwrap();
/// let table = run(&mined, &Analysis::Revisions { min_revs: 1 }).unwrap();
/// assert_eq!(table.analysis, "revisions");
/// assert_eq!(table.len(), 1);
/// ```
pub fn run(log: &MinedLog, analysis: &Analysis) -> Result<ResultTable, CoevoError> {
    analysis.validate()?;
    analysis.check_format(log.format())?;
    let name = analysis.name();
    let changesets = log.changesets();

    let table = match analysis {
        Analysis::Coupling(options) => {
            ResultTable::from_rows(name, &analyze_coupling(changesets, options)?)
        }
        Analysis::SumOfCoupling { max_changeset_size } => {
            ResultTable::from_rows(name, &sum_of_coupling(changesets, *max_changeset_size)?)
        }
        Analysis::Churn(ChurnKind::Entity) => ResultTable::from_rows(name, &entity_churn(changesets)),
        Analysis::Churn(ChurnKind::Author) => ResultTable::from_rows(name, &author_churn(changesets)),
        Analysis::Churn(ChurnKind::Absolute) => {
            ResultTable::from_rows(name, &absolute_churn(changesets))
        }
        Analysis::EntityOwnership => ResultTable::from_rows(name, &entity_ownership(changesets)),
        Analysis::Age(options) => ResultTable::from_rows(
            name,
            &analyze_age(log.entity_stats(), log.latest_date(), options)?,
        ),
        Analysis::Authors { min_revs } => {
            ResultTable::from_rows(name, &analyze_authors(log.entity_stats(), *min_revs))
        }
        Analysis::Revisions { min_revs } => {
            ResultTable::from_rows(name, &analyze_revisions(log.entity_stats(), *min_revs))
        }
        Analysis::EntityEffort { min_revs } => {
            ResultTable::from_rows(name, &entity_effort(changesets, *min_revs))
        }
        Analysis::MainDev { metric, min_revs } => {
            ResultTable::from_rows(name, &main_developers(changesets, *metric, *min_revs))
        }
        Analysis::Fragmentation { min_revs } => {
            ResultTable::from_rows(name, &fragmentation(changesets, *min_revs))
        }
        Analysis::Communication { min_shared_revs } => {
            ResultTable::from_rows(name, &analyze_communication(changesets, *min_shared_revs))
        }
        Analysis::Messages { expression } => {
            ResultTable::from_rows(name, &analyze_messages(changesets, expression)?)
        }
        Analysis::Summary if log.is_empty() => {
            ResultTable::from_rows::<Statistic>(name, &[])
        }
        Analysis::Summary => ResultTable::from_rows(name, &summarize(changesets)),
        Analysis::Identity => ResultTable::from_rows(name, &identity(changesets)),
    };

    tracing::debug!(analysis = name, rows = table.len(), "analysis complete");
    Ok(table)
}

/// Run several analyses in parallel, returning tables in request order.
///
/// Every request is validated before any of them runs, so a bad
/// parameter never leaves partial results behind.
///
/// # Errors
///
/// Returns the first [`CoevoError`] in request order.
pub fn run_many(log: &MinedLog, analyses: &[Analysis]) -> Result<Vec<ResultTable>, CoevoError> {
    for analysis in analyses {
        analysis.validate()?;
        analysis.check_format(log.format())?;
    }
    // Warm the shared statistics before fanning out.
    let _ = log.entity_stats();
    analyses
        .par_iter()
        .map(|analysis| run(log, analysis))
        .collect()
}
