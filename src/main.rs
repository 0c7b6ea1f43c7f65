use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use coevo_core::{CoevoConfig, CoevoError, ErrorKind, OutputFormat, VcsFormat};
use coevo_history::age::{AgeOptions, SortOrder};
use coevo_history::analysis::{run_many, Analysis};
use coevo_history::churn::ChurnKind;
use coevo_history::coupling::CouplingOptions;
use coevo_history::effort::MainDevMetric;
use coevo_history::layers::{LayerMap, TeamMap};
use coevo_history::mining::{mine_log, MinedLog, MiningOptions, MiningWarning};

mod logger;
mod render;

#[derive(Parser)]
#[command(
    name = "coevo",
    version,
    about = "Mine version-control logs for logical coupling, churn, code age, and ownership",
    long_about = "coevo reads a version-control log and reports the socio-technical structure\n\
                   hidden in it: which files change together, which churn the most, which are\n\
                   stable, who owns what, and how authors' work overlaps.\n\n\
                   Examples:\n  \
                     git log --pretty=format:'--%h--%ad--%aN' --date=short --numstat --no-renames > git.log\n  \
                     coevo analyze --log git.log --vcs git2 --analysis coupling\n  \
                     coevo analyze --log svn.xml --vcs svn --analysis age,authors --format json\n  \
                     coevo init                      Create a .coevo.toml config file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .coevo.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for result tables.\n\n\
                       Formats:\n  \
                         text      Aligned plain-text columns (default)\n  \
                         json      One object per table, rows keyed by column name\n  \
                         markdown  GitHub-flavored Markdown tables"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run one or more analyses over a VCS log
    #[command(long_about = "Run one or more analyses over a VCS log.\n\n\
        The log is mined once; the requested analyses then run in parallel over\n\
        the same snapshot. Thresholds fall back to .coevo.toml, then to defaults.\n\n\
        Examples:\n  coevo analyze --log git.log --vcs git2 --analysis coupling --min-revs 10\n  \
        coevo analyze --log hg.log --vcs hg --analysis entity-effort,communication\n  \
        coevo analyze --log p4.log --vcs p4 --analysis messages --expression '(?i)bug'")]
    Analyze(AnalyzeArgs),
    /// Create a default .coevo.toml configuration file
    #[command(long_about = "Create a default .coevo.toml configuration file.\n\n\
        Generates a commented template with all available options.\n\
        Fails if .coevo.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(clap::Args)]
struct AnalyzeArgs {
    /// Log file to mine
    #[arg(long)]
    log: PathBuf,

    /// Log format: git, git2, svn, hg, p4, or tfs
    #[arg(long)]
    vcs: Option<VcsFormat>,

    /// Analyses to run, comma-separated
    #[arg(long, short, value_enum, value_delimiter = ',', required = true)]
    analysis: Vec<AnalysisName>,

    /// Lowest coupling degree reported, in percent (default: 30)
    #[arg(long)]
    min_coupling: Option<u32>,

    /// Highest coupling degree reported, in percent (default: 100)
    #[arg(long)]
    max_coupling: Option<u32>,

    /// Minimum revisions per entity (default: 5)
    #[arg(long)]
    min_revs: Option<u32>,

    /// Changesets touching more entities are left out of coupling (default: 30)
    #[arg(long)]
    max_changeset_size: Option<usize>,

    /// Minimum shared entities between two authors (default: 5)
    #[arg(long)]
    min_shared_revs: Option<u32>,

    /// Regular expression for the messages analysis
    #[arg(long)]
    expression: Option<String>,

    /// Measure age against this date (YYYY-MM-DD) instead of the latest change
    #[arg(long)]
    age_time_now: Option<NaiveDate>,

    /// Sort age results oldest first
    #[arg(long)]
    descending: bool,

    /// Show at most this many rows per table
    #[arg(long)]
    rows: Option<usize>,

    /// Architectural layer definitions (`prefix => Name` per line)
    #[arg(long)]
    layers: Option<PathBuf>,

    /// Author to team mapping (`author,team` per line)
    #[arg(long)]
    teams: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AnalysisName {
    /// Entities that change together
    Coupling,
    /// Sum of coupling per entity
    Soc,
    /// Lines added and deleted per entity
    EntityChurn,
    /// Lines added and deleted per author
    AuthorChurn,
    /// Lines added and deleted per day
    AbsChurn,
    /// Lines per entity and author
    EntityOwnership,
    /// Days since each entity last changed
    Age,
    /// Distinct authors per entity
    Authors,
    /// Revisions per entity
    Revisions,
    /// Revisions per entity and author
    EntityEffort,
    /// Top contributor per entity by added lines
    MainDev,
    /// Top contributor per entity by deleted lines
    RefactoringMainDev,
    /// Top contributor per entity by revisions
    MainDevByRevs,
    /// How scattered authorship is per entity
    Fragmentation,
    /// Shared entities between authors
    Communication,
    /// Commit message matches per entity
    Messages,
    /// Commit, entity, and author totals
    Summary,
    /// Every mined entity change
    Identity,
}

impl AnalysisName {
    fn to_analysis(self, args: &AnalyzeArgs, config: &CoevoConfig) -> Analysis {
        let min_revs = args.min_revs.unwrap_or(config.thresholds.min_revs);
        match self {
            AnalysisName::Coupling => Analysis::Coupling(CouplingOptions {
                min_coupling: args.min_coupling.unwrap_or(config.coupling.min_coupling),
                max_coupling: args.max_coupling.unwrap_or(config.coupling.max_coupling),
                min_revs: args.min_revs.unwrap_or(config.coupling.min_revs),
                max_changeset_size: args
                    .max_changeset_size
                    .unwrap_or(config.coupling.max_changeset_size),
            }),
            AnalysisName::Soc => Analysis::SumOfCoupling {
                max_changeset_size: args
                    .max_changeset_size
                    .unwrap_or(config.coupling.max_changeset_size),
            },
            AnalysisName::EntityChurn => Analysis::Churn(ChurnKind::Entity),
            AnalysisName::AuthorChurn => Analysis::Churn(ChurnKind::Author),
            AnalysisName::AbsChurn => Analysis::Churn(ChurnKind::Absolute),
            AnalysisName::EntityOwnership => Analysis::EntityOwnership,
            AnalysisName::Age => Analysis::Age(AgeOptions {
                min_revs,
                reference_date: args.age_time_now,
                order: if args.descending {
                    SortOrder::Descending
                } else {
                    SortOrder::Ascending
                },
            }),
            AnalysisName::Authors => Analysis::Authors { min_revs },
            AnalysisName::Revisions => Analysis::Revisions { min_revs },
            AnalysisName::EntityEffort => Analysis::EntityEffort { min_revs },
            AnalysisName::MainDev => Analysis::MainDev {
                metric: MainDevMetric::AddedLines,
                min_revs,
            },
            AnalysisName::RefactoringMainDev => Analysis::MainDev {
                metric: MainDevMetric::DeletedLines,
                min_revs,
            },
            AnalysisName::MainDevByRevs => Analysis::MainDev {
                metric: MainDevMetric::Revisions,
                min_revs,
            },
            AnalysisName::Fragmentation => Analysis::Fragmentation { min_revs },
            AnalysisName::Communication => Analysis::Communication {
                min_shared_revs: args
                    .min_shared_revs
                    .unwrap_or(config.thresholds.min_shared_revs),
            },
            AnalysisName::Messages => Analysis::Messages {
                expression: args.expression.clone().unwrap_or_default(),
            },
            AnalysisName::Summary => Analysis::Summary,
            AnalysisName::Identity => Analysis::Identity,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# coevo configuration
# Command-line flags override these values.

[mining]
# Log format used when --vcs is not given: git, git2, svn, hg, p4, tfs
# vcs = "git2"
# Architectural layers, one `prefix => Name` or `^regex$ => Name` per line
# layers = "layers.txt"
# Author to team mapping, one `author,team` per line
# teams = "teams.csv"

[coupling]
# min_coupling = 30
# max_coupling = 100
# min_revs = 5
# max_changeset_size = 30

[thresholds]
# min_revs = 5
# min_shared_revs = 5
"#;

fn load_config(path: Option<&Path>) -> Result<CoevoConfig> {
    match path {
        Some(path) => CoevoConfig::from_file(path).into_diagnostic(),
        None => {
            let default_path = Path::new(".coevo.toml");
            if default_path.exists() {
                CoevoConfig::from_file(default_path).into_diagnostic()
            } else {
                Ok(CoevoConfig::default())
            }
        }
    }
}

/// Attach a hint to the errors users can fix themselves.
fn diagnose(err: CoevoError) -> miette::Report {
    let help = match err.kind() {
        ErrorKind::UnsupportedFormat => Some("use one of: git, git2, svn, hg, p4, tfs"),
        ErrorKind::ParseError => {
            Some("check that --vcs matches the command that produced the log")
        }
        ErrorKind::InvalidParameter => Some("see `coevo analyze --help` for valid ranges"),
        _ => None,
    };
    match help {
        Some(help) => miette::miette!(help = help, "{err}"),
        None => miette::miette!("{err}"),
    }
}

fn mine(path: &Path, format: VcsFormat, options: &MiningOptions) -> Result<MinedLog> {
    let spinner = if std::io::stderr().is_terminal() {
        let pb = indicatif::ProgressBar::new_spinner();
        if let Ok(style) =
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
        {
            pb.set_style(style);
        }
        pb.set_message(format!("Mining {format} log {}...", path.display()));
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let mined = mine_log(path, format, options);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    mined.map_err(diagnose)
}

fn analyze(args: &AnalyzeArgs, config: &CoevoConfig, format: OutputFormat) -> Result<()> {
    let Some(vcs) = args.vcs.or(config.mining.vcs) else {
        return Err(miette::miette!(
            help = "pass --vcs, or set `vcs` under [mining] in .coevo.toml",
            "no log format given"
        ));
    };

    let analyses: Vec<Analysis> = args
        .analysis
        .iter()
        .map(|name| name.to_analysis(args, config))
        .collect();
    for analysis in &analyses {
        analysis.validate().map_err(diagnose)?;
        analysis.check_format(vcs).map_err(diagnose)?;
    }

    let layers = match args.layers.as_ref().or(config.mining.layers.as_ref()) {
        Some(path) => Some(LayerMap::from_file(path).map_err(diagnose)?),
        None => None,
    };
    let teams = match args.teams.as_ref().or(config.mining.teams.as_ref()) {
        Some(path) => Some(TeamMap::from_file(path).map_err(diagnose)?),
        None => None,
    };
    let options = MiningOptions {
        layers,
        teams,
        ..MiningOptions::default()
    };

    let mined = mine(&args.log, vcs, &options)?;
    let skipped = mined
        .warnings()
        .iter()
        .filter(|w| matches!(w, MiningWarning::SkippedLine { .. }))
        .count();
    if skipped > 0 {
        eprintln!("warning: skipped {skipped} unparseable line(s) in {}", args.log.display());
    }
    if mined.is_empty() {
        eprintln!("warning: {} contains no revisions", args.log.display());
    }
    tracing::debug!(
        changesets = mined.changesets().len(),
        analyses = analyses.len(),
        "running analyses"
    );

    let mut tables = run_many(&mined, &analyses).map_err(diagnose)?;
    if let Some(rows) = args.rows {
        for table in &mut tables {
            table.truncate(rows);
        }
    }

    print!("{}", render::render(&tables, format).into_diagnostic()?);
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    logger::init(cli.verbose)?;

    match cli.command {
        None => {
            Cli::command().print_help().into_diagnostic()?;
        }
        Some(Command::Analyze(ref args)) => {
            let config = load_config(cli.config.as_deref())?;
            analyze(args, &config, cli.format)?;
        }
        Some(Command::Init) => {
            let path = Path::new(".coevo.toml");
            if path.exists() {
                miette::bail!(".coevo.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .coevo.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "coevo", &mut std::io::stdout());
        }
    }

    Ok(())
}
