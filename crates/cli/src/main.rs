// devintel CLI - competitor project reports from periodic exports

mod exit_codes;
mod report;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use devintel_config::{ConfigError, Settings};
use devintel_core::{Entity, SourceKind, Tier};
use devintel_io::Resolution;
use devintel_recon::{rollup_by_entity, Pipeline, ProjectFilter, RecordLoader};
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_CONFIG, EXIT_ERROR, EXIT_NO_DATA, EXIT_OUTPUT, EXIT_SUCCESS, EXIT_USAGE};
use report::{render, write_grid, Column, OutputFormat, ReportDocument};

#[derive(Parser)]
#[command(name = "devintel")]
#[command(about = "Competitor project intelligence from periodic summary and detail exports")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file [default: <config dir>/devintel/devintel.toml]
    #[arg(long, global = true, value_name = "PATH", env = "DEVINTEL_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the exports (overrides `data_dir` from settings)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Log more on stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, reconcile and aggregate the selected entities
    #[command(after_help = "\
Entity selection defaults to the first registered entity (base tier) or
every registered entity (elevated tier), capped at 1 and 5 respectively.

Exit code 4 means nothing was loaded; the (empty) report is still printed.

Examples:
  devintel report
  devintel report --tier elevated --entity Teladan --entity NKS --format json
  devintel report --tier elevated --min-sales 100000 --format csv -o projects.csv")]
    Report {
        /// Service tier: base or elevated
        #[arg(long, default_value = "base")]
        tier: Tier,

        /// Entity to include (repeatable)
        #[arg(long = "entity", value_name = "NAME")]
        entities: Vec<String>,

        /// Keep only these projects in the project table (repeatable; one for base)
        #[arg(long = "project", value_name = "NAME")]
        projects: Vec<String>,

        /// Minimum project total sales, inclusive (elevated only)
        #[arg(long, value_name = "RM")]
        min_sales: Option<f64>,

        /// Maximum project total sales, inclusive (elevated only)
        #[arg(long, value_name = "RM")]
        max_sales: Option<f64>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Show which export files each entity would be read from
    Sources {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the entity registry
    Entities {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("DEVINTEL_GIT_HASH"), ")",
        "\ntarget:  ", env!("DEVINTEL_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            eprintln!("error: {}", message);
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// stderr subscriber; library `log` records arrive through the tracing-log bridge.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut settings = Settings::load(cli.config.as_deref()).map_err(config_error)?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }

    match cli.command {
        Commands::Report {
            tier,
            entities,
            projects,
            min_sales,
            max_sales,
            format,
            output,
        } => cmd_report(
            settings,
            ReportArgs {
                tier,
                entities,
                projects,
                min_sales,
                max_sales,
                format,
                output,
            },
        ),
        Commands::Sources { json } => cmd_sources(settings, json),
        Commands::Entities { json } => cmd_entities(&settings, json),
    }
}

fn config_error(err: ConfigError) -> CliError {
    let hint = match err {
        ConfigError::Read { .. } => "check the --config path (or DEVINTEL_CONFIG)".to_string(),
        _ => format!("default settings file: {}", Settings::config_path().display()),
    };
    CliError::config(err.to_string()).with_hint(hint)
}

// ============================================================================
// report
// ============================================================================

struct ReportArgs {
    tier: Tier,
    entities: Vec<String>,
    projects: Vec<String>,
    min_sales: Option<f64>,
    max_sales: Option<f64>,
    format: OutputFormat,
    output: Option<PathBuf>,
}

fn cmd_report(settings: Settings, args: ReportArgs) -> Result<(), CliError> {
    let tier = args.tier;
    let selection = select_entities(&settings, &args.entities, tier)?;
    let filter = project_filter(&args);

    let pipeline = Pipeline::new(settings);
    let report = pipeline.run(&selection, tier);
    let projects = filter.apply(&report.projects);
    let alerts = pipeline.alerts(&projects, tier);
    let rollups = rollup_by_entity(&report.projects);

    let doc = ReportDocument {
        tier,
        entities: &selection,
        fidelity: &report.fidelity,
        summary: &report.summary,
        projects: &projects,
        rollups: &rollups,
        alerts: &alerts,
        diagnostics: &report.diagnostics,
        total_projects: report.projects.len(),
    };
    write_output(args.output.as_deref(), |w| render(&doc, args.format, w))?;

    if report.is_no_data() {
        return Err(CliError::no_data("no data loaded for the selected entities").with_hint(
            "run `devintel sources` to see which export files are expected",
        ));
    }
    Ok(())
}

/// Requested entities (registry order when none are named), capped at the tier limit.
fn select_entities(settings: &Settings, requested: &[String], tier: Tier) -> Result<Vec<Entity>, CliError> {
    let registry = settings.entities();

    let mut selection: Vec<Entity> = if requested.is_empty() {
        match tier {
            Tier::Base => registry.into_iter().take(1).collect(),
            Tier::Elevated => registry,
        }
    } else {
        let mut picked = Vec::new();
        for name in requested {
            let entity = registry
                .iter()
                .find(|e| e.as_str().eq_ignore_ascii_case(name.trim()))
                .cloned()
                .ok_or_else(|| {
                    let known: Vec<&str> = registry.iter().map(Entity::as_str).collect();
                    CliError::usage(format!("unknown entity: {}", name))
                        .with_hint(format!("registered entities: {}", known.join(", ")))
                })?;
            if !picked.contains(&entity) {
                picked.push(entity);
            }
        }
        picked
    };

    if selection.is_empty() {
        return Err(CliError::config("the entity registry is empty"));
    }

    let limit = tier.entity_limit();
    if selection.len() > limit {
        selection.truncate(limit);
        let kept: Vec<&str> = selection.iter().map(Entity::as_str).collect();
        eprintln!(
            "warning: the {} tier reports at most {} entities; using {}",
            tier,
            limit,
            kept.join(", ")
        );
    }
    Ok(selection)
}

/// The base tier narrows to a single project and has no sales range.
fn project_filter(args: &ReportArgs) -> ProjectFilter {
    let mut projects = args.projects.clone();
    let mut filter = ProjectFilter::new();

    if args.tier.is_elevated() {
        if let Some(min) = args.min_sales {
            filter = filter.with_min_sales(min);
        }
        if let Some(max) = args.max_sales {
            filter = filter.with_max_sales(max);
        }
    } else {
        if projects.len() > 1 {
            projects.truncate(1);
            eprintln!("warning: the base tier filters one project; using {}", projects[0]);
        }
        if args.min_sales.is_some() || args.max_sales.is_some() {
            eprintln!("warning: sales range filters need the elevated tier; ignored");
        }
    }
    filter.with_projects(projects)
}

fn write_output(
    path: Option<&Path>,
    emit: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> Result<(), CliError> {
    let (mut w, target): (Box<dyn Write>, String) = match path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| CliError::output(format!("cannot create {}: {}", path.display(), e)))?;
            (Box::new(BufWriter::new(file)), path.display().to_string())
        }
        None => (Box::new(io::stdout().lock()), "stdout".to_string()),
    };
    emit(w.as_mut())
        .and_then(|()| w.flush())
        .map_err(|e| CliError::output(format!("cannot write report to {}: {}", target, e)))
}

// ============================================================================
// sources / entities
// ============================================================================

#[derive(Serialize)]
struct SourceRow {
    entity: String,
    kind: SourceKind,
    file: String,
    path: PathBuf,
    resolution: &'static str,
    exists: bool,
}

fn cmd_sources(settings: Settings, json: bool) -> Result<(), CliError> {
    let sources = settings.entities.clone();
    let loader = RecordLoader::new(settings);

    let mut rows = Vec::new();
    for source in &sources {
        for kind in [SourceKind::Summary, SourceKind::Detail] {
            let resolved = loader.resolve(source, kind);
            let resolution = match resolved.resolution {
                Resolution::Latest => "latest",
                Resolution::Fallback => "fallback",
                Resolution::ListingFailed(ref e) => {
                    log::warn!("{}: {}", source.name, e);
                    "listing_failed"
                }
            };
            rows.push(SourceRow {
                entity: source.name.clone(),
                kind,
                exists: resolved.exists(),
                file: resolved.file_name,
                path: resolved.path,
                resolution,
            });
        }
    }

    write_output(None, |w| {
        if json {
            serde_json::to_writer_pretty(&mut *w, &rows)?;
            return writeln!(w);
        }
        let columns = [
            Column::text("ENTITY"),
            Column::text("KIND"),
            Column::text("FILE"),
            Column::text("RESOLUTION"),
            Column::text("STATUS"),
        ];
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|r| {
                vec![
                    r.entity.clone(),
                    r.kind.to_string(),
                    r.file.clone(),
                    r.resolution.replace('_', " "),
                    if r.exists { "found" } else { "missing" }.to_string(),
                ]
            })
            .collect();
        write_grid(w, &columns, &cells)
    })
}

fn cmd_entities(settings: &Settings, json: bool) -> Result<(), CliError> {
    write_output(None, |w| {
        if json {
            serde_json::to_writer_pretty(&mut *w, &settings.entities)?;
            return writeln!(w);
        }
        let columns = [
            Column::text("NAME"),
            Column::text("PREFIX"),
            Column::text("FALLBACK"),
        ];
        let cells: Vec<Vec<String>> = settings
            .entities
            .iter()
            .map(|e| vec![e.name.clone(), e.prefix.clone(), e.fallback_stamp.clone()])
            .collect();
        write_grid(w, &columns, &cells)
    })
}

// ============================================================================
// Errors
// ============================================================================

pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    pub fn no_data(msg: impl Into<String>) -> Self {
        Self { code: EXIT_NO_DATA, message: msg.into(), hint: None }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self { code: EXIT_ERROR, message: err.to_string(), hint: None }
    }
}
