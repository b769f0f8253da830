use crate::app_error::AppError;
use crate::config::{self, Config};
use crate::events::{self, EventLog, Filter};
use crate::logging;
use crate::model::{
    BuildOccurrence, CriticalOccurrence, Occurrence, OutcomeCode, STATUS_FAILURE, STATUS_SUCCESS,
    TestOccurrence,
};
use crate::output::{self, DetectionRow, StatsRow};
use crate::record::RunRecord;
use crate::registry::Registry;
use crate::template::{self, EventTemplate};
use crate::version;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Generator, generate};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DEFAULT_CONFIG_PATH: &str = "./flakewatch.yml";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"version: 1

events: ".flakewatch/events.jsonl"   # occurrence log replayed by stats/detect

# codes: ok | failure | muted_failure | critical_failure | ok_or_failure
templates:
  new_failure:
    description: stable test started failing
    before: [ok, ok, ok, ok, ok]
    event_and_after: [failure, failure, failure, failure]

  new_contributed_test_failure:
    description: new test failing since its first run
    before: []
    event_and_after: [failure, failure, failure, failure]
    should_be_first: true

  new_critical_failure:
    description: suite stopped producing results
    before: [ok_or_failure, ok_or_failure, ok_or_failure, ok_or_failure, ok_or_failure]
    event_and_after: [critical_failure, critical_failure, critical_failure, critical_failure]

  fixed_failure:
    description: failing test recovered
    before: [failure, failure, failure]
    event_and_after: [ok, ok, ok, ok, ok]
"#;

#[derive(Debug, Parser)]
#[command(
    name = "flakewatch",
    version = version::VALUE,
    about = "Run history, flaky-test reports and failure-pattern detection",
    styles = clap_styles()
)]
struct Cli {
    #[arg(long = "no-color", global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Init(InitArgs),
    Record(RecordArgs),
    Stats(StatsArgs),
    Detect(DetectArgs),
    Validate(ValidateArgs),
    Version,
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
struct InitArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Args)]
struct LogArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RecordArgs {
    #[command(flatten)]
    log: LogArgs,
    #[arg(long, value_enum)]
    kind: KindArg,
    #[arg(long)]
    name: String,
    /// Composite test occurrence id, required for tests.
    #[arg(long)]
    id: Option<String>,
    #[arg(long = "build-id")]
    build_id: Option<i32>,
    #[arg(long, value_enum, default_value_t = StatusArg::Success)]
    status: StatusArg,
    #[arg(long)]
    muted: bool,
    #[arg(long)]
    ignored: bool,
    #[arg(long)]
    duration: Option<u64>,
}

#[derive(Debug, Args)]
struct StatsArgs {
    #[command(flatten)]
    log: LogArgs,
    /// Only entities whose name contains this text.
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    flaky: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct DetectArgs {
    #[command(flatten)]
    log: LogArgs,
    #[arg(long)]
    template: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct CompletionArgs {
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Test,
    Build,
    Critical,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

fn clap_styles() -> Styles {
    Styles::plain()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Cyan.on_default())
        .context(AnsiColor::White.on_default())
        .context_value(AnsiColor::Cyan.on_default())
}

pub fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    output::configure(cli.no_color);
    logging::init(!output::colors_enabled());

    match cli.command {
        Commands::Init(args) => run_init(args),
        Commands::Record(args) => run_record(args),
        Commands::Stats(args) => run_stats(args),
        Commands::Detect(args) => run_detect(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Version => {
            println!("{}", version::VALUE);
            Ok(())
        }
        Commands::Completion(args) => run_completion(args),
    }
}

fn run_init(args: InitArgs) -> Result<(), AppError> {
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if config_path.exists() && !args.force {
        return Err(AppError::usage(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }

    fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)
        .map_err(|e| AppError::internal(format!("write {}: {e}", config_path.display())))?;

    println!("created {}", output::accent(&config_path.display().to_string()));
    Ok(())
}

fn run_record(args: RecordArgs) -> Result<(), AppError> {
    let (_, log) = open_log(&args.log)?;

    let status = match args.status {
        StatusArg::Success => STATUS_SUCCESS,
        StatusArg::Failure => STATUS_FAILURE,
    }
    .to_string();

    let occurrence = match args.kind {
        KindArg::Test => {
            let id = args
                .id
                .ok_or_else(|| AppError::usage("--id is required for test occurrences"))?;
            Occurrence::Test(TestOccurrence {
                name: args.name,
                id,
                status,
                muted: args.muted,
                ignored: args.ignored,
                duration: args.duration,
            })
        }
        KindArg::Build => Occurrence::Build(BuildOccurrence {
            name: args.name,
            build_id: require_build_id(args.build_id)?,
            status,
        }),
        KindArg::Critical => Occurrence::Critical(CriticalOccurrence {
            name: args.name,
            build_id: require_build_id(args.build_id)?,
        }),
    };

    log.append(&occurrence)?;
    debug!(path = %log.path().display(), kind = ?occurrence.kind(), "occurrence appended");
    Ok(())
}

fn require_build_id(build_id: Option<i32>) -> Result<i32, AppError> {
    build_id.ok_or_else(|| AppError::usage("--build-id is required for build occurrences"))
}

#[derive(Serialize)]
struct StatsJson<'a> {
    name: &'a str,
    window_runs: usize,
    fail_rate: f32,
    critical_fail_rate: f32,
    lifetime_runs: u64,
    lifetime_failures: u64,
    lifetime_fail_rate: f32,
    average_duration_ms: u64,
    latest: Vec<OutcomeCode>,
    flaky: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    flaky_comment: Option<String>,
}

impl<'a> StatsJson<'a> {
    fn from_record(record: &'a RunRecord) -> Self {
        let flaky_comment = record.flakiness_report();
        Self {
            name: record.name(),
            window_runs: record.runs_count(),
            fail_rate: record.fail_rate(),
            critical_fail_rate: record.critical_fail_rate(),
            lifetime_runs: record.runs_all_hist(),
            lifetime_failures: record.failures_all_hist(),
            lifetime_fail_rate: record.lifetime_fail_rate(),
            average_duration_ms: record.average_duration_ms(),
            latest: record.latest_results(),
            flaky: flaky_comment.is_some(),
            flaky_comment,
        }
    }
}

fn run_stats(args: StatsArgs) -> Result<(), AppError> {
    let (_, log) = open_log(&args.log)?;
    let registry = replay(&log, args.name.clone())?;

    let records: Vec<RunRecord> = snapshot(&registry)
        .into_iter()
        .filter(|record| !args.flaky || record.is_flaky())
        .collect();

    if args.json {
        let items: Vec<StatsJson<'_>> = records.iter().map(StatsJson::from_record).collect();
        return write_json(&items, "stats");
    }

    let rows: Vec<StatsRow> = records.iter().map(StatsRow::from_record).collect();
    output::print_stats(io::stdout().lock(), &rows)
        .map_err(|e| AppError::internal(format!("print stats: {e}")))
}

#[derive(Serialize)]
struct DetectionJson<'a> {
    entity: &'a str,
    template: &'a str,
    build_id: i32,
    item_id: i32,
}

fn run_detect(args: DetectArgs) -> Result<(), AppError> {
    let (cfg, log) = open_log(&args.log)?;

    let templates = resolve_templates(cfg.as_ref(), args.template.as_deref())?;
    let registry = replay(&log, args.name.clone())?;

    let mut rows = Vec::new();
    for record in snapshot(&registry) {
        for (name, template) in &templates {
            if let Some(at) = template::detect(&record, template) {
                rows.push(DetectionRow {
                    entity: record.name().to_string(),
                    template: name.clone(),
                    at,
                });
            }
        }
    }

    if args.json {
        let items: Vec<DetectionJson<'_>> = rows
            .iter()
            .map(|row| DetectionJson {
                entity: &row.entity,
                template: &row.template,
                build_id: row.at.container_id,
                item_id: row.at.item_id,
            })
            .collect();
        return write_json(&items, "detections");
    }

    output::print_detections(io::stdout().lock(), &rows)
        .map_err(|e| AppError::internal(format!("print detections: {e}")))
}

fn resolve_templates(
    cfg: Option<&Config>,
    only: Option<&str>,
) -> Result<Vec<(String, EventTemplate)>, AppError> {
    let all = match cfg {
        Some(cfg) => cfg.resolve_templates().map_err(AppError::usage)?,
        None => template::builtin(),
    };

    let Some(only) = only else {
        return Ok(all);
    };

    let selected: Vec<_> = all.into_iter().filter(|(name, _)| name == only).collect();
    if selected.is_empty() {
        return Err(AppError::usage(format!("template {only:?} not found")));
    }
    Ok(selected)
}

fn open_log(args: &LogArgs) -> Result<(Option<Config>, EventLog), AppError> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let cfg = maybe_load_config(&config_path, args.config.is_some())?;

    let path = match (&args.events, &cfg) {
        (Some(path), _) => path.clone(),
        (None, Some(cfg)) if !cfg.events.is_empty() => PathBuf::from(&cfg.events),
        _ => PathBuf::from(events::DEFAULT_PATH),
    };

    Ok((cfg, EventLog::new(path)))
}

fn replay(log: &EventLog, name: Option<String>) -> Result<Registry, AppError> {
    let occurrences = log.read(&Filter { kind: None, name })?;

    let registry = Registry::new();
    let summary = registry.ingest_all(&occurrences);

    if summary.skipped > 0 {
        warn!(
            skipped = summary.skipped,
            "dropped occurrences with unparseable ids"
        );
    }
    debug!(
        accepted = summary.accepted,
        entities = registry.len(),
        "replayed event log"
    );

    Ok(registry)
}

fn snapshot(registry: &Registry) -> Vec<RunRecord> {
    registry
        .names()
        .iter()
        .filter_map(|name| registry.with_record(name, RunRecord::clone))
        .collect()
}

fn maybe_load_config(path: &Path, explicit: bool) -> Result<Option<Config>, AppError> {
    if !path.exists() {
        if explicit {
            return Err(AppError::usage(format!(
                "config file {} not found",
                output::accent(&path.display().to_string())
            )));
        }
        return Ok(None);
    }

    config::load(path).map(Some).map_err(|err| {
        if err.starts_with("read config:") {
            AppError::internal(err)
        } else {
            AppError::usage(err)
        }
    })
}

fn write_json<T: Serialize>(value: &T, what: &str) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(|e| AppError::internal(format!("encode {what} json: {e}")))?;
    writeln!(stdout).map_err(|e| AppError::internal(format!("write output: {e}")))
}

fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct Issue<'a> {
        field: &'a str,
        message: &'a str,
    }

    #[derive(Serialize)]
    struct ValidateOutput<'a> {
        valid: bool,
        config: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        issues: Option<Vec<Issue<'a>>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<&'a str>,
    }

    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config_path_text = config_path.display().to_string();

    let cfg = match config::parse(&config_path) {
        Ok(cfg) => cfg,
        Err(err) => {
            if args.json {
                write_json(
                    &ValidateOutput {
                        valid: false,
                        config: &config_path_text,
                        issues: None,
                        error: Some(&err),
                    },
                    "validate",
                )?;
            }
            return Err(AppError::usage(err));
        }
    };

    match config::validate(&cfg) {
        Ok(()) => {
            if args.json {
                write_json(
                    &ValidateOutput {
                        valid: true,
                        config: &config_path_text,
                        issues: None,
                        error: None,
                    },
                    "validate",
                )?;
            } else {
                println!("valid {}", output::accent(&config_path_text));
            }
            Ok(())
        }
        Err(err) => {
            if args.json {
                let issues: Vec<Issue<'_>> = err
                    .issues
                    .iter()
                    .map(|issue| Issue {
                        field: &issue.field,
                        message: &issue.message,
                    })
                    .collect();
                let message = err.to_string();
                write_json(
                    &ValidateOutput {
                        valid: false,
                        config: &config_path_text,
                        issues: Some(issues),
                        error: Some(&message),
                    },
                    "validate",
                )?;
            }
            Err(err.into())
        }
    }
}

fn run_completion(args: CompletionArgs) -> Result<(), AppError> {
    let mut cmd = Cli::command();
    let mut stdout = io::stdout().lock();

    match args.shell {
        Shell::Bash => generate_completion(clap_complete::shells::Bash, &mut cmd, &mut stdout),
        Shell::Zsh => generate_completion(clap_complete::shells::Zsh, &mut cmd, &mut stdout),
        Shell::Fish => generate_completion(clap_complete::shells::Fish, &mut cmd, &mut stdout),
        Shell::Powershell => {
            generate_completion(clap_complete::shells::PowerShell, &mut cmd, &mut stdout)
        }
    }
    .map_err(|e| AppError::internal(format!("generate completion: {e}")))
}

fn generate_completion<G: Generator>(
    generator: G,
    cmd: &mut clap::Command,
    writer: &mut impl Write,
) -> Result<(), io::Error> {
    generate(generator, cmd, "flakewatch", writer);
    writer.flush()
}
