//! Case Viability Core - scoring and adaptive balancing engine
//!
//! The main entry point for cv-core, handling:
//! - Rule-based scoring of historical case records
//! - Class imbalance analysis and resampling
//! - Strategy comparison and classifier selection
//! - Single-case recommendations
//! - Configuration inspection

use std::fs::File;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use cv_common::{
    CaseRecord, Error, ModelKind, OutputFormat, Region, Result, Strategy, StructuredError,
    SCHEMA_VERSION,
};
use cv_config::{list_presets, PresetName};
use cv_core::config::{load_config, ConfigOptions, ResolvedConfig};
use cv_core::dataset::{read_records_path, write_balanced, write_scored};
use cv_core::exit_codes::ExitCode;
use cv_core::log_event;
use cv_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use cv_core::pipeline::{Pipeline, PreparedData};
use serde_json::{json, Value};

/// Case Viability Core - score cases, balance training data, select classifiers
#[derive(Parser)]
#[command(name = "cv-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to engine.json (overrides CV_CONFIG and the config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Built-in preset to use when no config file is given
    #[arg(long, global = true)]
    preset: Option<PresetName>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score every record and summarise the resulting labels
    Score(ScoreArgs),

    /// Measure class imbalance and recommend a strategy
    Analyze(InputArgs),

    /// Resample the scored dataset with one strategy
    Balance(BalanceArgs),

    /// Evaluate strategies on a held-out split and pick the best
    Compare(CompareArgs),

    /// Train candidate classifiers and select one by held-out AUC
    Select(SelectArgs),

    /// Recommend accept or reject for a single case
    Recommend(RecommendArgs),

    /// Inspect and validate configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// CSV file of historical case records
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Calibrate value, success and potential bands from the input
    #[arg(long)]
    derive_criteria: bool,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Write the scored records as CSV
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BalanceArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Strategy to apply (auto picks from the imbalance ratio)
    #[arg(long, short = 's', default_value = "auto")]
    strategy: Strategy,

    /// Write the balanced dataset as CSV
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CompareArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Strategies to compare, comma separated (default: configured set)
    #[arg(long, value_delimiter = ',')]
    strategies: Vec<Strategy>,

    /// Write the winner applied to the full dataset as CSV
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SelectArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Strategy used to balance the training partition
    #[arg(long, short = 's', default_value = "auto")]
    strategy: Strategy,

    /// Candidate models, comma separated (default: configured set)
    #[arg(long, value_delimiter = ',')]
    models: Vec<ModelKind>,
}

#[derive(Args, Debug)]
struct RecommendArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Claimed amount; omit when unknown
    #[arg(long)]
    amount: Option<f64>,

    /// The amount is an estimate rather than a documented claim
    #[arg(long)]
    amount_estimated: bool,

    #[arg(long)]
    subject: Option<String>,

    #[arg(long)]
    problem: Option<String>,

    /// Macro-region (Norte, Nordeste, Centro-Oeste, Sudeste, Sul)
    #[arg(long)]
    region: Option<String>,

    /// Two-letter state code; fills the region when none is given
    #[arg(long)]
    state: Option<String>,

    #[arg(long)]
    year: Option<i32>,

    /// Train and select a classifier on the input and use its probability
    #[arg(long)]
    with_model: bool,

    /// Strategy used to balance the training partition (with --with-model)
    #[arg(long, short = 's', default_value = "auto")]
    strategy: Strategy,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration and where it came from
    Show,

    /// Validate a configuration file
    Validate {
        /// File to validate (default: the resolved configuration)
        path: Option<PathBuf>,
    },

    /// List built-in presets
    Presets,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Score(_) => "score",
            Commands::Analyze(_) => "analyze",
            Commands::Balance(_) => "balance",
            Commands::Compare(_) => "compare",
            Commands::Select(_) => "select",
            Commands::Recommend(_) => "recommend",
            Commands::Config(_) => "config",
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            use clap::error::ErrorKind;
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Clean,
                _ => ExitCode::ArgsError,
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id());
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "cv-core starting",
        command = cli.command.name(),
        version = env!("CARGO_PKG_VERSION")
    );

    let result = match &cli.command {
        Commands::Score(args) => run_score(&cli.global, &ctx, args),
        Commands::Analyze(args) => run_analyze(&cli.global, &ctx, args),
        Commands::Balance(args) => run_balance(&cli.global, &ctx, args),
        Commands::Compare(args) => run_compare(&cli.global, &ctx, args),
        Commands::Select(args) => run_select(&cli.global, &ctx, args),
        Commands::Recommend(args) => run_recommend(&cli.global, &ctx, args),
        Commands::Config(args) => run_config(&cli.global, &ctx, args),
    };

    let exit_code = match result {
        Ok(payload) => {
            output_payload(&cli.global, &payload);
            ExitCode::Clean
        }
        Err(err) => output_error(&cli.global, &ctx, log_config.format, cli.command.name(), &err),
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Init,
        "cv-core finished",
        exit_code = exit_code.as_i32()
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Shared helpers
// ============================================================================

fn resolve(global: &GlobalOpts, ctx: &LogContext) -> Result<ResolvedConfig> {
    let options = ConfigOptions {
        config_path: global.config.clone(),
        preset: global.preset,
    };
    let resolved = match load_config(&options) {
        Ok(resolved) => resolved,
        Err(err) => {
            let message = err.to_string();
            log_event!(
                ctx,
                ERROR,
                event_names::CONFIG_ERROR,
                Stage::Init,
                "configuration rejected",
                error = message.as_str()
            );
            return Err(err);
        }
    };
    let source = resolved.paths.source.to_string();
    log_event!(
        ctx,
        INFO,
        event_names::CONFIG_LOADED,
        Stage::Init,
        "configuration loaded",
        source = source.as_str(),
        config_hash = resolved.snapshot.short_id()
    );
    Ok(resolved)
}

/// Resolve configuration, read the input and run the scoring pass.
fn prepare(
    global: &GlobalOpts,
    ctx: &LogContext,
    input: &InputArgs,
) -> Result<(ResolvedConfig, Pipeline, PreparedData)> {
    let resolved = resolve(global, ctx)?;
    let ctx = ctx.clone().with_config_id(resolved.snapshot.short_id());

    let records = read_records_path(&input.input)?;
    let path = input.input.display().to_string();
    log_event!(
        ctx,
        INFO,
        event_names::INPUT_LOADED,
        Stage::Init,
        "input loaded",
        path = path.as_str(),
        records = records.len()
    );

    let pipeline = Pipeline::new(resolved.config.clone(), ctx)
        .with_config_hash(resolved.config_hash())
        .with_derived_criteria(input.derive_criteria);
    let data = pipeline.prepare(records)?;
    Ok((resolved, pipeline, data))
}

/// Wrap a command body with the fields every payload carries.
fn envelope(command: &str, ctx: &LogContext, summary: String, body: Value) -> Value {
    let mut payload = json!({
        "schema_version": SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "run_id": ctx.run_id,
        "command": command,
        "summary": summary,
    });
    if let (Value::Object(target), Value::Object(fields)) = (&mut payload, body) {
        target.extend(fields);
    }
    payload
}

fn create_output(path: &Path) -> Result<File> {
    Ok(File::create(path)?)
}

fn output_payload(global: &GlobalOpts, payload: &Value) {
    match global.format {
        OutputFormat::Json => println!("{payload}"),
        OutputFormat::Pretty => match serde_json::to_string_pretty(payload) {
            Ok(text) => println!("{text}"),
            Err(_) => println!("{payload}"),
        },
        OutputFormat::Summary => {
            let summary = payload["summary"].as_str().unwrap_or_default();
            println!("[{}] {}", payload["run_id"].as_str().unwrap_or_default(), summary);
        }
    }
}

/// Report an error on stderr and map it to an exit code.
fn output_error(
    global: &GlobalOpts,
    ctx: &LogContext,
    log_format: LogFormat,
    command: &str,
    err: &Error,
) -> ExitCode {
    let exit_code = ExitCode::from(err);
    let structured = StructuredError::from(err);

    if log_format == LogFormat::Jsonl {
        let event = ctx
            .error(event_names::INTERNAL_ERROR, Stage::Init, err.to_string())
            .with_field("command", command)
            .with_field("code", structured.code)
            .with_field("exit_code", exit_code.code_name());
        eprintln!("{}", event.to_jsonl());
    }

    match global.format {
        OutputFormat::Summary => {
            eprintln!("[{}] {} error: {}", ctx.run_id, command, err);
            eprintln!("hint: {}", err.remediation());
        }
        _ => {
            let response = json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "run_id": ctx.run_id,
                "command": command,
                "status": "error",
                "exit_code": exit_code.code_name(),
                "error": structured,
            });
            eprintln!("{response}");
        }
    }
    exit_code
}

// ============================================================================
// Commands
// ============================================================================

fn run_score(global: &GlobalOpts, ctx: &LogContext, args: &ScoreArgs) -> Result<Value> {
    let (resolved, pipeline, data) = prepare(global, ctx, &args.input)?;
    if let Some(path) = &args.output {
        write_scored(create_output(path)?, &data.records, &data.results)?;
    }
    let summary = pipeline.summarize(&data);
    let viable = data.labels.iter().filter(|l| l.is_viable()).count();
    Ok(envelope(
        "score",
        ctx,
        format!(
            "{} records scored, {} viable, {} not viable",
            summary.records,
            viable,
            summary.records - viable
        ),
        json!({
            "config_hash": resolved.config_hash(),
            "scoring": summary,
            "output": args.output,
        }),
    ))
}

fn run_analyze(global: &GlobalOpts, ctx: &LogContext, args: &InputArgs) -> Result<Value> {
    let (resolved, pipeline, data) = prepare(global, ctx, args)?;
    let report = pipeline.analyze(&data)?;
    Ok(envelope(
        "analyze",
        ctx,
        format!(
            "ratio {:.2} ({:?}), recommended strategy {}",
            report.ratio, report.level, report.recommended
        ),
        json!({
            "config_hash": resolved.config_hash(),
            "imbalance": report,
        }),
    ))
}

fn run_balance(global: &GlobalOpts, ctx: &LogContext, args: &BalanceArgs) -> Result<Value> {
    let (_, pipeline, data) = prepare(global, ctx, &args.input)?;
    let balanced = pipeline.balance(&data, args.strategy)?;
    if let Some(path) = &args.output {
        write_balanced(create_output(path)?, &balanced)?;
    }
    let provenance = &balanced.provenance;
    Ok(envelope(
        "balance",
        ctx,
        format!(
            "{} applied: {} rows ({} synthetic, {} removed)",
            provenance.strategy_applied,
            balanced.len(),
            provenance.synthetic_rows,
            provenance.removed_rows
        ),
        json!({
            "rows": balanced.len(),
            "provenance": provenance,
            "output": args.output,
        }),
    ))
}

fn run_compare(global: &GlobalOpts, ctx: &LogContext, args: &CompareArgs) -> Result<Value> {
    let (resolved, pipeline, data) = prepare(global, ctx, &args.input)?;
    let comparison = pipeline.compare(&data, &args.strategies)?;
    let pre_post = pipeline.compare_pre_post(&data, comparison.winner)?;
    if let Some(path) = &args.output {
        write_balanced(create_output(path)?, &comparison.balanced)?;
    }
    Ok(envelope(
        "compare",
        ctx,
        format!(
            "{} strategies evaluated, winner {} (AUC {:+.4} vs unbalanced)",
            comparison.ranking.len(),
            comparison.winner,
            pre_post.auc_delta
        ),
        json!({
            "config_hash": resolved.config_hash(),
            "comparison": comparison,
            "pre_post": pre_post,
            "output": args.output,
        }),
    ))
}

fn run_select(global: &GlobalOpts, ctx: &LogContext, args: &SelectArgs) -> Result<Value> {
    let (_, pipeline, data) = prepare(global, ctx, &args.input)?;
    let selection = pipeline.select(&data, args.strategy, &args.models)?;
    let metrics = selection.winner_metrics();
    Ok(envelope(
        "select",
        ctx,
        format!(
            "winner {} (AUC {:.4}, balanced accuracy {:.4}) of {} candidates",
            selection.winner,
            metrics.auc_roc,
            metrics.balanced_accuracy,
            selection.ranked.len()
        ),
        json!({ "selection": selection }),
    ))
}

fn run_recommend(global: &GlobalOpts, ctx: &LogContext, args: &RecommendArgs) -> Result<Value> {
    let (_, pipeline, data) = prepare(global, ctx, &args.input)?;
    let record = case_from_args(args);

    let selection = if args.with_model {
        Some(pipeline.select(&data, args.strategy, &[])?)
    } else {
        None
    };
    let recommender =
        pipeline.recommender(&data, selection.as_ref().map(|s| s.model.clone()));
    let recommendation = recommender.recommend(&record)?;

    log_event!(
        ctx,
        INFO,
        event_names::RECOMMEND_COMPLETED,
        Stage::Recommend,
        "case recommended",
        grade = recommendation.grade.as_str(),
        probability = recommendation.probability
    );

    Ok(envelope(
        "recommend",
        ctx,
        format!(
            "{:?}: grade {}, score {}/10, probability {:.2}",
            recommendation.decision,
            recommendation.grade,
            recommendation.aggregate,
            recommendation.probability
        ),
        json!({
            "case": record,
            "recommendation": recommendation,
            "selection": selection,
        }),
    ))
}

fn case_from_args(args: &RecommendArgs) -> CaseRecord {
    let mut record = CaseRecord::new(args.amount.unwrap_or(0.0), String::new());
    record.amount = args.amount;
    record.amount_estimated = args.amount_estimated;
    record.subject = args.subject.clone();
    record.problem = args.problem.clone();
    if let Some(region) = &args.region {
        record = record.with_region(Region::parse(region));
    }
    if let Some(state) = &args.state {
        record = record.with_state(state.clone());
    }
    record.year = args.year;
    record
}

fn run_config(global: &GlobalOpts, ctx: &LogContext, args: &ConfigArgs) -> Result<Value> {
    match &args.command {
        ConfigCommands::Show => {
            let resolved = resolve(global, ctx)?;
            Ok(envelope(
                "config show",
                ctx,
                format!(
                    "config {} from {}",
                    resolved.snapshot.short_id(),
                    resolved.paths.source
                ),
                json!({
                    "snapshot": resolved.snapshot,
                    "config": resolved.config,
                }),
            ))
        }
        ConfigCommands::Validate { path } => {
            let options = ConfigOptions {
                config_path: path.clone().or_else(|| global.config.clone()),
                preset: global.preset,
            };
            let resolved = load_config(&options)?;
            Ok(envelope(
                "config validate",
                ctx,
                format!("config {} is valid", resolved.snapshot.short_id()),
                json!({
                    "valid": true,
                    "source": resolved.paths.source.to_string(),
                    "path": resolved.paths.engine,
                    "config_hash": resolved.config_hash(),
                }),
            ))
        }
        ConfigCommands::Presets => {
            let presets = list_presets();
            Ok(envelope(
                "config presets",
                ctx,
                PresetName::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                json!({ "presets": presets }),
            ))
        }
    }
}
