//! VizStats - data statistics for dashboard query results
//!
//! A CLI tool that loads query result snapshots, computes per-fact
//! minimum, maximum and average with the attribute labels of the extreme
//! rows, and renders a report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, config, unreadable inputs, etc.)
//!   2 - At least one snapshot failed to load or aggregate

mod analysis;
mod cli;
mod config;
mod host;
mod models;
mod report;
mod snapshot;

use analysis::AggregatorOptions;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use host::{StaticQuery, StatsProvider, VizDataStats};
use models::{Report, ReportMetadata, SnapshotReport};
use report::RenderOptions;
use snapshot::{LoadConfig, LoadOutcome, SnapshotLoader};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config can raise verbosity, so it is loaded before logging starts
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("VizStats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .vizstats.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, aggregate and report. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let loader = SnapshotLoader::new(LoadConfig::from(&config.input));
    let paths = loader.discover(&args.inputs)?;
    if paths.is_empty() {
        return Err(anyhow::anyhow!("No snapshot files found in the given inputs"));
    }

    let outcomes = loader.load_all(&paths).await;
    let options = config.aggregation.options();
    let snapshots: Vec<SnapshotReport> = outcomes
        .into_iter()
        .map(|outcome| process_snapshot(outcome, options))
        .collect();

    let failed = snapshots.iter().filter(|s| s.is_failed()).count();
    let fact_columns = snapshots
        .iter()
        .filter_map(|s| s.stats.as_ref())
        .map(|stats| stats.len())
        .sum();

    let report = Report {
        metadata: ReportMetadata {
            title: config.report.title.clone(),
            generated_at: Utc::now(),
            snapshots: snapshots.len(),
            snapshots_failed: failed,
            fact_columns,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        snapshots,
    };

    let render_options = RenderOptions::from(&config.report);
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &render_options),
        OutputFormat::Html => report::generate_html_report(&report, &render_options),
    };

    if args.stdout {
        println!("{}", output);
    } else {
        let path = output_path(&args, &config);
        std::fs::write(&path, &output)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        if !args.quiet {
            println!("📊 Snapshots: {} ({} failed)", report.snapshots.len(), failed);
            println!("   Fact columns: {}", fact_columns);
            println!("✅ Report saved to: {}", path.display());
        }
    }

    if failed > 0 {
        warn!("{} snapshot(s) failed", failed);
        return Ok(2);
    }

    Ok(0)
}

/// Turn a load outcome into a report entry, computing statistics through
/// the data statistics feature.
fn process_snapshot(outcome: LoadOutcome, options: AggregatorOptions) -> SnapshotReport {
    let snapshot = match outcome.snapshot {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("{:#}", e);
            let source = outcome.path.display().to_string();
            let name = outcome
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| source.clone());
            return SnapshotReport::failed(name, source, format!("{:#}", e));
        }
    };

    let source = snapshot.path.display().to_string();
    let row_count = snapshot.result.rows.len();
    let feature = VizDataStats::new(StaticQuery::new(snapshot.result), options);

    match feature.stats() {
        Ok(stats) => {
            let stats = stats.unwrap_or_default();
            info!("'{}': {} fact column(s)", snapshot.name, stats.len());
            debug!("'{}': facts {:?}", snapshot.name, stats.labels());
            SnapshotReport::computed(snapshot.name, source, row_count, stats)
        }
        Err(e) => {
            warn!("'{}': {}", snapshot.name, e);
            SnapshotReport {
                row_count,
                ..SnapshotReport::failed(snapshot.name, source, e.to_string())
            }
        }
    }
}

/// Resolve where the report is written.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    match args.output {
        Some(ref output) => output.clone(),
        None => PathBuf::from(&config.general.output).with_extension(args.format.extension()),
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized, so problems go to stderr directly.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", config::CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
