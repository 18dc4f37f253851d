//! Command-line entry point for the collision pipeline.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use collision_pipeline::config::PipelineConfig;
use collision_pipeline::ingestion::MetadataCheck;
use collision_pipeline::PipelineResult;
use collision_pipeline::logging::{LogConfig, LogFormat, init_logging};
use collision_pipeline::observability::{
    CompositeObserver, FileObserver, PipelineObserver, TracingObserver,
};
use collision_pipeline::pipeline::{Pipeline, RunOutcome};
use collision_pipeline::store::CsvStore;
use tracing::{Level, info};

#[derive(Parser)]
#[command(
    name = "collision-pipeline",
    version,
    about = "Batch ETL for road-collision data: raw CSV to a validated star schema"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file (defaults are used when omitted).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log level.
    #[arg(long = "log-level", value_enum, default_value = "info", global = true)]
    log_level: LogLevelArg,

    /// Log output format (pretty for humans, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    /// Also append stage metrics and failures to this file.
    #[arg(long = "metrics-file", value_name = "PATH", global = true)]
    metrics_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Load the raw CSV into the store if it changed since the last ingestion.
    Ingest {
        /// Raw extract (overrides `raw_file` from the config).
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
        /// Ingest even when the file hash is unchanged.
        #[arg(long)]
        force: bool,
    },
    /// Raw table to clean table.
    Clean,
    /// Clean table to curated table.
    Curate,
    /// Curated table to star schema.
    Model {
        /// Build from the curated table as-is, without the quality rules.
        #[arg(long = "skip-quality")]
        skip_quality: bool,
    },
    /// Every stage in order.
    Run {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&log_config_from_cli(&cli)) {
        eprintln!("error: failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> PipelineResult<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::from_env(),
    };

    let metrics_file = cli.metrics_file.as_deref();
    let open = |config| open_pipeline(config, metrics_file);

    match cli.command {
        Command::Ingest { file, force } => {
            config.force_ingest |= force;
            let file = file.unwrap_or_else(|| config.raw_file.clone());
            let pipeline = open(config)?;
            match pipeline.ingest(&file)? {
                MetadataCheck::Accepted { changed: true, .. } => info!("ingested {}", file.display()),
                MetadataCheck::Accepted { changed: false, .. } => {
                    info!("{} unchanged since last ingestion", file.display())
                }
                MetadataCheck::Rejected { reason } => info!("ingestion rejected: {reason}"),
            }
        }
        Command::Clean => {
            let rows = open(config)?.clean()?.row_count();
            info!(rows, "clean table written");
        }
        Command::Curate => {
            let rows = open(config)?.curate()?.row_count();
            info!(rows, "curated table written");
        }
        Command::Model { skip_quality } => {
            config.apply_quality_rules &= !skip_quality;
            let star = open(config)?.model()?;
            info!(fact_rows = star.fact.row_count(), "star schema written");
        }
        Command::Run { file, force } => {
            config.force_ingest |= force;
            let file = file.unwrap_or_else(|| config.raw_file.clone());
            match open(config)?.run_all(&file)? {
                RunOutcome::Completed(star) => {
                    info!(fact_rows = star.fact.row_count(), "pipeline run complete")
                }
                RunOutcome::Skipped { reason } => info!("pipeline run skipped: {reason}"),
            }
        }
    }
    Ok(())
}

/// CSV-backed pipeline; with `metrics_file`, events go to both tracing and the file.
fn open_pipeline(
    config: PipelineConfig,
    metrics_file: Option<&Path>,
) -> PipelineResult<Pipeline<CsvStore>> {
    let pipeline = Pipeline::from_config(config)?;
    Ok(match metrics_file {
        Some(path) => {
            let observers: Vec<Arc<dyn PipelineObserver>> =
                vec![Arc::new(TracingObserver), Arc::new(FileObserver::new(path))];
            pipeline.with_observer(Arc::new(CompositeObserver::new(observers)))
        }
        None => pipeline,
    })
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let level = match cli.log_level {
        LogLevelArg::Error => Level::ERROR,
        LogLevelArg::Warn => Level::WARN,
        LogLevelArg::Info => Level::INFO,
        LogLevelArg::Debug => Level::DEBUG,
        LogLevelArg::Trace => Level::TRACE,
    };
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let mut config = LogConfig::default()
        .with_level(level)
        .with_format(format)
        .with_log_file(cli.log_file.clone());
    if cli.log_file.is_none() {
        config.with_ansi = io::stderr().is_terminal();
    }
    config
}
