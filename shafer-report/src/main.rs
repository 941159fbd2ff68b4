use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use thiserror::Error;

use shafer_core::{CombinationEngine, ShaferError};
use shafer_sources::{load_session, EvidenceDocument, EvidenceSession, SourceError};

mod config;
mod report;

use config::{ConfigError, ReportConfig};

/// Built-in two-sensor evidence used by `--demo`.
const DEMO_EVIDENCE: &str = include_str!("../fixtures/two_sensors.json");

/// Fuse independent evidence sources with Dempster's rule of combination.
#[derive(Parser, Debug)]
#[command(name = "shafer", version, about)]
struct Cli {
    /// Evidence file: `.json` evidence document, anything else is read as CSV
    #[arg(value_name = "INPUT", required_unless_present = "demo")]
    input: Option<PathBuf>,

    /// Combine the built-in two-sensor demo evidence
    #[arg(long, conflicts_with = "input")]
    demo: bool,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,

    /// TOML file with [engine] and [report] settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of ranked hypotheses to print
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Log progress at info level (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Combine(#[from] ShaferError),

    #[error("Failed to write report: {0}")]
    Output(#[from] io::Error),

    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    fn user_message(&self) -> String {
        match self {
            CliError::Combine(ShaferError::TotalConflict { .. }) => {
                "evidence sources are mutually exclusive; cannot combine".to_string()
            }
            other => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        log::debug!("{:?}", e);
        eprintln!("Error: {}", e.user_message());
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    };
    if cli.top.is_some() {
        config.report.top = cli.top;
    }

    let load_start = Instant::now();
    let session = load(cli)?;
    let load_ms = load_start.elapsed().as_millis();

    let engine = CombinationEngine::with_config(config.engine.clone())?;
    let combine_start = Instant::now();
    let fused = session.combine(&engine)?;
    let combine_ms = combine_start.elapsed().as_millis();

    log::info!(
        "Combined {} sources in {}ms; conflict = {:.6} (per step: {:?})",
        fused.source_count(),
        combine_ms,
        fused.conflict(),
        fused.step_conflicts()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        let json = report::build_json(&session, &fused, &config.report);
        serde_json::to_writer_pretty(&mut out, &json)?;
        writeln!(out)?;
    } else {
        report::render_human(&mut out, &session, &fused, &config.report)?;
        writeln!(out)?;
        writeln!(
            out,
            "  \u{23f1}  Evidence loaded in {}ms \u{00b7} Combined in {}ms",
            load_ms, combine_ms
        )?;
        writeln!(out)?;
    }
    Ok(())
}

fn load(cli: &Cli) -> Result<EvidenceSession, CliError> {
    match &cli.input {
        Some(path) if !cli.demo => {
            log::info!("Loading evidence from {}", path.display());
            Ok(load_session(path)?)
        }
        _ => {
            log::info!("Using built-in two-sensor demo evidence");
            Ok(EvidenceDocument::from_json_str(DEMO_EVIDENCE)?.into_session()?)
        }
    }
}
