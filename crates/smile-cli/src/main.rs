//! Smile Score CLI
//!
//! Reads one smile verdict per frame from stdin or a recorded file and keeps
//! a persistent smile score, announcing milestones as they are reached.

mod session;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use smile_score::{display_score, Config, FileStore, ScoreEngine, SignalDetector};
use tokio::io::{AsyncBufRead, BufReader};
use tracing_subscriber::EnvFilter;

use crate::session::{run_and_save, SessionOptions, SessionOutcome, SessionSummary};

/// Smile Score - earn points for every second you keep smiling
///
/// Each input line is one frame's verdict from a smile detector, e.g. `1`
/// or `0`, optionally prefixed with seconds since start (`2.5 1`). Enter
/// `q` or press Ctrl+C to stop; the score is saved before exit.
#[derive(Parser, Debug)]
#[command(name = "smile-score")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: smile-score.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// File holding the saved score (overrides the config file)
    #[arg(short, long, value_name = "FILE")]
    score_file: Option<String>,

    /// Read frame verdicts from a file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Seconds between periodic saves (overrides the config file)
    #[arg(long, value_name = "SECS")]
    save_interval: Option<f64>,

    /// Only print milestone messages, not every score change
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

/// How long to wait for a blocked stdin read when shutting down.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");
    tracing::debug!(input = ?args.input, "Input source");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };
    let result = runtime.block_on(run(args));
    // A pending stdin read would otherwise block runtime shutdown until the next line
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Runs a tracking session and always saves the score afterwards.
async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref score_file) = args.score_file {
        config.score_file.clone_from(score_file);
    }
    if let Some(save_interval) = args.save_interval {
        config.save_interval_secs = save_interval;
    }

    // Validated again after overrides
    let started_at = Utc::now();
    let store = FileStore::new(&config.score_file);
    let mut engine = ScoreEngine::from_config(store, &config, started_at)?;

    let input = open_input(args.input.as_deref()).await?;

    println!(
        "Smile Score Tracker Started! Current Score: {}",
        display_score(engine.score())
    );
    println!("Smile to earn points quickly! Press 'q' to quit.");

    let options = SessionOptions {
        started_at,
        save_interval: config.save_interval(),
        quiet: args.quiet,
    };
    let mut stdout = std::io::stdout();
    let SessionOutcome { session, saved } = run_and_save(
        &mut engine,
        &mut SignalDetector,
        input,
        &mut stdout,
        &options,
        tokio::signal::ctrl_c(),
    )
    .await;

    match &session {
        Ok(summary) => log_summary(summary),
        Err(e) => tracing::error!(error = %e, "Input stream failed"),
    }
    println!(
        "Session ended. Final Smile Score: {}",
        display_score(engine.score())
    );

    saved?;
    println!("✅ Progress saved successfully!");

    session?;
    Ok(())
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Opens the frame source: a recorded file, or stdin.
async fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                anyhow::anyhow!(
                    "Failed to open input '{}': {e}\n\nSuggestion: Check the path or omit --input to read from stdin",
                    path.display()
                )
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// Logs how the session ended.
fn log_summary(summary: &SessionSummary) {
    tracing::info!(
        reason = %summary.reason,
        ticks = summary.ticks,
        "Session finished"
    );
}
