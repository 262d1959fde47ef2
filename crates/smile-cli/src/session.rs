//! The tick loop: frames in, score and milestone messages out.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use chrono::{DateTime, Utc};
use smile_score::{display_score, ScoreEngine, ScoreStore, SignalLine, SmileDetector};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Settings for one tracking session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Time that timestamped input lines are measured from.
    pub started_at: DateTime<Utc>,
    /// Minimum time between periodic saves.
    pub save_interval: Duration,
    /// Suppress the running score lines.
    pub quiet: bool,
}

/// Why the tick loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The input stream ended.
    EndOfInput,
    /// A quit line was read.
    Quit,
    /// The shutdown signal fired.
    Interrupted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndOfInput => write!(f, "end_of_input"),
            Self::Quit => write!(f, "quit"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    /// Why the loop stopped.
    pub reason: StopReason,
    /// Number of ticks fed to the engine.
    pub ticks: u64,
}

/// Runs ticks until the input ends, a quit line arrives or `shutdown` resolves.
///
/// Each input line is one frame. Milestone messages and score changes are
/// written to `out`. A failed periodic save is logged and the loop keeps
/// going; the caller is responsible for the final save.
pub async fn run_session<S, D, R, W, F>(
    engine: &mut ScoreEngine<S>,
    detector: &mut D,
    input: R,
    out: &mut W,
    options: &SessionOptions,
    shutdown: F,
) -> std::io::Result<SessionSummary>
where
    S: ScoreStore,
    D: SmileDetector<Frame = str>,
    R: AsyncBufRead + Unpin,
    W: Write,
    F: Future<Output = std::io::Result<()>>,
{
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    let mut shown = display_score(engine.score());
    let mut ticks = 0u64;
    let mut shutdown_unavailable = false;

    let reason = loop {
        let line = tokio::select! {
            signal = &mut shutdown, if !shutdown_unavailable => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "Cannot listen for Ctrl+C; use 'q' to quit");
                    shutdown_unavailable = true;
                    continue;
                }
                tracing::info!("Received Ctrl+C, shutting down");
                break StopReason::Interrupted;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            break StopReason::EndOfInput;
        };

        let signal = SignalLine::parse(&line);
        if signal.is_quit() {
            break StopReason::Quit;
        }

        let now = tick_time(options.started_at, signal.offset_secs);
        let smiling = detector.detect(signal.verdict);
        let result = engine.tick(smiling, now);
        ticks += 1;

        for milestone in &result.newly_achieved {
            writeln!(out, "{}", milestone.message)?;
        }

        let score = result.display_score();
        if score != shown {
            shown = score;
            if !options.quiet {
                writeln!(out, "Smile Score: {score}")?;
            }
        }

        if let Err(e) = engine.persist_if_due(now, options.save_interval) {
            tracing::warn!(error = %e, "Periodic save failed, keeping score in memory");
        }
    };

    tracing::debug!(reason = %reason, ticks, "Session loop finished");
    Ok(SessionSummary { reason, ticks })
}

/// A finished session together with its final save.
#[derive(Debug)]
pub struct SessionOutcome {
    /// How the tick loop ended.
    pub session: std::io::Result<SessionSummary>,
    /// Result of the save made after the loop.
    pub saved: smile_score::Result<()>,
}

/// Runs a session, then saves the score whatever ended the loop.
///
/// The save also happens when the input stream fails, so a read error
/// never loses the points earned before it.
pub async fn run_and_save<S, D, R, W, F>(
    engine: &mut ScoreEngine<S>,
    detector: &mut D,
    input: R,
    out: &mut W,
    options: &SessionOptions,
    shutdown: F,
) -> SessionOutcome
where
    S: ScoreStore,
    D: SmileDetector<Frame = str>,
    R: AsyncBufRead + Unpin,
    W: Write,
    F: Future<Output = std::io::Result<()>>,
{
    let session = run_session(engine, detector, input, out, options, shutdown).await;
    let saved = engine.persist_now(Utc::now());
    SessionOutcome { session, saved }
}

/// Tick time for a line: session start plus its offset, or the wall clock.
fn tick_time(started_at: DateTime<Utc>, offset_secs: Option<f64>) -> DateTime<Utc> {
    offset_secs
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .and_then(|offset| chrono::Duration::from_std(offset).ok())
        .map_or_else(Utc::now, |offset| started_at + offset)
}
