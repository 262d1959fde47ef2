//! Detection adapters.
//!
//! The engine only needs one boolean per tick. A [`SmileDetector`] turns
//! whatever the capture side produces into that boolean. Real camera
//! pipelines implement the trait themselves; [`SignalDetector`] reads
//! verdicts that an external process already wrote out as text.

/// Produces the "is smiling" verdict for one captured frame.
///
/// Called once per tick, never concurrently. Verdicts may flicker from one
/// frame to the next.
pub trait SmileDetector {
    /// Captured input for one tick.
    type Frame: ?Sized;

    /// Returns `true` if the frame shows a smile.
    fn detect(&mut self, frame: &Self::Frame) -> bool;
}

/// Words accepted as a smiling verdict, compared case-insensitively.
const SMILING_WORDS: &[&str] = &["1", "true", "yes", "y", "smile", "smiling", "😊"];

/// Detector over text verdicts, one per frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalDetector;

impl SmileDetector for SignalDetector {
    type Frame = str;

    fn detect(&mut self, frame: &str) -> bool {
        let verdict = frame.trim().to_lowercase();
        SMILING_WORDS.contains(&verdict.as_str())
    }
}

/// One line of a recorded or piped detection stream.
///
/// A line is either a bare verdict (`1`, `smile`, `0`, ...) or a verdict
/// prefixed with the tick time in seconds since the session started
/// (`2.5 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalLine<'a> {
    /// Seconds since session start, if the line carried a timestamp.
    pub offset_secs: Option<f64>,
    /// The verdict text, trimmed.
    pub verdict: &'a str,
}

impl<'a> SignalLine<'a> {
    /// Splits a raw line into its optional timestamp and verdict.
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if let Some((head, rest)) = trimmed.split_once(char::is_whitespace) {
            if let Ok(offset) = head.parse::<f64>() {
                if offset.is_finite() && offset >= 0.0 {
                    return Self {
                        offset_secs: Some(offset),
                        verdict: rest.trim(),
                    };
                }
            }
        }
        Self {
            offset_secs: None,
            verdict: trimmed,
        }
    }

    /// Returns `true` if the line asks the session to stop.
    pub fn is_quit(&self) -> bool {
        self.verdict.eq_ignore_ascii_case("q") || self.verdict.eq_ignore_ascii_case("quit")
    }
}
