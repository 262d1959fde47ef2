//! Durable storage for the smile score.
//!
//! The store holds a single decimal number as plain text. [`FileStore`]
//! replaces the file atomically: the new value is written to a sibling temp
//! file, synced to disk and renamed over the target, so a reader sees either
//! the old value or the new one, even after a crash.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, ScoreError};

/// Storage for the last known score.
pub trait ScoreStore {
    /// Returns the raw stored text, or `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<String>>;

    /// Replaces the stored value with `score`.
    fn save(&mut self, score: f64) -> Result<()>;

    /// Human-readable location of the store, used in log messages.
    fn location(&self) -> String;
}

/// Formats a score the way it is written to a store.
///
/// Uses the shortest representation that parses back to the same `f64`.
pub fn format_score(score: f64) -> String {
    score.to_string()
}

/// Score stored in a plain text file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by the file at `path`. The file does not need to exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map_or_else(|| "score".into(), |name| name.to_string_lossy());
        let tmp_name = format!(".{file_name}.tmp.{}", std::process::id());
        self.path.with_file_name(tmp_name)
    }

    fn write_atomic(&self, contents: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.temp_path();
        let written = Self::write_synced(&tmp_path, contents)
            .and_then(|()| fs::rename(&tmp_path, &self.path));
        if written.is_err() {
            fs::remove_file(&tmp_path).ok();
        }
        written
    }

    /// Writes `contents` and flushes them to disk before returning.
    fn write_synced(path: &Path, contents: &str) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    }
}

impl ScoreStore for FileStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, score: f64) -> Result<()> {
        self.write_atomic(&format_score(score))
            .map_err(|e| ScoreError::persist_failed(&self.path, e.to_string()))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store, used when no durable location is wanted and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contents: Option<String>,
    saves: usize,
    fail_saves: bool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `contents`.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
            ..Self::default()
        }
    }

    /// Makes every subsequent save fail, leaving the contents unchanged.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Current stored text.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Number of successful saves.
    pub const fn saves(&self) -> usize {
        self.saves
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.contents.clone())
    }

    fn save(&mut self, score: f64) -> Result<()> {
        if self.fail_saves {
            return Err(ScoreError::persist_failed("<memory>", "store is read-only"));
        }
        self.contents = Some(format_score(score));
        self.saves += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
