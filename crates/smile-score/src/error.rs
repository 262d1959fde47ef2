//! Error types for the smile score engine.
//!
//! The engine itself never fails a tick. Errors surface only from
//! configuration loading and from durable writes, and a failed write is
//! always recoverable: the in-memory score stays valid.

use std::path::PathBuf;

/// A specialized `Result` type for smile score operations.
pub type Result<T> = std::result::Result<T, ScoreError>;

/// Errors that can occur while configuring or persisting a smile score.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your smile-score.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Persistence Errors
    // ========================================================================
    /// Writing the score to the durable store failed.
    ///
    /// The score is still held in memory; the caller may keep ticking.
    #[error("Failed to save score to '{path}': {message}\n\nSuggestion: Check write permissions and available disk space")]
    PersistFailed {
        /// Location of the durable store.
        path: PathBuf,
        /// Description of the write failure.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// I/O error while reading the saved score.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScoreError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `PersistFailed` error.
    #[must_use]
    pub fn persist_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::PersistFailed {
            path: path.into(),
            message: message.into(),
        }
    }
}
