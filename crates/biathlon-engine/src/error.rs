//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that can end a run, so `main` can
//! propagate with `?`.

use std::path::PathBuf;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: biathlon_core::config::ConfigError,
    },

    /// The event log could not be opened.
    #[error("cannot open event log {}: {source}", path.display())]
    OpenLog {
        /// Path that was given on the command line.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Replaying the log failed.
    #[error("race error: {source}")]
    Race {
        /// The underlying replay error.
        #[from]
        source: biathlon_core::race::RaceError,
    },

    /// Writing narration or the results table failed.
    #[error("output error: {source}")]
    Output {
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The replay task panicked or was aborted.
    #[error("replay task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },

    /// The run was interrupted before the log was exhausted.
    #[error("cancelled after {lines_read} lines; no results produced")]
    Cancelled {
        /// Lines processed before the stop.
        lines_read: u64,
    },
}
