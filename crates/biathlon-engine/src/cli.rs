//! Command-line arguments.

use std::path::PathBuf;

use biathlon_core::operator::ErrorPolicy;
use clap::{Parser, ValueEnum};

/// Replay a biathlon event log and print the results table.
#[derive(Debug, Parser)]
#[command(name = "biathlon-engine")]
#[command(version)]
pub struct Args {
    /// Path to the race configuration (JSON)
    pub config: PathBuf,

    /// Path to the event log
    pub events: PathBuf,

    /// What to do with an event that cannot be applied
    #[arg(long, value_enum, default_value = "abort")]
    pub on_error: OnError,

    /// Diagnostic log format on stderr
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Do not print the per-event narration
    #[arg(short, long)]
    pub quiet: bool,
}

/// `--on-error` choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnError {
    /// Stop at the first bad line.
    Abort,
    /// Log the bad line and continue.
    Skip,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Abort => Self::Abort,
            OnError::Skip => Self::Skip,
        }
    }
}

/// `--log-format` choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["biathlon-engine", "config.json", "events"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config.json"));
        assert_eq!(args.events, PathBuf::from("events"));
        assert_eq!(args.on_error, OnError::Abort);
        assert_eq!(args.log_format, LogFormat::Text);
        assert!(!args.quiet);
    }

    #[test]
    fn all_flags() {
        let args = Args::try_parse_from([
            "biathlon-engine",
            "--on-error",
            "skip",
            "--log-format",
            "json",
            "--quiet",
            "config.json",
            "events",
        ])
        .unwrap();
        assert_eq!(ErrorPolicy::from(args.on_error), ErrorPolicy::Skip);
        assert_eq!(args.log_format, LogFormat::Json);
        assert!(args.quiet);
    }

    #[test]
    fn both_paths_required() {
        assert!(Args::try_parse_from(["biathlon-engine", "config.json"]).is_err());
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(
            Args::try_parse_from(["biathlon-engine", "--on-error", "retry", "c", "e"]).is_err()
        );
    }
}
