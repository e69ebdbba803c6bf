//! Race-log processor binary.
//!
//! Loads the race configuration, replays the event log while narrating
//! every event on stdout, and prints the results table when the log is
//! exhausted. Diagnostics go to stderr through `tracing`.
//!
//! # Startup Sequence
//!
//! 1. Parse arguments and initialize structured logging
//! 2. Load and validate the race configuration
//! 3. Open the event log
//! 4. Install the Ctrl-C listener that raises the stop signal
//! 5. Replay the log on a blocking task
//! 6. Print the results table

mod cli;
mod error;
mod narrator;

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use biathlon_core::config::{RaceConfig, RaceRules};
use biathlon_core::dispatch::{EventDispatcher, SilentNarrator};
use biathlon_core::operator::{RunEndReason, StopSignal};
use biathlon_core::race::{self, RunOptions, RunSummary};
use biathlon_core::report::ResultsTable;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, LogFormat};
use crate::error::EngineError;
use crate::narrator::WriterNarrator;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration or log cannot be read, an event
/// is rejected under the abort policy, or the run is interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Arguments and logging.
    let args = Args::parse();
    init_tracing(args.log_format);
    info!(
        config = %args.config.display(),
        events = %args.events.display(),
        "biathlon-engine starting"
    );

    // 2. Configuration.
    let rules = load_rules(&args.config)?;
    info!(
        laps = rules.total_laps,
        lap_length = rules.lap_length,
        penalty_length = rules.penalty_length,
        firing_lines = rules.firing_lines,
        start_delta_ms = rules.start_delta,
        "Configuration loaded"
    );

    // 3. Event log.
    let log = File::open(&args.events).map_err(|source| EngineError::OpenLog {
        path: args.events.clone(),
        source,
    })?;

    // 4. Stop signal.
    let stop = StopSignal::new();
    let listener = tokio::spawn(listen_for_stop(stop.clone()));

    // 5. Replay.
    let options = RunOptions {
        policy: args.on_error.into(),
        stop,
    };
    let quiet = args.quiet;
    let outcome =
        tokio::task::spawn_blocking(move || replay(log, rules, quiet, &options)).await;
    listener.abort();
    let (summary, table) = outcome.map_err(EngineError::from)??;

    // 6. Results.
    print_table(&table).map_err(|source| EngineError::Output { source })?;
    info!(
        end_reason = ?summary.end_reason,
        lines_read = summary.lines_read,
        events_skipped = summary.events_skipped,
        unknown_events = summary.unknown_events,
        competitors = table.len(),
        finished = table.finished_count(),
        still_racing = table.still_racing(),
        "biathlon-engine finished"
    );

    Ok(())
}

/// Initialize the stderr subscriber in the requested format.
fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Load and validate the race configuration.
fn load_rules(path: &Path) -> Result<RaceRules, EngineError> {
    let config = RaceConfig::from_file(path)?;
    Ok(config.rules()?)
}

/// Raise the stop signal on Ctrl-C.
async fn listen_for_stop(stop: StopSignal) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("interrupt received, stopping after the current event");
            stop.request_stop();
        }
        Err(e) => warn!(error = %e, "failed to install Ctrl-C handler"),
    }
}

/// Replay the whole log and build the results table.
///
/// Runs on a blocking thread; narration goes straight to stdout.
fn replay(
    log: File,
    rules: RaceRules,
    quiet: bool,
    options: &RunOptions,
) -> Result<(RunSummary, ResultsTable), EngineError> {
    let mut dispatcher = EventDispatcher::new(rules);
    let reader = BufReader::new(log);

    let summary = if quiet {
        race::run_event_log(reader, &mut dispatcher, &mut SilentNarrator, options)?
    } else {
        let mut narrator = WriterNarrator::new(io::stdout().lock());
        let summary = race::run_event_log(reader, &mut dispatcher, &mut narrator, options);
        narrator
            .finish()
            .map_err(|source| EngineError::Output { source })?;
        summary?
    };

    if summary.end_reason == RunEndReason::Cancelled {
        return Err(EngineError::Cancelled {
            lines_read: summary.lines_read,
        });
    }
    Ok((summary, ResultsTable::from_runners(dispatcher.runners())))
}

fn print_table(table: &ResultsTable) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{table}")?;
    out.flush()
}
