//! The replay loop: read an event log line by line and drive the dispatcher.
//!
//! Each line is parsed with [`crate::event_log::parse_bytes`] and applied
//! with [`EventDispatcher::dispatch`]. The [`StopSignal`] is polled before
//! every line, so a stop request takes effect between events and never in
//! the middle of one.
//!
//! Failures are handled according to the [`ErrorPolicy`]: `Abort` returns
//! the first failure tagged with its 1-based line number, `Skip` logs it
//! and moves on.

use std::io::BufRead;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dispatch::{DispatchError, Dispatched, EventDispatcher, Narrator};
use crate::event_log::{LogError, parse_bytes};
use crate::operator::{ErrorPolicy, RunEndReason, StopSignal};

/// Why a single log line could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// The line is not a well-formed event.
    #[error(transparent)]
    Log(#[from] LogError),

    /// The event was rejected by the race context.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Errors that end a replay.
#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    /// Reading the log failed.
    #[error("failed to read event log: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A line failed under the abort policy.
    #[error("line {line}: {source}")]
    Line {
        /// 1-based line number in the log.
        line: u64,
        /// What went wrong on that line.
        source: EventError,
    },
}

/// How a replay should behave.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// What to do with a rejected line.
    pub policy: ErrorPolicy,
    /// Polled between lines.
    pub stop: StopSignal,
}

/// Counters describing a finished replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Why the replay ended.
    pub end_reason: RunEndReason,
    /// Lines read, including blank and skipped ones.
    pub lines_read: u64,
    /// Events applied to a runner.
    pub events_applied: u64,
    /// Lines rejected under the skip policy.
    pub events_skipped: u64,
    /// Events with an unknown id.
    pub unknown_events: u64,
}

impl RunSummary {
    const fn new() -> Self {
        Self {
            end_reason: RunEndReason::Completed,
            lines_read: 0,
            events_applied: 0,
            events_skipped: 0,
            unknown_events: 0,
        }
    }
}

/// Replay every line of `reader` against `dispatcher`.
///
/// Returns a summary with [`RunEndReason::Cancelled`] if the stop signal was
/// raised before the log was exhausted.
pub fn run_event_log<R: BufRead>(
    mut reader: R,
    dispatcher: &mut EventDispatcher,
    narrator: &mut dyn Narrator,
    options: &RunOptions,
) -> Result<RunSummary, RaceError> {
    let mut summary = RunSummary::new();
    let mut line = Vec::new();
    info!(policy = ?options.policy, "replaying event log");

    loop {
        if options.stop.is_stop_requested() {
            return Ok(cancelled(summary));
        }

        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        summary.lines_read = summary.lines_read.saturating_add(1);
        let line_no = summary.lines_read;

        match apply_line(&line, dispatcher, narrator) {
            Ok(None) => {}
            Ok(Some(Dispatched::Applied)) => {
                summary.events_applied = summary.events_applied.saturating_add(1);
                debug!(line = line_no, "event applied");
            }
            Ok(Some(Dispatched::Unknown)) => {
                summary.unknown_events = summary.unknown_events.saturating_add(1);
            }
            Err(source) => match options.policy {
                ErrorPolicy::Abort => {
                    return Err(RaceError::Line {
                        line: line_no,
                        source,
                    });
                }
                ErrorPolicy::Skip => {
                    summary.events_skipped = summary.events_skipped.saturating_add(1);
                    warn!(line = line_no, error = %source, "skipping rejected event");
                }
            },
        }
    }

    // A stop raised while the last line was applied still suppresses the report.
    if options.stop.is_stop_requested() {
        return Ok(cancelled(summary));
    }

    info!(
        lines_read = summary.lines_read,
        events_applied = summary.events_applied,
        events_skipped = summary.events_skipped,
        unknown_events = summary.unknown_events,
        competitors = dispatcher.competitor_count(),
        ranges_occupied = dispatcher.ranges().occupied(),
        "event log replayed"
    );
    Ok(summary)
}

fn cancelled(mut summary: RunSummary) -> RunSummary {
    summary.end_reason = RunEndReason::Cancelled;
    warn!(lines_read = summary.lines_read, "stop requested, replay cancelled");
    summary
}

fn apply_line(
    line: &[u8],
    dispatcher: &mut EventDispatcher,
    narrator: &mut dyn Narrator,
) -> Result<Option<Dispatched>, EventError> {
    let Some(record) = parse_bytes(line)? else {
        return Ok(None);
    };
    Ok(Some(dispatcher.dispatch(&record, narrator)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use biathlon_types::{CompetitorId, RunnerState};

    use super::*;
    use crate::config::RaceRules;
    use crate::dispatch::{CollectingNarrator, SilentNarrator};
    use crate::runner::Runner;

    fn rules() -> RaceRules {
        RaceRules {
            total_laps: 1,
            lap_length: 3000,
            penalty_length: 150,
            firing_lines: 1,
            targets_per_range: 5,
            start: 34_200_000,
            start_delta: 90_000,
        }
    }

    const LOG: &str = "\
[09:05:59.867] 1 1
[09:15:00.841] 2 1 09:30:00.000

[09:29:45.734] 3 1
[09:30:01.005] 4 1
[09:40:01.005] 10 1
";

    #[test]
    fn replays_whole_log() {
        let mut dispatcher = EventDispatcher::new(rules());
        let mut narrator = CollectingNarrator::default();
        let summary = run_event_log(
            Cursor::new(LOG),
            &mut dispatcher,
            &mut narrator,
            &RunOptions::default(),
        )
        .unwrap();

        assert_eq!(summary.end_reason, RunEndReason::Completed);
        assert_eq!(summary.lines_read, 6);
        assert_eq!(summary.events_applied, 5);
        assert_eq!(summary.events_skipped, 0);
        assert_eq!(narrator.lines.len(), 6);
        assert_eq!(
            dispatcher.runner(CompetitorId(1)).map(Runner::state),
            Some(RunnerState::Finished)
        );
    }

    #[test]
    fn abort_reports_line_number() {
        let log = "[09:05:59.867] 1 1\n[09:05:59.900] 1 1\n[09:06:00.000] 1 2\n";
        let mut dispatcher = EventDispatcher::new(rules());
        let err = run_event_log(
            Cursor::new(log),
            &mut dispatcher,
            &mut SilentNarrator,
            &RunOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            RaceError::Line {
                line: 2,
                source: EventError::Dispatch(DispatchError::DuplicateCompetitor(CompetitorId(1))),
            }
        ));
        assert!(dispatcher.runner(CompetitorId(2)).is_none());
    }

    #[test]
    fn skip_continues_past_bad_lines() {
        let log = "[09:05:59.867] 1 1\nnot an event\n[09:06:00.000] 4 1\n[09:06:01.000] 1 2\n[09:06:02.000] 42 2\n";
        let mut dispatcher = EventDispatcher::new(rules());
        let options = RunOptions {
            policy: ErrorPolicy::Skip,
            ..RunOptions::default()
        };
        let summary =
            run_event_log(Cursor::new(log), &mut dispatcher, &mut SilentNarrator, &options)
                .unwrap();

        assert_eq!(summary.lines_read, 5);
        assert_eq!(summary.events_applied, 2);
        assert_eq!(summary.events_skipped, 2);
        assert_eq!(summary.unknown_events, 1);
        assert_eq!(dispatcher.competitor_count(), 2);
        assert_eq!(
            dispatcher.runner(CompetitorId(1)).map(Runner::state),
            Some(RunnerState::Registered)
        );
    }

    #[test]
    fn malformed_line_aborts() {
        let log = "[09:05:59] 1 1\n";
        let mut dispatcher = EventDispatcher::new(rules());
        let err = run_event_log(
            Cursor::new(log),
            &mut dispatcher,
            &mut SilentNarrator,
            &RunOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RaceError::Line {
                line: 1,
                source: EventError::Log(_)
            }
        ));
    }

    #[test]
    fn stop_before_first_line_cancels() {
        let options = RunOptions::default();
        options.stop.request_stop();
        let mut dispatcher = EventDispatcher::new(rules());
        let mut narrator = CollectingNarrator::default();
        let summary =
            run_event_log(Cursor::new(LOG), &mut dispatcher, &mut narrator, &options).unwrap();

        assert_eq!(summary.end_reason, RunEndReason::Cancelled);
        assert_eq!(summary.lines_read, 0);
        assert!(narrator.lines.is_empty());
        assert_eq!(dispatcher.competitor_count(), 0);
    }

    /// Raises the stop signal as soon as the first line is narrated.
    struct StopAfterFirst {
        stop: StopSignal,
        seen: usize,
    }

    impl Narrator for StopAfterFirst {
        fn narrate(&mut self, _line: &str) {
            self.seen = self.seen.saturating_add(1);
            self.stop.request_stop();
        }
    }

    #[test]
    fn stop_takes_effect_between_lines() {
        let options = RunOptions::default();
        let mut narrator = StopAfterFirst {
            stop: options.stop.clone(),
            seen: 0,
        };
        let mut dispatcher = EventDispatcher::new(rules());
        let summary =
            run_event_log(Cursor::new(LOG), &mut dispatcher, &mut narrator, &options).unwrap();

        assert_eq!(summary.end_reason, RunEndReason::Cancelled);
        assert_eq!(summary.lines_read, 1);
        assert_eq!(narrator.seen, 1);
        assert_eq!(dispatcher.competitor_count(), 1);
    }

    #[test]
    fn stop_during_last_line_cancels() {
        let options = RunOptions::default();
        let mut narrator = StopAfterFirst {
            stop: options.stop.clone(),
            seen: 0,
        };
        let mut dispatcher = EventDispatcher::new(rules());
        let summary = run_event_log(
            Cursor::new("[09:05:59.867] 1 1\n"),
            &mut dispatcher,
            &mut narrator,
            &options,
        )
        .unwrap();

        assert_eq!(summary.end_reason, RunEndReason::Cancelled);
        assert_eq!(summary.lines_read, 1);
        assert_eq!(summary.events_applied, 1);
    }

    #[test]
    fn skip_survives_invalid_utf8() {
        let log: &[u8] = b"[09:05:59.867] 1 1\n\xff\xfe junk\n[09:06:00.000] 1 2";
        let mut dispatcher = EventDispatcher::new(rules());
        let options = RunOptions {
            policy: ErrorPolicy::Skip,
            ..RunOptions::default()
        };
        let summary = run_event_log(log, &mut dispatcher, &mut SilentNarrator, &options).unwrap();

        assert_eq!(summary.end_reason, RunEndReason::Completed);
        assert_eq!(summary.lines_read, 3);
        assert_eq!(summary.events_skipped, 1);
        assert_eq!(dispatcher.competitor_count(), 2);
    }

    #[test]
    fn abort_reports_invalid_utf8_line() {
        let log: &[u8] = b"[09:05:59.867] 1 1\n\xff\xfe junk\n";
        let mut dispatcher = EventDispatcher::new(rules());
        let err = run_event_log(log, &mut dispatcher, &mut SilentNarrator, &RunOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            RaceError::Line {
                line: 2,
                source: EventError::Log(LogError::NotUtf8 { .. })
            }
        ));
    }
}
