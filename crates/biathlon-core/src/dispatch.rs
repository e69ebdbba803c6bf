//! Event dispatch: apply parsed log records to the race context.
//!
//! The [`EventDispatcher`] owns everything an event can touch: the race
//! rules, every registered [`Runner`], and the shared
//! [`FiringRangeRegistry`]. It resolves the competitor named by a record,
//! invokes the matching runner operation, keeps range occupancy in step, and
//! narrates each successful event through a [`Narrator`].
//!
//! Errors are returned, never acted upon here. Whether a failed event stops
//! the run is decided by the caller (see [`crate::race`]). A rejected event
//! leaves the context exactly as it was.

use std::collections::BTreeMap;

use biathlon_types::{CompetitorId, EventAction, EventRecord};
use tracing::{debug, warn};

use crate::config::RaceRules;
use crate::range::{FiringRangeRegistry, RangeError};
use crate::runner::{LapOutcome, Runner, RunnerError, StartOutcome};

/// Errors that can occur while applying an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The event names a competitor that never registered.
    #[error("no such competitor registered: {0}")]
    UnknownCompetitor(CompetitorId),

    /// A competitor registered twice.
    #[error("competitor {0} is already registered")]
    DuplicateCompetitor(CompetitorId),

    /// The runner refused the operation.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// The firing range is taken.
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// What happened to a dispatched record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// The event was applied to its runner.
    Applied,
    /// The event id is unknown; a diagnostic line was narrated instead.
    Unknown,
}

/// Sink for the human-readable narration of applied events.
///
/// Implementations can print to the console, collect lines for tests, or
/// discard them.
pub trait Narrator {
    /// Receive one narration line (without trailing newline).
    fn narrate(&mut self, line: &str);
}

/// A narrator that keeps every line in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectingNarrator {
    /// Lines received so far, in order.
    pub lines: Vec<String>,
}

impl Narrator for CollectingNarrator {
    fn narrate(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }
}

/// A narrator that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNarrator;

impl Narrator for SilentNarrator {
    fn narrate(&mut self, _line: &str) {}
}

/// The race context and the rules for changing it.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    rules: RaceRules,
    runners: BTreeMap<CompetitorId, Runner>,
    ranges: FiringRangeRegistry,
}

impl EventDispatcher {
    /// Create an empty race context.
    pub fn new(rules: RaceRules) -> Self {
        Self {
            rules,
            runners: BTreeMap::new(),
            ranges: FiringRangeRegistry::new(rules.firing_lines),
        }
    }

    /// Every registered runner, in ascending competitor id.
    pub fn runners(&self) -> impl Iterator<Item = &Runner> {
        self.runners.values()
    }

    /// Look up one runner.
    pub fn runner(&self, id: CompetitorId) -> Option<&Runner> {
        self.runners.get(&id)
    }

    /// Number of registered competitors.
    pub fn competitor_count(&self) -> usize {
        self.runners.len()
    }

    /// Firing range occupancy.
    pub const fn ranges(&self) -> &FiringRangeRegistry {
        &self.ranges
    }

    /// Apply one record and narrate it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the competitor is unknown or already
    /// registered, the runner refuses the transition, or the firing range
    /// is occupied. Nothing is narrated or changed in that case.
    pub fn dispatch(
        &mut self,
        record: &EventRecord,
        narrator: &mut dyn Narrator,
    ) -> Result<Dispatched, DispatchError> {
        let t = record.time_text.as_str();
        let id = record.competitor;
        debug!(competitor = %id, kind = ?record.action.kind(), time = t, "dispatching event");

        match &record.action {
            EventAction::Register => {
                if self.runners.contains_key(&id) {
                    return Err(DispatchError::DuplicateCompetitor(id));
                }
                self.runners.insert(id, Runner::new(id, self.rules));
                narrator.narrate(&format!("[{t}] The competitor({id}) registered"));
            }
            EventAction::SetDrawTime { draw, draw_text } => {
                lookup(&mut self.runners, id)?.set_draw_time(*draw)?;
                if *draw < self.rules.start {
                    warn!(competitor = %id, draw = %draw_text, "draw time before nominal race start");
                }
                narrator.narrate(&format!(
                    "[{t}] The start time for the competitor({id}) was set by a draw to {draw_text}"
                ));
            }
            EventAction::ArriveOnLine => {
                lookup(&mut self.runners, id)?.arrive_on_line()?;
                narrator.narrate(&format!("[{t}] The competitor({id}) is on the start line"));
            }
            EventAction::Start => {
                let outcome = lookup(&mut self.runners, id)?.start(record.time)?;
                narrator.narrate(&format!("[{t}] The competitor({id}) has started"));
                if let StartOutcome::Disqualified { offset } = outcome {
                    debug!(competitor = %id, offset, "competitor disqualified at start");
                    narrator.narrate(&format!("[{t}] The competitor({id}) is disqualified"));
                }
            }
            EventAction::StartFiring { range } => {
                let runner = lookup(&mut self.runners, id)?;
                self.ranges.acquire(*range, id)?;
                if let Err(err) = runner.start_firing(*range) {
                    self.ranges.release(*range);
                    return Err(err.into());
                }
                narrator.narrate(&format!(
                    "[{t}] The competitor({id}) is on the firing range({range})"
                ));
            }
            EventAction::HitTarget { target } => {
                lookup(&mut self.runners, id)?.hit_target(*target)?;
                narrator.narrate(&format!(
                    "[{t}] The target({target}) has been hit by competitor({id})"
                ));
            }
            EventAction::QuitFiring => {
                let range = lookup(&mut self.runners, id)?.quit_firing()?;
                self.ranges.release(range);
                narrator.narrate(&format!("[{t}] The competitor({id}) left the firing range"));
            }
            EventAction::EnterPenalty => {
                lookup(&mut self.runners, id)?.enter_penalty(record.time)?;
                narrator.narrate(&format!("[{t}] The competitor({id}) entered the penalty laps"));
            }
            EventAction::LeavePenalty => {
                lookup(&mut self.runners, id)?.leave_penalty(record.time)?;
                narrator.narrate(&format!("[{t}] The competitor({id}) left the penalty laps"));
            }
            EventAction::FinishLap => {
                let outcome = lookup(&mut self.runners, id)?.finish_lap(record.time)?;
                narrator.narrate(&format!("[{t}] The competitor({id}) ended the main lap"));
                if let LapOutcome::RaceFinished { total, .. } = outcome {
                    debug!(competitor = %id, total, "competitor finished");
                    narrator.narrate(&format!("[{t}] The competitor({id}) has finished"));
                }
            }
            EventAction::Abandon { comment } => {
                if let Some(range) = lookup(&mut self.runners, id)?.abandon() {
                    self.ranges.release(range);
                }
                narrator.narrate(&format!("[{t}] The competitor({id}) can`t continue: {comment}"));
            }
            EventAction::Unknown { code } => {
                debug!(competitor = %id, code, "unknown event id");
                narrator.narrate(&format!("[{t}] No such event for competitor({id})"));
                return Ok(Dispatched::Unknown);
            }
        }
        Ok(Dispatched::Applied)
    }
}

fn lookup(
    runners: &mut BTreeMap<CompetitorId, Runner>,
    id: CompetitorId,
) -> Result<&mut Runner, DispatchError> {
    runners
        .get_mut(&id)
        .ok_or(DispatchError::UnknownCompetitor(id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use biathlon_types::{RangeId, RunnerState};

    use super::*;
    use crate::event_log::parse_line;
    use crate::runner::TransitionKind;

    fn rules() -> RaceRules {
        RaceRules {
            total_laps: 2,
            lap_length: 3651,
            penalty_length: 50,
            firing_lines: 1,
            targets_per_range: 5,
            start: 34_200_000,
            start_delta: 30_000,
        }
    }

    fn apply(
        dispatcher: &mut EventDispatcher,
        narrator: &mut CollectingNarrator,
        line: &str,
    ) -> Result<Dispatched, DispatchError> {
        let record = parse_line(line).unwrap().unwrap();
        dispatcher.dispatch(&record, narrator)
    }

    fn apply_all(dispatcher: &mut EventDispatcher, lines: &[&str]) -> CollectingNarrator {
        let mut narrator = CollectingNarrator::default();
        for line in lines {
            apply(dispatcher, &mut narrator, line).unwrap();
        }
        narrator
    }

    #[test]
    fn registration_creates_runner() {
        let mut dispatcher = EventDispatcher::new(rules());
        let narrator = apply_all(&mut dispatcher, &["[09:05:59.867] 1 1"]);
        assert_eq!(narrator.lines, vec!["[09:05:59.867] The competitor(1) registered"]);
        assert_eq!(
            dispatcher.runner(CompetitorId(1)).map(Runner::state),
            Some(RunnerState::Registered)
        );
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut dispatcher = EventDispatcher::new(rules());
        let mut narrator = CollectingNarrator::default();
        apply(&mut dispatcher, &mut narrator, "[09:05:59.867] 1 1").unwrap();
        let err = apply(&mut dispatcher, &mut narrator, "[09:06:00.000] 1 1").unwrap_err();
        assert_eq!(err, DispatchError::DuplicateCompetitor(CompetitorId(1)));
        assert_eq!(narrator.lines.len(), 1);
    }

    #[test]
    fn unregistered_competitor_rejected() {
        let mut dispatcher = EventDispatcher::new(rules());
        let mut narrator = CollectingNarrator::default();
        let err = apply(&mut dispatcher, &mut narrator, "[09:30:01.005] 4 3").unwrap_err();
        assert_eq!(err, DispatchError::UnknownCompetitor(CompetitorId(3)));
        assert!(narrator.lines.is_empty());
    }

    #[test]
    fn unknown_event_is_narrated_not_failed() {
        let mut dispatcher = EventDispatcher::new(rules());
        let mut narrator = CollectingNarrator::default();
        let outcome = apply(&mut dispatcher, &mut narrator, "[09:30:01.005] 99 3").unwrap();
        assert_eq!(outcome, Dispatched::Unknown);
        assert_eq!(
            narrator.lines,
            vec!["[09:30:01.005] No such event for competitor(3)"]
        );
    }

    #[test]
    fn narrates_full_lap_with_firing() {
        let mut dispatcher = EventDispatcher::new(rules());
        let narrator = apply_all(
            &mut dispatcher,
            &[
                "[09:05:59.867] 1 1",
                "[09:15:00.841] 2 1 09:30:00.000",
                "[09:29:45.734] 3 1",
                "[09:30:01.005] 4 1",
                "[09:49:31.659] 5 1 1",
                "[09:49:33.123] 6 1 1",
                "[09:49:35.937] 7 1",
                "[09:49:37.000] 8 1",
                "[09:50:37.000] 9 1",
                "[09:59:03.872] 10 1",
            ],
        );
        assert_eq!(
            narrator.lines,
            vec![
                "[09:05:59.867] The competitor(1) registered",
                "[09:15:00.841] The start time for the competitor(1) was set by a draw to 09:30:00.000",
                "[09:29:45.734] The competitor(1) is on the start line",
                "[09:30:01.005] The competitor(1) has started",
                "[09:49:31.659] The competitor(1) is on the firing range(1)",
                "[09:49:33.123] The target(1) has been hit by competitor(1)",
                "[09:49:35.937] The competitor(1) left the firing range",
                "[09:49:37.000] The competitor(1) entered the penalty laps",
                "[09:50:37.000] The competitor(1) left the penalty laps",
                "[09:59:03.872] The competitor(1) ended the main lap",
            ]
        );
        let runner = dispatcher.runner(CompetitorId(1)).unwrap();
        assert_eq!(runner.hits(), 1);
        assert_eq!(runner.penalty_time(), 60_000);
        assert_eq!(dispatcher.ranges().occupied(), 0);
    }

    #[test]
    fn late_start_narrates_disqualification() {
        let mut dispatcher = EventDispatcher::new(rules());
        let narrator = apply_all(
            &mut dispatcher,
            &[
                "[09:05:59.867] 1 2",
                "[09:15:00.841] 2 2 09:30:00.000",
                "[09:29:45.734] 3 2",
                "[09:31:00.000] 4 2",
            ],
        );
        assert_eq!(
            narrator.lines.last().map(String::as_str),
            Some("[09:31:00.000] The competitor(2) is disqualified")
        );
    }

    #[test]
    fn final_lap_narrates_finish() {
        let mut dispatcher = EventDispatcher::new(rules());
        let narrator = apply_all(
            &mut dispatcher,
            &[
                "[09:05:59.867] 1 1",
                "[09:15:00.841] 2 1 09:30:00.000",
                "[09:29:45.734] 3 1",
                "[09:30:01.005] 4 1",
                "[09:59:03.872] 10 1",
                "[10:29:03.872] 10 1",
            ],
        );
        assert_eq!(
            narrator.lines.last().map(String::as_str),
            Some("[10:29:03.872] The competitor(1) has finished")
        );
    }

    fn started_pair() -> EventDispatcher {
        let mut dispatcher = EventDispatcher::new(rules());
        apply_all(
            &mut dispatcher,
            &[
                "[09:05:59.867] 1 1",
                "[09:06:00.000] 1 2",
                "[09:15:00.841] 2 1 09:30:00.000",
                "[09:15:01.000] 2 2 09:31:00.000",
                "[09:29:45.734] 3 1",
                "[09:30:45.000] 3 2",
                "[09:30:01.005] 4 1",
                "[09:31:01.000] 4 2",
            ],
        );
        dispatcher
    }

    #[test]
    fn occupied_range_is_a_conflict() {
        let mut dispatcher = started_pair();
        let mut narrator = CollectingNarrator::default();
        apply(&mut dispatcher, &mut narrator, "[09:49:31.659] 5 1 1").unwrap();
        let err = apply(&mut dispatcher, &mut narrator, "[09:49:32.000] 5 2 1").unwrap_err();
        assert_eq!(
            err,
            DispatchError::Range(RangeError::Occupied {
                range: RangeId(1),
                holder: CompetitorId(1),
            })
        );
        assert_eq!(
            dispatcher.runner(CompetitorId(2)).map(Runner::state),
            Some(RunnerState::RunningMain)
        );

        apply(&mut dispatcher, &mut narrator, "[09:49:35.937] 7 1").unwrap();
        apply(&mut dispatcher, &mut narrator, "[09:49:36.000] 5 2 1").unwrap();
        assert_eq!(dispatcher.ranges().holder(RangeId(1)), Some(CompetitorId(2)));
    }

    #[test]
    fn rejected_firing_leaves_range_free() {
        let mut dispatcher = started_pair();
        let mut narrator = CollectingNarrator::default();
        apply(&mut dispatcher, &mut narrator, "[09:49:31.659] 5 1 1").unwrap();

        // Competitor 1 is already firing; a second range must not stay taken.
        let err = apply(&mut dispatcher, &mut narrator, "[09:49:32.000] 5 1 2").unwrap_err();
        assert_eq!(
            err,
            DispatchError::Runner(RunnerError::IllegalTransition {
                competitor: CompetitorId(1),
                state: RunnerState::Firing,
                kind: TransitionKind::NotRunningMain,
            })
        );
        assert_eq!(dispatcher.ranges().holder(RangeId(2)), None);
        assert_eq!(dispatcher.ranges().holder(RangeId(1)), Some(CompetitorId(1)));
    }

    #[test]
    fn abandon_releases_range() {
        let mut dispatcher = started_pair();
        let mut narrator = CollectingNarrator::default();
        apply(&mut dispatcher, &mut narrator, "[09:49:31.659] 5 1 1").unwrap();
        apply(&mut dispatcher, &mut narrator, "[09:49:33.000] 11 1 Lost in the forest").unwrap();
        assert_eq!(
            narrator.lines.last().map(String::as_str),
            Some("[09:49:33.000] The competitor(1) can`t continue: Lost in the forest")
        );
        assert_eq!(dispatcher.ranges().holder(RangeId(1)), None);
        apply(&mut dispatcher, &mut narrator, "[09:49:34.000] 5 2 1").unwrap();
    }

    #[test]
    fn illegal_transition_propagates() {
        let mut dispatcher = started_pair();
        let mut narrator = CollectingNarrator::default();
        let err = apply(&mut dispatcher, &mut narrator, "[09:49:33.123] 6 1 1").unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Runner(RunnerError::IllegalTransition {
                kind: TransitionKind::NotOnRange,
                ..
            })
        ));
        assert_eq!(dispatcher.runner(CompetitorId(1)).map(Runner::hits), Some(0));
    }
}
