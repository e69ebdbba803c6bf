//! Per-competitor race state machine.
//!
//! A [`Runner`] is created when a competitor registers and lives until the
//! results table is produced. Every operation checks the current
//! [`RunnerState`] first; an operation called from the wrong state returns
//! [`RunnerError::IllegalTransition`] and leaves the runner untouched.
//!
//! | Operation | Allowed from | Moves to |
//! |-----------|--------------|----------|
//! | [`set_draw_time`](Runner::set_draw_time) | `Registered` | `TimeSet` |
//! | [`arrive_on_line`](Runner::arrive_on_line) | `TimeSet` | `OnLine` |
//! | [`start`](Runner::start) | `OnLine` | `RunningMain` or `NotStarted` |
//! | [`start_firing`](Runner::start_firing) | `RunningMain` | `Firing` |
//! | [`hit_target`](Runner::hit_target) | `Firing` | `Firing` |
//! | [`quit_firing`](Runner::quit_firing) | `Firing` | `LeftFiringRange` |
//! | [`enter_penalty`](Runner::enter_penalty) | `LeftFiringRange` | `RunningPenalty` |
//! | [`leave_penalty`](Runner::leave_penalty) | `RunningPenalty` | `RunningMain` |
//! | [`finish_lap`](Runner::finish_lap) | `RunningMain`, `LeftFiringRange` | `RunningMain` or `Finished` |
//! | [`abandon`](Runner::abandon) | any | `NotFinished` |

use biathlon_types::{CompetitorId, Millis, RangeId, ResultStatus, RunnerState, TargetId};
use tracing::debug;

use crate::config::RaceRules;
use crate::result::{CompetitorResult, LapRecord, PenaltyBlock, ResultTotal};

/// Why a state transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionKind {
    /// The draw time was already assigned.
    #[error("draw time is already set")]
    DrawAlreadySet,
    /// Arrival on the start line before a draw time was assigned.
    #[error("draw time is not set")]
    NotOnLine,
    /// Start without standing on the start line.
    #[error("not on the start line")]
    NotAtStart,
    /// Firing or lap completion outside a main lap.
    #[error("not running a main lap")]
    NotRunningMain,
    /// Target hit or range exit without occupying a range.
    #[error("not on a firing range")]
    NotOnRange,
    /// Penalty loop entered other than straight after firing.
    #[error("penalty loop not entered straight after firing")]
    NotAfterRange,
    /// Penalty exit without being in the penalty loop.
    #[error("not running a penalty lap")]
    NotInPenalty,
}

/// Errors returned by runner operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunnerError {
    /// The operation is not legal from the runner's current state.
    #[error("competitor {competitor} ({state}): {kind}")]
    IllegalTransition {
        /// The competitor the operation was addressed to.
        competitor: CompetitorId,
        /// The state the runner was in.
        state: RunnerState,
        /// Which guard failed.
        kind: TransitionKind,
    },

    /// A time difference overflowed the millisecond range.
    #[error("competitor {competitor}: arithmetic overflow computing {context}")]
    ArithmeticOverflow {
        /// The competitor being updated.
        competitor: CompetitorId,
        /// What was being computed.
        context: &'static str,
    },
}

impl RunnerError {
    /// The failed guard, if this is an illegal transition.
    pub const fn transition_kind(&self) -> Option<TransitionKind> {
        match self {
            Self::IllegalTransition { kind, .. } => Some(*kind),
            Self::ArithmeticOverflow { .. } => None,
        }
    }
}

/// Outcome of [`Runner::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Started inside the start window.
    Started {
        /// Offset from the draw time in milliseconds (negative if early).
        offset: Millis,
    },
    /// Started too late and was disqualified.
    Disqualified {
        /// Offset from the draw time in milliseconds.
        offset: Millis,
    },
}

/// Outcome of [`Runner::finish_lap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapOutcome {
    /// A main lap was completed and more remain.
    LapCompleted {
        /// Number of laps completed so far.
        lap: u32,
        /// Duration of the lap just completed.
        duration: Millis,
    },
    /// The final main lap was completed.
    RaceFinished {
        /// Duration of the final lap.
        duration: Millis,
        /// Total race time from the draw time.
        total: Millis,
    },
}

/// One competitor's race state and statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Runner {
    id: CompetitorId,
    rules: RaceRules,
    state: RunnerState,
    draw_time: Millis,
    start_offset: Millis,
    /// Last time the competitor crossed the start/finish line.
    last_line_time: Millis,
    laps: Vec<LapRecord>,
    firing_range: Option<RangeId>,
    hits: u32,
    penalty_loops: u32,
    penalty_time: Millis,
    last_penalty_entry: Millis,
}

impl Runner {
    /// Create a freshly registered runner.
    pub const fn new(id: CompetitorId, rules: RaceRules) -> Self {
        Self {
            id,
            rules,
            state: RunnerState::Registered,
            draw_time: 0,
            start_offset: 0,
            last_line_time: 0,
            laps: Vec::new(),
            firing_range: None,
            hits: 0,
            penalty_loops: 0,
            penalty_time: 0,
            last_penalty_entry: 0,
        }
    }

    /// The competitor id.
    pub const fn id(&self) -> CompetitorId {
        self.id
    }

    /// The current state.
    pub const fn state(&self) -> RunnerState {
        self.state
    }

    /// Offset between the actual start and the draw time.
    pub const fn start_offset(&self) -> Millis {
        self.start_offset
    }

    /// Completed main laps.
    pub fn laps(&self) -> &[LapRecord] {
        &self.laps
    }

    /// Number of completed main laps.
    pub fn laps_completed(&self) -> u32 {
        u32::try_from(self.laps.len()).unwrap_or(u32::MAX)
    }

    /// Targets hit so far.
    pub const fn hits(&self) -> u32 {
        self.hits
    }

    /// Penalty loops entered so far.
    pub const fn penalty_loops(&self) -> u32 {
        self.penalty_loops
    }

    /// Accumulated penalty loop time in milliseconds.
    pub const fn penalty_time(&self) -> Millis {
        self.penalty_time
    }

    /// The firing range currently occupied, if any.
    pub const fn firing_range(&self) -> Option<RangeId> {
        self.firing_range
    }

    /// Assign the draw start time.
    pub fn set_draw_time(&mut self, draw: Millis) -> Result<(), RunnerError> {
        self.require(
            self.state == RunnerState::Registered,
            TransitionKind::DrawAlreadySet,
        )?;
        self.draw_time = draw;
        self.state = RunnerState::TimeSet;
        Ok(())
    }

    /// Move to the start line.
    pub fn arrive_on_line(&mut self) -> Result<(), RunnerError> {
        self.require(self.state == RunnerState::TimeSet, TransitionKind::NotOnLine)?;
        self.state = RunnerState::OnLine;
        Ok(())
    }

    /// Start the race at `at`.
    ///
    /// A start more than the configured start delta after the draw time
    /// disqualifies the competitor.
    pub fn start(&mut self, at: Millis) -> Result<StartOutcome, RunnerError> {
        self.require(self.state == RunnerState::OnLine, TransitionKind::NotAtStart)?;
        let offset = self.elapsed(self.draw_time, at, "start offset")?;

        self.start_offset = offset;
        self.last_line_time = at;
        if offset > self.rules.start_delta {
            self.state = RunnerState::NotStarted;
            debug!(competitor = %self.id, offset, "start outside window");
            Ok(StartOutcome::Disqualified { offset })
        } else {
            self.state = RunnerState::RunningMain;
            Ok(StartOutcome::Started { offset })
        }
    }

    /// Occupy a firing range.
    ///
    /// The caller is responsible for checking that the range is free.
    pub fn start_firing(&mut self, range: RangeId) -> Result<(), RunnerError> {
        self.require(
            self.state == RunnerState::RunningMain,
            TransitionKind::NotRunningMain,
        )?;
        self.firing_range = Some(range);
        self.state = RunnerState::Firing;
        Ok(())
    }

    /// Record a hit target. Returns the hit count so far.
    pub fn hit_target(&mut self, target: TargetId) -> Result<u32, RunnerError> {
        self.require(self.state == RunnerState::Firing, TransitionKind::NotOnRange)?;
        self.hits = self.hits.saturating_add(1);
        debug!(competitor = %self.id, target_id = %target, hits = self.hits, "target hit");
        Ok(self.hits)
    }

    /// Leave the firing range. Returns the range to release.
    pub fn quit_firing(&mut self) -> Result<RangeId, RunnerError> {
        let range = match (self.state, self.firing_range) {
            (RunnerState::Firing, Some(range)) => range,
            _ => return Err(self.illegal(TransitionKind::NotOnRange)),
        };
        self.firing_range = None;
        self.state = RunnerState::LeftFiringRange;
        Ok(range)
    }

    /// Enter the penalty loop at `at`.
    pub fn enter_penalty(&mut self, at: Millis) -> Result<(), RunnerError> {
        self.require(
            self.state == RunnerState::LeftFiringRange,
            TransitionKind::NotAfterRange,
        )?;
        self.penalty_loops = self.penalty_loops.saturating_add(1);
        self.last_penalty_entry = at;
        self.state = RunnerState::RunningPenalty;
        Ok(())
    }

    /// Leave the penalty loop at `at`. Returns the time spent in this loop.
    pub fn leave_penalty(&mut self, at: Millis) -> Result<Millis, RunnerError> {
        self.require(
            self.state == RunnerState::RunningPenalty,
            TransitionKind::NotInPenalty,
        )?;
        let spent = self.elapsed(self.last_penalty_entry, at, "penalty duration")?;
        let total = self
            .penalty_time
            .checked_add(spent)
            .ok_or_else(|| self.overflow("penalty total"))?;

        self.penalty_time = total;
        self.state = RunnerState::RunningMain;
        Ok(spent)
    }

    /// Cross the line at `at`, completing a main lap.
    ///
    /// Completing the configured number of laps finishes the race on the
    /// same call.
    pub fn finish_lap(&mut self, at: Millis) -> Result<LapOutcome, RunnerError> {
        self.require(
            matches!(
                self.state,
                RunnerState::RunningMain | RunnerState::LeftFiringRange
            ),
            TransitionKind::NotRunningMain,
        )?;
        let duration = self.elapsed(self.last_line_time, at, "lap duration")?;
        let lap = self
            .laps_completed()
            .checked_add(1)
            .ok_or_else(|| self.overflow("lap count"))?;

        let total = if lap >= self.rules.total_laps {
            Some(self.elapsed(self.draw_time, at, "total time")?)
        } else {
            None
        };

        self.laps.push(LapRecord {
            duration,
            speed: average_speed(self.rules.lap_length, 1, duration),
        });
        self.last_line_time = at;

        if let Some(total) = total {
            self.state = RunnerState::Finished;
            Ok(LapOutcome::RaceFinished { duration, total })
        } else {
            self.state = RunnerState::RunningMain;
            Ok(LapOutcome::LapCompleted { lap, duration })
        }
    }

    /// Abandon the race. Always succeeds.
    ///
    /// Returns the firing range the competitor was still occupying, so the
    /// caller can release it.
    pub fn abandon(&mut self) -> Option<RangeId> {
        self.state = RunnerState::NotFinished;
        self.firing_range.take()
    }

    /// Render this runner's result line.
    ///
    /// Returns `None` while the competitor is neither finished, disqualified,
    /// nor abandoned.
    pub fn result(&self) -> Option<CompetitorResult> {
        let laps_completed = self.laps_completed();
        let possible_hits = laps_completed.saturating_mul(self.rules.targets_per_range);
        let (total, penalty, hits, possible_hits) = match self.state {
            RunnerState::Finished => (
                ResultTotal::Time(self.last_line_time.saturating_sub(self.draw_time)),
                self.penalty_block(),
                self.hits,
                possible_hits,
            ),
            RunnerState::NotStarted => (
                ResultTotal::Status(ResultStatus::NotStarted),
                PenaltyBlock::Empty,
                0,
                0,
            ),
            RunnerState::NotFinished => (
                ResultTotal::Status(ResultStatus::NotFinished),
                self.penalty_block(),
                self.hits,
                possible_hits,
            ),
            _ => return None,
        };

        Some(CompetitorResult {
            competitor: self.id,
            total,
            laps: self.laps.clone(),
            total_laps: self.rules.total_laps,
            penalty,
            hits,
            possible_hits,
        })
    }

    fn penalty_block(&self) -> PenaltyBlock {
        PenaltyBlock::Timed {
            duration: self.penalty_time,
            speed: average_speed(
                self.rules.penalty_length,
                self.penalty_loops,
                self.penalty_time,
            ),
        }
    }

    fn require(&self, allowed: bool, kind: TransitionKind) -> Result<(), RunnerError> {
        if allowed {
            Ok(())
        } else {
            Err(self.illegal(kind))
        }
    }

    const fn illegal(&self, kind: TransitionKind) -> RunnerError {
        RunnerError::IllegalTransition {
            competitor: self.id,
            state: self.state,
            kind,
        }
    }

    const fn overflow(&self, context: &'static str) -> RunnerError {
        RunnerError::ArithmeticOverflow {
            competitor: self.id,
            context,
        }
    }

    fn elapsed(
        &self,
        from: Millis,
        to: Millis,
        context: &'static str,
    ) -> Result<Millis, RunnerError> {
        to.checked_sub(from).ok_or_else(|| self.overflow(context))
    }
}

/// Average speed in meters per second over `count` stretches of `length`
/// meters taking `duration` milliseconds. Zero when no time elapsed.
fn average_speed(length: u32, count: u32, duration: Millis) -> f64 {
    if duration <= 0 {
        return 0.0;
    }
    let meters = f64::from(length) * f64::from(count);
    #[allow(clippy::cast_precision_loss)]
    let seconds = duration as f64 / 1000.0;
    meters / seconds
}
