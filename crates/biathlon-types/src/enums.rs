//! Enumeration types for the race-log processor.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Competitor state
// ---------------------------------------------------------------------------

/// Lifecycle state of a single competitor.
///
/// ```text
/// Registered -> TimeSet -> OnLine -> RunningMain -> Firing -> LeftFiringRange
/// OnLine -> NotStarted
/// LeftFiringRange -> RunningPenalty -> RunningMain
/// LeftFiringRange | RunningMain -> RunningMain | Finished   (lap completed)
/// ```
///
/// Any state can move to [`RunnerState::NotFinished`] through an abandon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RunnerState {
    /// Registered, no draw time yet.
    Registered,
    /// Draw time assigned.
    TimeSet,
    /// Standing on the start line.
    OnLine,
    /// Running a main lap.
    RunningMain,
    /// Occupying a firing range.
    Firing,
    /// Just left a firing range.
    LeftFiringRange,
    /// Running a penalty loop.
    RunningPenalty,
    /// Completed every main lap.
    Finished,
    /// Started outside the start window and was disqualified.
    NotStarted,
    /// Abandoned the race.
    NotFinished,
}

impl RunnerState {
    /// Whether no further operation (except abandon) can change this state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::NotStarted | Self::NotFinished)
    }

}

impl core::fmt::Display for RunnerState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Registered => "registered",
            Self::TimeSet => "time set",
            Self::OnLine => "on line",
            Self::RunningMain => "running main lap",
            Self::Firing => "firing",
            Self::LeftFiringRange => "left firing range",
            Self::RunningPenalty => "running penalty lap",
            Self::Finished => "finished",
            Self::NotStarted => "not started",
            Self::NotFinished => "not finished",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Result status tokens
// ---------------------------------------------------------------------------

/// Status token printed in place of the total time for non-finishers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResultStatus {
    /// Disqualified at the start.
    NotStarted,
    /// Abandoned mid-race.
    NotFinished,
}

impl ResultStatus {
    /// The literal token used in the results table.
    pub const fn token(self) -> &'static str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::NotFinished => "NotFinished",
        }
    }
}

impl core::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.token())
    }
}

// ---------------------------------------------------------------------------
// Event identifiers
// ---------------------------------------------------------------------------

/// Event identifier as written in the second column of the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `1` -- competitor registered.
    Register,
    /// `2` -- draw start time assigned (extra: draw time).
    SetDrawTime,
    /// `3` -- competitor is on the start line.
    ArriveOnLine,
    /// `4` -- competitor started.
    Start,
    /// `5` -- competitor is on a firing range (extra: range id).
    StartFiring,
    /// `6` -- target hit (extra: target id).
    HitTarget,
    /// `7` -- competitor left the firing range.
    QuitFiring,
    /// `8` -- competitor entered the penalty loop.
    EnterPenalty,
    /// `9` -- competitor left the penalty loop.
    LeavePenalty,
    /// `10` -- competitor ended a main lap.
    FinishLap,
    /// `11` -- competitor cannot continue (extra: comment).
    Abandon,
}

impl EventKind {
    /// Map a log code to an event kind. Returns `None` for unknown codes.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Register),
            2 => Some(Self::SetDrawTime),
            3 => Some(Self::ArriveOnLine),
            4 => Some(Self::Start),
            5 => Some(Self::StartFiring),
            6 => Some(Self::HitTarget),
            7 => Some(Self::QuitFiring),
            8 => Some(Self::EnterPenalty),
            9 => Some(Self::LeavePenalty),
            10 => Some(Self::FinishLap),
            11 => Some(Self::Abandon),
            _ => None,
        }
    }

    /// The log code for this event kind.
    pub const fn code(self) -> u32 {
        match self {
            Self::Register => 1,
            Self::SetDrawTime => 2,
            Self::ArriveOnLine => 3,
            Self::Start => 4,
            Self::StartFiring => 5,
            Self::HitTarget => 6,
            Self::QuitFiring => 7,
            Self::EnterPenalty => 8,
            Self::LeavePenalty => 9,
            Self::FinishLap => 10,
            Self::Abandon => 11,
        }
    }

    /// Whether the log line must carry an extra parameter for this kind.
    ///
    /// The abandon comment is optional; an empty comment is accepted.
    pub const fn requires_parameter(self) -> bool {
        matches!(self, Self::SetDrawTime | Self::StartFiring | Self::HitTarget)
    }
}
