//! Parsed event-log records.
//!
//! One [`EventRecord`] is produced per non-blank log line. Times are already
//! decoded to milliseconds; the raw text is kept alongside so narration
//! can echo exactly what the log said.

use serde::{Deserialize, Serialize};

use crate::enums::EventKind;
use crate::ids::{CompetitorId, RangeId, TargetId};
use crate::Millis;

/// A single event from the race log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event timestamp in milliseconds since midnight.
    pub time: Millis,
    /// Event timestamp as written in the log, without brackets.
    pub time_text: String,
    /// The competitor this event concerns.
    pub competitor: CompetitorId,
    /// What happened.
    pub action: EventAction,
}

/// The typed payload of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventAction {
    /// The competitor registered.
    Register,
    /// A draw start time was assigned.
    SetDrawTime {
        /// Draw time in milliseconds since midnight.
        draw: Millis,
        /// Draw time as written in the log.
        draw_text: String,
    },
    /// The competitor is on the start line.
    ArriveOnLine,
    /// The competitor started.
    Start,
    /// The competitor took a firing range.
    StartFiring {
        /// The occupied range.
        range: RangeId,
    },
    /// The competitor hit a target.
    HitTarget {
        /// The target that was hit.
        target: TargetId,
    },
    /// The competitor left the firing range.
    QuitFiring,
    /// The competitor entered the penalty loop.
    EnterPenalty,
    /// The competitor left the penalty loop.
    LeavePenalty,
    /// The competitor ended a main lap.
    FinishLap,
    /// The competitor cannot continue.
    Abandon {
        /// Free-form reason, possibly empty.
        comment: String,
    },
    /// An event code this processor does not know.
    Unknown {
        /// The raw event code from the log.
        code: i64,
    },
}

impl EventAction {
    /// The event kind, or `None` for [`EventAction::Unknown`].
    pub const fn kind(&self) -> Option<EventKind> {
        match self {
            Self::Register => Some(EventKind::Register),
            Self::SetDrawTime { .. } => Some(EventKind::SetDrawTime),
            Self::ArriveOnLine => Some(EventKind::ArriveOnLine),
            Self::Start => Some(EventKind::Start),
            Self::StartFiring { .. } => Some(EventKind::StartFiring),
            Self::HitTarget { .. } => Some(EventKind::HitTarget),
            Self::QuitFiring => Some(EventKind::QuitFiring),
            Self::EnterPenalty => Some(EventKind::EnterPenalty),
            Self::LeavePenalty => Some(EventKind::LeavePenalty),
            Self::FinishLap => Some(EventKind::FinishLap),
            Self::Abandon { .. } => Some(EventKind::Abandon),
            Self::Unknown { .. } => None,
        }
    }
}
