//! Per-competitor result lines.
//!
//! A [`CompetitorResult`] is a snapshot of one runner's race, produced by
//! [`Runner::result`](crate::runner::Runner::result). Its [`Display`]
//! implementation renders the results-table line:
//!
//! ```text
//! [00:29:03.872] 1 [{00:29:03.872,2.093000}, {,}] {00:01:44.296, 0.479000} 4/5
//! ```
//!
//! [`Display`]: core::fmt::Display

use core::fmt;

use biathlon_types::{CompetitorId, Millis, ResultStatus};

use crate::clock;

/// One completed main lap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapRecord {
    /// Lap duration in milliseconds.
    pub duration: Millis,
    /// Average speed over the lap in meters per second.
    pub speed: f64,
}

/// What is printed in the leading bracket of a result line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTotal {
    /// Total race time in milliseconds (draw time to final line crossing).
    Time(Millis),
    /// Status token for a competitor without a total time.
    Status(ResultStatus),
}

/// Penalty loop block of a result line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PenaltyBlock {
    /// No penalty figures (disqualified at the start).
    Empty,
    /// Accumulated penalty time and average penalty speed.
    Timed {
        /// Total time spent in penalty loops, in milliseconds.
        duration: Millis,
        /// Average penalty speed in meters per second; 0 when no time accrued.
        speed: f64,
    },
}

/// A single competitor's line in the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorResult {
    /// The competitor.
    pub competitor: CompetitorId,
    /// Total time or status token.
    pub total: ResultTotal,
    /// Completed main laps in order.
    pub laps: Vec<LapRecord>,
    /// Configured number of main laps; missing laps render as `{,}`.
    pub total_laps: u32,
    /// Penalty loop figures.
    pub penalty: PenaltyBlock,
    /// Targets hit.
    pub hits: u32,
    /// Targets available across the completed laps.
    pub possible_hits: u32,
}

impl CompetitorResult {
    /// Total race time, if the competitor finished.
    pub const fn total_time(&self) -> Option<Millis> {
        match self.total {
            ResultTotal::Time(ms) => Some(ms),
            ResultTotal::Status(_) => None,
        }
    }

    /// Whether this line belongs to the finishers' section.
    pub const fn is_finished(&self) -> bool {
        matches!(self.total, ResultTotal::Time(_))
    }
}

impl fmt::Display for CompetitorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total {
            ResultTotal::Time(ms) => write!(f, "[{}]", clock::decode(ms))?,
            ResultTotal::Status(status) => write!(f, "[{status}]")?,
        }
        write!(f, " {} [", self.competitor)?;

        let ran = self.laps.len();
        let configured = usize::try_from(self.total_laps).unwrap_or(usize::MAX);
        let slots = ran.max(configured);
        for slot in 0..slots {
            if slot > 0 {
                f.write_str(", ")?;
            }
            match self.laps.get(slot) {
                Some(lap) => write!(f, "{{{},{:.6}}}", clock::decode(lap.duration), lap.speed)?,
                None => f.write_str("{,}")?,
            }
        }
        f.write_str("] ")?;

        match self.penalty {
            PenaltyBlock::Empty => f.write_str("{,}")?,
            PenaltyBlock::Timed { duration, speed } => {
                write!(f, "{{{}, {speed:.6}}}", clock::decode(duration))?;
            }
        }
        write!(f, " {}/{}", self.hits, self.possible_hits)
    }
}
