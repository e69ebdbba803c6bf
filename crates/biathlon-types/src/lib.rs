//! Shared type definitions for the biathlon race-log processor.
//!
//! This crate holds the vocabulary every other crate speaks: typed
//! identifiers for competitors, firing ranges and targets, the competitor
//! state enumeration, and the parsed event record that flows from the log
//! parser into the dispatcher. It contains no behavior beyond conversions
//! and display.
//!
//! # Modules
//!
//! - [`ids`] -- Integer identifier newtypes ([`CompetitorId`], [`RangeId`], [`TargetId`]).
//! - [`enums`] -- [`RunnerState`], [`EventKind`], and [`ResultStatus`].
//! - [`events`] -- [`EventRecord`] and [`EventAction`], one parsed log line.

pub mod enums;
pub mod events;
pub mod ids;

pub use enums::{EventKind, ResultStatus, RunnerState};
pub use events::{EventAction, EventRecord};
pub use ids::{CompetitorId, RangeId, TargetId};

/// Milliseconds since midnight, or a duration in milliseconds.
///
/// Signed so that an early start (actual start before the draw time)
/// produces a negative offset instead of an underflow.
pub type Millis = i64;

/// Number of targets on every firing range.
pub const TARGETS_PER_RANGE: u32 = 5;
