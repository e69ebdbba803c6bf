//! Operator control for a running log replay.
//!
//! The replay loop runs on a blocking thread while the engine listens for
//! Ctrl-C on the async runtime. [`StopSignal`] is the shared flag between
//! the two. It is an [`Arc`]-wrapped atomic so the loop can poll it between
//! lines without locking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Reason why a replay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEndReason {
    /// Every line of the log was consumed.
    Completed,
    /// An operator requested a stop before the end of the log.
    Cancelled,
}

/// What to do with an event the race context rejects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first failing line and report it.
    #[default]
    Abort,
    /// Log the failure, leave the context untouched, and keep going.
    Skip,
}

/// Cloneable stop flag shared between the replay loop and its controller.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stop_requested: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create a fresh, un-triggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the replay loop to stop after the current line.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }
}
