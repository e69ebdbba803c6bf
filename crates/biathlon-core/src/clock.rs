//! Race clock codec: `HH:MM:SS.mmm` text to and from milliseconds.
//!
//! Every timestamp in the event log is a wall-clock reading with a
//! mandatory three-digit millisecond suffix. Configuration values (`start`,
//! `startDelta`) are bare `HH:MM:SS`, and draw times may use either form.
//!
//! Decoding always produces the zero-padded millisecond form. It is used for
//! display only: a bare `HH:MM:SS` input decodes with a `.000` suffix.

use biathlon_types::Millis;
use chrono::{NaiveTime, Timelike};

/// Layout of the clock portion, without milliseconds.
const CLOCK_FORMAT: &str = "%H:%M:%S";

/// Length of a zero-padded `HH:MM:SS`.
const CLOCK_LEN: usize = 8;

/// Number of digits in the millisecond suffix.
const MILLIS_DIGITS: usize = 3;

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Errors that can occur while encoding clock text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    /// The text is not a valid clock reading.
    #[error("invalid time format: {input:?}")]
    Malformed {
        /// The rejected input.
        input: String,
    },
}

impl TimeError {
    fn malformed(input: &str) -> Self {
        Self::Malformed {
            input: input.to_owned(),
        }
    }
}

/// Encode `HH:MM:SS.mmm` into milliseconds since midnight.
///
/// # Errors
///
/// Returns [`TimeError::Malformed`] if the millisecond suffix is missing,
/// not exactly three digits, or the clock portion is not a valid 24-hour
/// time.
pub fn encode(text: &str) -> Result<Millis, TimeError> {
    let (clock, fraction) = text
        .split_once('.')
        .ok_or_else(|| TimeError::malformed(text))?;
    let millis = parse_fraction(fraction).ok_or_else(|| TimeError::malformed(text))?;
    let seconds = parse_clock(clock).ok_or_else(|| TimeError::malformed(text))?;
    seconds
        .checked_mul(1_000)
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(|| TimeError::malformed(text))
}

/// Encode a bare `HH:MM:SS` into milliseconds since midnight.
///
/// # Errors
///
/// Returns [`TimeError::Malformed`] if the text is not a valid 24-hour time
/// or carries a fractional part.
pub fn encode_clock(text: &str) -> Result<Millis, TimeError> {
    parse_clock(text)
        .and_then(|seconds| seconds.checked_mul(1_000))
        .ok_or_else(|| TimeError::malformed(text))
}

/// Encode a draw time, which may be written with or without milliseconds.
///
/// # Errors
///
/// Returns [`TimeError::Malformed`] if neither form matches.
pub fn encode_draw(text: &str) -> Result<Millis, TimeError> {
    if text.contains('.') {
        encode(text)
    } else {
        encode_clock(text)
    }
}

/// Decode milliseconds into zero-padded `HH:MM:SS.mmm`.
///
/// Durations longer than a day keep counting hours past 23. Negative values
/// are rendered with a leading `-`.
pub fn decode(ms: Millis) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let total = ms.unsigned_abs();
    let hours = total / MS_PER_HOUR;
    let minutes = (total % MS_PER_HOUR) / MS_PER_MINUTE;
    let seconds = (total % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = total % MS_PER_SECOND;
    format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Parse the clock portion into whole seconds since midnight.
fn parse_clock(text: &str) -> Option<Millis> {
    if text.len() != CLOCK_LEN {
        return None;
    }
    let time = NaiveTime::parse_from_str(text, CLOCK_FORMAT).ok()?;
    // chrono represents a leap second as nanoseconds >= 1s; reject it.
    if time.nanosecond() >= 1_000_000_000 {
        return None;
    }
    Some(Millis::from(time.num_seconds_from_midnight()))
}

/// Parse exactly three ASCII digits.
fn parse_fraction(text: &str) -> Option<Millis> {
    if text.len() != MILLIS_DIGITS || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
