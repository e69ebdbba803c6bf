//! Event-log line parsing.
//!
//! Each line of the log has the shape
//!
//! ```text
//! [HH:MM:SS.mmm] eventID competitorID [extra...]
//! ```
//!
//! with whitespace-separated fields. [`parse_line`] turns one line into an
//! [`EventRecord`]. Blank lines yield `None`. An unrecognised event id is not
//! an error, even a negative one: it parses to [`EventAction::Unknown`] and
//! the dispatcher decides what to do with it. [`parse_bytes`] does the same
//! for a raw line that has not been checked for UTF-8 yet.

use core::num::ParseIntError;
use core::str::{FromStr, Utf8Error};

use biathlon_types::{EventAction, EventKind, EventRecord};

use crate::clock::{self, TimeError};

/// Errors that can occur while parsing a log line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// Fewer than the three mandatory fields.
    #[error("expected at least 3 fields, found {found}")]
    TooFewFields {
        /// Number of fields on the line.
        found: usize,
    },

    /// The timestamp field is not wrapped in `[` `]`.
    #[error("timestamp {field:?} is not enclosed in brackets")]
    UnbracketedTime {
        /// The offending field.
        field: String,
    },

    /// A timestamp or draw time is malformed.
    #[error(transparent)]
    Time(#[from] TimeError),

    /// A numeric field does not parse.
    #[error("invalid {what} {value:?}: {source}")]
    InvalidNumber {
        /// Which field was being parsed.
        what: &'static str,
        /// The raw field text.
        value: String,
        /// The underlying parse error.
        source: ParseIntError,
    },

    /// The event requires an extra parameter that is absent.
    #[error("event {} requires an extra parameter", .kind.code())]
    MissingParameter {
        /// Kind of the incomplete event.
        kind: EventKind,
    },

    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8: {source}")]
    NotUtf8 {
        /// The underlying decode error.
        #[from]
        source: Utf8Error,
    },
}

/// Parse one raw log line, trailing newline included or not.
///
/// # Errors
///
/// Returns [`LogError::NotUtf8`] if the bytes do not decode, otherwise the
/// same errors as [`parse_line`].
pub fn parse_bytes(line: &[u8]) -> Result<Option<EventRecord>, LogError> {
    parse_line(core::str::from_utf8(line)?)
}

/// Parse one log line. Returns `Ok(None)` for a blank line.
///
/// # Errors
///
/// Returns [`LogError`] if the line has too few fields, a malformed
/// timestamp, a non-numeric id, or lacks a required parameter.
pub fn parse_line(line: &str) -> Result<Option<EventRecord>, LogError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None);
    }
    let [time_field, code_field, competitor_field, extra @ ..] = fields.as_slice() else {
        return Err(LogError::TooFewFields {
            found: fields.len(),
        });
    };

    let time_text = time_field
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| LogError::UnbracketedTime {
            field: (*time_field).to_owned(),
        })?;
    let time = clock::encode(time_text)?;
    let code: i64 = parse_number("event id", code_field)?;
    let competitor = parse_number("competitor id", competitor_field)?;
    let action = parse_action(code, extra)?;

    Ok(Some(EventRecord {
        time,
        time_text: time_text.to_owned(),
        competitor,
        action,
    }))
}

fn parse_action(code: i64, extra: &[&str]) -> Result<EventAction, LogError> {
    let Some(kind) = u32::try_from(code).ok().and_then(EventKind::from_code) else {
        return Ok(EventAction::Unknown { code });
    };
    let param = extra.first().copied();
    if kind.requires_parameter() && param.is_none() {
        return Err(LogError::MissingParameter { kind });
    }
    let param = param.unwrap_or_default();

    let action = match kind {
        EventKind::Register => EventAction::Register,
        EventKind::SetDrawTime => EventAction::SetDrawTime {
            draw: clock::encode_draw(param)?,
            draw_text: param.to_owned(),
        },
        EventKind::ArriveOnLine => EventAction::ArriveOnLine,
        EventKind::Start => EventAction::Start,
        EventKind::StartFiring => EventAction::StartFiring {
            range: parse_number("firing range", param)?,
        },
        EventKind::HitTarget => EventAction::HitTarget {
            target: parse_number("target", param)?,
        },
        EventKind::QuitFiring => EventAction::QuitFiring,
        EventKind::EnterPenalty => EventAction::EnterPenalty,
        EventKind::LeavePenalty => EventAction::LeavePenalty,
        EventKind::FinishLap => EventAction::FinishLap,
        EventKind::Abandon => EventAction::Abandon {
            comment: extra.join(" "),
        },
    };
    Ok(action)
}

fn parse_number<T>(what: &'static str, value: &str) -> Result<T, LogError>
where
    T: FromStr<Err = ParseIntError>,
{
    value.parse().map_err(|source| LogError::InvalidNumber {
        what,
        value: value.to_owned(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use biathlon_types::{CompetitorId, RangeId, TargetId};

    use super::*;

    fn parse(line: &str) -> EventRecord {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn parses_registration() {
        let record = parse("[09:05:59.867] 1 1");
        assert_eq!(record.time, 32_759_867);
        assert_eq!(record.time_text, "09:05:59.867");
        assert_eq!(record.competitor, CompetitorId(1));
        assert_eq!(record.action, EventAction::Register);
    }

    #[test]
    fn parses_draw_time_parameter() {
        let record = parse("[09:15:00.841] 2 1 09:30:00.000");
        assert_eq!(
            record.action,
            EventAction::SetDrawTime {
                draw: 34_200_000,
                draw_text: "09:30:00.000".to_owned(),
            }
        );
    }

    #[test]
    fn parses_range_and_target_parameters() {
        let firing = parse("[09:49:31.659] 5 1 1");
        assert_eq!(firing.action, EventAction::StartFiring { range: RangeId(1) });
        let hit = parse("[09:49:33.123] 6 1 4");
        assert_eq!(hit.action, EventAction::HitTarget { target: TargetId(4) });
    }

    #[test]
    fn abandon_comment_keeps_every_word() {
        let record = parse("[09:59:03.872] 11 1 Lost in the forest");
        assert_eq!(
            record.action,
            EventAction::Abandon {
                comment: "Lost in the forest".to_owned()
            }
        );
        let bare = parse("[09:59:03.872] 11 1");
        assert_eq!(
            bare.action,
            EventAction::Abandon {
                comment: String::new()
            }
        );
    }

    #[test]
    fn unknown_event_code_is_not_an_error() {
        let record = parse("[09:59:03.872] 42 7 whatever");
        assert_eq!(record.action, EventAction::Unknown { code: 42 });
    }

    #[test]
    fn out_of_range_event_codes_are_unknown() {
        assert_eq!(parse("[09:59:03.872] -1 7").action, EventAction::Unknown { code: -1 });
        assert_eq!(parse("[09:59:03.872] 0 7").action, EventAction::Unknown { code: 0 });
        assert_eq!(
            parse("[09:59:03.872] 4294967297 7").action,
            EventAction::Unknown { code: 4_294_967_297 }
        );
    }

    #[test]
    fn invalid_utf8_is_a_log_error() {
        let err = parse_bytes(b"\xff\xfe junk\n").unwrap_err();
        assert!(matches!(err, LogError::NotUtf8 { .. }));
        let record = parse_bytes(b"[09:05:59.867] 1 1\r\n").unwrap().unwrap();
        assert_eq!(record.action, EventAction::Register);
    }

    #[test]
    fn blank_line_is_skipped() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   \t ").unwrap(), None);
    }

    #[test]
    fn too_few_fields() {
        let err = parse_line("[09:05:59.867] 1").unwrap_err();
        assert_eq!(err, LogError::TooFewFields { found: 2 });
    }

    #[test]
    fn unbracketed_timestamp() {
        let err = parse_line("09:05:59.867 1 1").unwrap_err();
        assert!(matches!(err, LogError::UnbracketedTime { .. }));
    }

    #[test]
    fn malformed_timestamp() {
        let err = parse_line("[09:05:59] 1 1").unwrap_err();
        assert!(matches!(err, LogError::Time(TimeError::Malformed { .. })));
    }

    #[test]
    fn malformed_draw_time() {
        let err = parse_line("[09:15:00.841] 2 1 9h30").unwrap_err();
        assert!(matches!(err, LogError::Time(_)));
    }

    #[test]
    fn non_numeric_ids() {
        let err = parse_line("[09:05:59.867] x 1").unwrap_err();
        assert!(matches!(err, LogError::InvalidNumber { what: "event id", .. }));
        let err = parse_line("[09:05:59.867] 1 one").unwrap_err();
        assert!(matches!(err, LogError::InvalidNumber { what: "competitor id", .. }));
        let err = parse_line("[09:49:31.659] 5 1 first").unwrap_err();
        assert!(matches!(err, LogError::InvalidNumber { what: "firing range", .. }));
    }

    #[test]
    fn missing_required_parameter() {
        for line in [
            "[09:15:00.841] 2 1",
            "[09:49:31.659] 5 1",
            "[09:49:33.123] 6 1",
        ] {
            let err = parse_line(line).unwrap_err();
            assert!(matches!(err, LogError::MissingParameter { .. }), "line {line}");
            assert!(err.to_string().ends_with("requires an extra parameter"));
        }
    }
}
