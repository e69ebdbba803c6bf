//! Race configuration loading and validation.
//!
//! The race configuration is a small JSON object:
//!
//! ```json
//! {
//!     "laps": 2,
//!     "lapLen": 3651,
//!     "penaltyLen": 50,
//!     "firingLines": 1,
//!     "start": "09:30:00",
//!     "startDelta": "00:00:30"
//! }
//! ```
//!
//! [`RaceConfig`] mirrors the file. [`RaceRules`] is the validated form with
//! times decoded to milliseconds; it is what runners are built from.

use std::path::Path;

use biathlon_types::{Millis, TARGETS_PER_RANGE};
use serde::{Deserialize, Serialize};

use crate::clock::{self, TimeError};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse JSON content.
    #[error("failed to parse config JSON: {source}")]
    Json {
        /// The underlying JSON parse error.
        #[from]
        source: serde_json::Error,
    },

    /// A field holds a value the race cannot run with.
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        /// The offending field, as named in the JSON file.
        field: &'static str,
        /// Explanation of what is wrong.
        reason: String,
    },
}

/// Race configuration as written in the JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceConfig {
    /// Number of main laps.
    pub laps: u32,
    /// Length of one main lap in meters.
    pub lap_len: u32,
    /// Length of one penalty loop in meters.
    pub penalty_len: u32,
    /// Number of firing lines on the course.
    pub firing_lines: u32,
    /// Nominal race start, `HH:MM:SS`.
    pub start: String,
    /// Maximum start offset from the draw time, `HH:MM:SS`.
    pub start_delta: String,
}

impl RaceConfig {
    /// Load configuration from a JSON file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Json`] if the content is not a valid config object.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the string is not a valid config object.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the configuration and decode its times.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a count or length is zero, or a
    /// time field is not a valid `HH:MM:SS`.
    pub fn rules(&self) -> Result<RaceRules, ConfigError> {
        require_positive("laps", self.laps)?;
        require_positive("lapLen", self.lap_len)?;
        require_positive("penaltyLen", self.penalty_len)?;

        let start = clock::encode_clock(&self.start).map_err(|e| invalid_time("start", &e))?;
        let start_delta =
            clock::encode_clock(&self.start_delta).map_err(|e| invalid_time("startDelta", &e))?;

        Ok(RaceRules {
            total_laps: self.laps,
            lap_length: self.lap_len,
            penalty_length: self.penalty_len,
            firing_lines: self.firing_lines,
            targets_per_range: TARGETS_PER_RANGE,
            start,
            start_delta,
        })
    }
}

/// Validated race parameters shared by every runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceRules {
    /// Number of main laps.
    pub total_laps: u32,
    /// Main lap length in meters.
    pub lap_length: u32,
    /// Penalty loop length in meters.
    pub penalty_length: u32,
    /// Number of firing lines known up front.
    pub firing_lines: u32,
    /// Targets on each firing range.
    pub targets_per_range: u32,
    /// Nominal race start, milliseconds since midnight.
    pub start: Millis,
    /// Maximum allowed start offset in milliseconds.
    pub start_delta: Millis,
}

fn require_positive(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field,
            reason: "must be at least 1".to_owned(),
        });
    }
    Ok(())
}

fn invalid_time(field: &'static str, err: &TimeError) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: err.to_string(),
    }
}
