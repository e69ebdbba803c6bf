//! Type-safe identifier wrappers around `u32`.
//!
//! The event log identifies competitors, firing ranges, and targets by
//! plain integers. Wrapping each in its own newtype prevents a range id
//! from being passed where a competitor id is expected.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u32` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u32>().map(Self)
            }
        }
    };
}

define_id! {
    /// Identifier of a registered competitor.
    CompetitorId
}

define_id! {
    /// Identifier of a firing range (firing line).
    RangeId
}

define_id! {
    /// Identifier of a single target on a firing range.
    TargetId
}
