//! Firing range occupancy.
//!
//! Firing ranges are shared between all competitors, so occupancy is
//! tracked here rather than inside any single [`Runner`]. Each range holds
//! at most one competitor at a time.
//!
//! [`Runner`]: crate::runner::Runner

use std::collections::BTreeMap;

use biathlon_types::{CompetitorId, RangeId};
use tracing::warn;

/// Errors that can occur when taking a firing range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// The range is already occupied by another competitor.
    #[error("firing range {range} is occupied by competitor {holder}")]
    Occupied {
        /// The requested range.
        range: RangeId,
        /// The competitor currently on it.
        holder: CompetitorId,
    },
}

/// Occupancy map from range id to the competitor on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiringRangeRegistry {
    ranges: BTreeMap<RangeId, Option<CompetitorId>>,
}

impl FiringRangeRegistry {
    /// Create a registry with ranges `1..=firing_lines`, all free.
    pub fn new(firing_lines: u32) -> Self {
        let ranges = (1..=firing_lines).map(|id| (RangeId(id), None)).collect();
        Self { ranges }
    }

    /// Occupy `range` for `competitor`.
    ///
    /// A range outside the configured set is accepted and tracked from then
    /// on, with a warning.
    pub fn acquire(&mut self, range: RangeId, competitor: CompetitorId) -> Result<(), RangeError> {
        let slot = self.ranges.entry(range).or_insert_with(|| {
            warn!(%range, %competitor, "firing range not in configuration");
            None
        });
        if let Some(holder) = *slot {
            return Err(RangeError::Occupied { range, holder });
        }
        *slot = Some(competitor);
        Ok(())
    }

    /// Free `range`. Returns the competitor that held it, if any.
    ///
    /// Releasing a free range is a no-op.
    pub fn release(&mut self, range: RangeId) -> Option<CompetitorId> {
        self.ranges.get_mut(&range).and_then(Option::take)
    }

    /// The competitor currently on `range`.
    pub fn holder(&self, range: RangeId) -> Option<CompetitorId> {
        self.ranges.get(&range).copied().flatten()
    }

    /// Number of ranges currently occupied.
    pub fn occupied(&self) -> usize {
        self.ranges.values().filter(|slot| slot.is_some()).count()
    }

    /// Number of ranges known to the registry.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the registry knows no ranges at all.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
