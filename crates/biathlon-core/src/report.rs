//! Final results table.
//!
//! Finishers come first, fastest total time first. Equal times keep
//! ascending competitor id order. Disqualified and abandoned competitors
//! follow in ascending id order. Competitors still on the course when the
//! log ends have no result line; they are only counted.

use std::fmt;

use crate::result::CompetitorResult;
use crate::runner::Runner;

/// Header printed above the result lines.
pub const TABLE_HEADER: &str = "Resulting table";

/// The ordered results of a race.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable {
    finished: Vec<CompetitorResult>,
    others: Vec<CompetitorResult>,
    still_racing: usize,
}

impl ResultsTable {
    /// Build the table from runners given in ascending competitor id order.
    pub fn from_runners<'a>(runners: impl IntoIterator<Item = &'a Runner>) -> Self {
        let mut table = Self::default();
        for runner in runners {
            if !runner.state().is_terminal() {
                table.still_racing = table.still_racing.saturating_add(1);
                continue;
            }
            match runner.result() {
                Some(result) if result.is_finished() => table.finished.push(result),
                Some(result) => table.others.push(result),
                None => {}
            }
        }
        // Stable: equal totals keep id order.
        table
            .finished
            .sort_by_key(|result| result.total_time().unwrap_or_default());
        table
    }

    /// Every result line in table order.
    pub fn rows(&self) -> impl Iterator<Item = &CompetitorResult> {
        self.finished.iter().chain(&self.others)
    }

    /// Number of finishers.
    pub fn finished_count(&self) -> usize {
        self.finished.len()
    }

    /// Number of competitors with a result line.
    pub fn len(&self) -> usize {
        self.finished.len().saturating_add(self.others.len())
    }

    /// Whether the table has no result lines.
    pub fn is_empty(&self) -> bool {
        self.finished.is_empty() && self.others.is_empty()
    }

    /// Competitors left out because they were still racing.
    pub const fn still_racing(&self) -> usize {
        self.still_racing
    }
}

impl fmt::Display for ResultsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(TABLE_HEADER)?;
        for row in self.rows() {
            write!(f, "\n{row}")?;
        }
        Ok(())
    }
}
