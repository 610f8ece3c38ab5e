use anyhow::{Result, bail};

use crate::utils::constants::probe::MAX_CLOCK_LEVELS;

/// Supported memory clocks of one device in MHz, strictly descending.
/// Index 0 is the highest clock, the last index the lowest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockLevelTable {
    levels: Vec<u32>,
}

impl ClockLevelTable {
    /// Builds a table from the driver's report.
    ///
    /// Only the first [`MAX_CLOCK_LEVELS`] entries as reported are kept. The
    /// remainder is sorted descending and deduplicated so the table invariant
    /// holds even if the driver changes its ordering.
    pub fn from_reported(mut reported: Vec<u32>) -> Result<Self> {
        reported.truncate(MAX_CLOCK_LEVELS);
        reported.sort_unstable_by(|a, b| b.cmp(a));
        reported.dedup();

        if reported.is_empty() {
            bail!("Device reported no supported memory clocks");
        }

        Ok(Self { levels: reported })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Index of the lowest clock.
    pub fn max_index(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn clock(&self, index: usize) -> Option<u32> {
        self.levels.get(index).copied()
    }

    pub fn highest(&self) -> u32 {
        self.levels[0]
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }
}
