use std::time::Duration;

use anyhow::{Context, Result};

use crate::datasource::config_parser::RawConfig;

/// Per-run controller parameters shared by every device.
///
/// No ordering between the two thresholds is enforced. If both conditions can
/// hold at once, boosting wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Utilization (%) at or above which a boost excursion runs.
    pub boost_threshold: u32,
    /// Utilization (%) at or below which a low-power excursion runs.
    pub low_power_threshold: u32,
    pub boost_dwell: Duration,
    pub low_power_dwell: Duration,
    /// Include encoder and decoder utilization in the sample.
    pub track_codec: bool,
}

impl ControllerConfig {
    /// Sleep between polling cycles: the shorter of the two dwell times.
    pub fn poll_interval(&self) -> Duration {
        self.boost_dwell.min(self.low_power_dwell)
    }
}

impl TryFrom<RawConfig> for ControllerConfig {
    type Error = anyhow::Error;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let boost_threshold = raw
            .boost
            .context("Boost utilization threshold is not set")?;
        let low_power_threshold = raw
            .low_power
            .context("Low power utilization threshold is not set")?;
        let boost_time = raw.boost_time.context("Boost time is not set")?;
        let low_power_time = raw.low_power_time.context("Low power time is not set")?;

        Ok(Self {
            boost_threshold,
            low_power_threshold,
            boost_dwell: Duration::from_millis(boost_time),
            low_power_dwell: Duration::from_millis(low_power_time),
            track_codec: raw.coder.unwrap_or(false),
        })
    }
}
