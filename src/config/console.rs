//! Console behaviour configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::chart::{DEFAULT_CAPACITY, MAX_CAPACITY, MIN_CAPACITY};
use crate::domain::warning::{DEFAULT_WARNING_LOG_LEN, MAX_WARNING_LOG_LEN};

/// Refresh cadence and buffer sizes.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Seconds between device tree refreshes
    #[serde(default = "default_tree_refresh")]
    pub tree_refresh_secs: u64,

    /// Milliseconds between chart samples
    #[serde(default = "default_chart_interval")]
    pub chart_interval_ms: u64,

    /// Samples kept in the chart window
    #[serde(default = "default_chart_capacity")]
    pub chart_capacity: usize,

    /// Entries kept in the warning log
    #[serde(default = "default_warning_log_len")]
    pub warning_log_len: usize,
}

impl ConsoleConfig {
    pub fn tree_refresh(&self) -> Duration {
        Duration::from_secs(self.tree_refresh_secs)
    }

    pub fn chart_interval(&self) -> Duration {
        Duration::from_millis(self.chart_interval_ms)
    }

    /// Validate console configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tree_refresh_secs == 0 {
            return Err(ValidationError::ZeroInterval("tree_refresh_secs"));
        }
        if self.chart_interval_ms == 0 {
            return Err(ValidationError::ZeroInterval("chart_interval_ms"));
        }
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&self.chart_capacity) {
            return Err(ValidationError::OutOfRange {
                field: "chart_capacity",
                min: MIN_CAPACITY,
                max: MAX_CAPACITY,
                actual: self.chart_capacity,
            });
        }
        if !(1..=MAX_WARNING_LOG_LEN).contains(&self.warning_log_len) {
            return Err(ValidationError::OutOfRange {
                field: "warning_log_len",
                min: 1,
                max: MAX_WARNING_LOG_LEN,
                actual: self.warning_log_len,
            });
        }
        Ok(())
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            tree_refresh_secs: default_tree_refresh(),
            chart_interval_ms: default_chart_interval(),
            chart_capacity: default_chart_capacity(),
            warning_log_len: default_warning_log_len(),
        }
    }
}

fn default_tree_refresh() -> u64 {
    15
}

fn default_chart_interval() -> u64 {
    500
}

fn default_chart_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_warning_log_len() -> usize {
    DEFAULT_WARNING_LOG_LEN
}
