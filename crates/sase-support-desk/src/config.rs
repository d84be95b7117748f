//! Dashboard configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DashboardError, Result};

/// Longest chart range accepted from configuration
pub const MAX_RANGE_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Timer-driven refresh period
    pub refresh_interval_secs: u64,
    /// Rows in the recent cases table
    pub recent_cases_limit: usize,
    /// Days in the short-range volume chart
    pub short_range_days: u32,
    /// Days in the long-range response trend chart
    pub long_range_days: u32,
    /// Pause between destroying a chart and drawing its replacement
    pub chart_rebuild_delay_ms: u64,
    /// Buffer for UI triggers (visibility, focus)
    pub trigger_buffer: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
            recent_cases_limit: 10,
            short_range_days: 7,
            long_range_days: 30,
            chart_rebuild_delay_ms: 100,
            trigger_buffer: 16,
        }
    }
}

impl DashboardConfig {
    /// Load from a JSON file; missing keys take their defaults
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DashboardError::Config(format!("{}: {}", path, e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| DashboardError::Config(format!("{}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            return Err(DashboardError::Config("refresh_interval_secs must be positive".into()));
        }
        if self.short_range_days == 0 || self.long_range_days == 0 {
            return Err(DashboardError::Config("chart ranges need at least one day".into()));
        }
        if self.short_range_days > MAX_RANGE_DAYS || self.long_range_days > MAX_RANGE_DAYS {
            return Err(DashboardError::Config(format!("chart ranges are limited to {} days", MAX_RANGE_DAYS)));
        }
        if self.trigger_buffer == 0 {
            return Err(DashboardError::Config("trigger_buffer must be positive".into()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn chart_rebuild_delay(&self) -> Duration {
        Duration::from_millis(self.chart_rebuild_delay_ms)
    }
}
