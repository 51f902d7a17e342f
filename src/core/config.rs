//! Monitor configuration: TOML file settings plus the evaluator's view.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, WqmError};

/// Exact bytes per megabyte of threshold input.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Largest accepted threshold, in megabytes (20 GB).
pub const MAX_THRESHOLD_MB: u64 = 20 * 1024;

/// The fixed warning bands the settings surface exposes.
pub const WARNING_BAND_75: u8 = 75;
/// See [`WARNING_BAND_75`].
pub const WARNING_BAND_90: u8 = 90;

/// User-facing monitor settings, loadable from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Explicit workspace path. May contain a leading `~` and escaped spaces.
    pub path: Option<String>,
    /// Size threshold in megabytes (1–20480).
    pub threshold_mb: u64,
    /// Master switch for the fractional warning bands.
    pub enable_warnings: bool,
    /// Warn when a size reaches 75% of the threshold.
    pub warn_at_75: bool,
    /// Warn when a size reaches 90% of the threshold.
    pub warn_at_90: bool,
    /// Suffix whose files are accounted for as one combined entity.
    pub grouped_extension: String,
    /// Seconds between repeat displays of an unacknowledged alert.
    pub repeat_interval_secs: u64,
    /// Seconds between scans in watch mode.
    pub poll_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            path: None,
            threshold_mb: 10,
            enable_warnings: true,
            warn_at_75: true,
            warn_at_90: true,
            grouped_extension: ".caido".to_string(),
            repeat_interval_secs: 60,
            poll_interval_secs: 30,
        }
    }
}

impl MonitorConfig {
    /// Loads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                WqmError::MissingConfig {
                    path: path.to_path_buf(),
                }
            } else {
                WqmError::io(path, source)
            }
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the UI range would never produce.
    pub fn validate(&self) -> Result<()> {
        if self.threshold_mb == 0 || self.threshold_mb > MAX_THRESHOLD_MB {
            return Err(WqmError::InvalidConfig {
                details: format!(
                    "threshold_mb must be within 1..={MAX_THRESHOLD_MB}, got {}",
                    self.threshold_mb
                ),
            });
        }
        if self.grouped_extension.is_empty() {
            return Err(WqmError::InvalidConfig {
                details: "grouped_extension must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The evaluator's view of these settings.
    #[must_use]
    pub fn threshold(&self) -> ThresholdConfig {
        let mut warning_percentages = Vec::new();
        if self.warn_at_75 {
            warning_percentages.push(WARNING_BAND_75);
        }
        if self.warn_at_90 {
            warning_percentages.push(WARNING_BAND_90);
        }
        ThresholdConfig {
            threshold_bytes: self.threshold_mb * BYTES_PER_MB,
            enable_warnings: self.enable_warnings,
            warning_percentages,
        }
    }

    /// Repeat interval for the alert escalator.
    #[must_use]
    pub const fn repeat_interval(&self) -> Duration {
        Duration::from_secs(self.repeat_interval_secs)
    }

    /// Scan cadence for watch mode.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Threshold settings handed to the evaluator. Supplied fresh per call and
/// not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdConfig {
    /// Hard limit in exact bytes.
    pub threshold_bytes: u64,
    /// Whether the warning bands apply at all.
    pub enable_warnings: bool,
    /// Bands checked in this order; the first match wins.
    pub warning_percentages: Vec<u8>,
}

impl ThresholdConfig {
    /// Builds a config from a megabyte threshold, the unit the UI exposes.
    #[must_use]
    pub fn from_megabytes(
        threshold_mb: u64,
        enable_warnings: bool,
        warning_percentages: Vec<u8>,
    ) -> Self {
        Self {
            threshold_bytes: threshold_mb * BYTES_PER_MB,
            enable_warnings,
            warning_percentages,
        }
    }
}
