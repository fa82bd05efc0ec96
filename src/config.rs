//! Tunable parameters for the W' balance pipeline.
//!
//! The match thresholds (100J to count a match, 2000J to mark it on a chart)
//! and the 25 second smoothing window are empirically tuned, not derived.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WPrimeError};

/// Length of the decay window in seconds (20 minutes).
pub const DEFAULT_DECAY_WINDOW_SECS: usize = 1200;

/// Smoothing used when looking for matches.
pub const DEFAULT_MATCH_SMOOTHING_SECS: usize = 25;

/// Minimum W' cost for an above-CP interval to count as a match.
pub const DEFAULT_MATCH_MIN_JOULES: f64 = 100.0;

/// Minimum W' cost for a match to appear in the chart marker series.
pub const DEFAULT_MARKER_MIN_JOULES: f64 = 2000.0;

/// CP used when no zone configuration is available at all.
pub const DEFAULT_CP_WATTS: u32 = 250;

/// Configuration for W' balance computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WPrimeConfig {
    /// Trailing window for the decay convolution.
    /// Default: 1200 seconds
    pub decay_window_secs: usize,

    /// Trailing moving-average window for match detection.
    /// Default: 25 seconds
    pub match_smoothing_secs: usize,

    /// Minimum cost in joules for a match to be reported.
    /// Default: 100.0
    pub match_min_joules: f64,

    /// Minimum cost in joules for a match to be projected onto chart markers.
    /// Default: 2000.0
    pub marker_min_joules: f64,

    /// CP in watts when there is no zone provider.
    /// Default: 250
    pub default_cp: u32,
}

impl Default for WPrimeConfig {
    fn default() -> Self {
        Self {
            decay_window_secs: DEFAULT_DECAY_WINDOW_SECS,
            match_smoothing_secs: DEFAULT_MATCH_SMOOTHING_SECS,
            match_min_joules: DEFAULT_MATCH_MIN_JOULES,
            marker_min_joules: DEFAULT_MARKER_MIN_JOULES,
            default_cp: DEFAULT_CP_WATTS,
        }
    }
}

impl WPrimeConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the windows and thresholds are usable.
    pub fn validate(&self) -> Result<()> {
        if self.decay_window_secs == 0 {
            return Err(WPrimeError::InvalidConfig {
                message: "decay_window_secs must be at least 1".to_string(),
            });
        }
        if self.match_smoothing_secs == 0 {
            return Err(WPrimeError::InvalidConfig {
                message: "match_smoothing_secs must be at least 1".to_string(),
            });
        }
        if !self.match_min_joules.is_finite() || !self.marker_min_joules.is_finite() {
            return Err(WPrimeError::InvalidConfig {
                message: "match thresholds must be finite".to_string(),
            });
        }
        Ok(())
    }
}
