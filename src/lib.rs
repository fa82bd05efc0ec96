//! # W' Balance
//!
//! W' balance modelling for recorded power data.
//!
//! Given critical power (CP) and anaerobic work capacity (W'), this library
//! reconstructs how much of W' remains at every second of an activity and
//! finds the "matches" burnt along the way.
//!
//! The pipeline:
//! - Resample irregular samples to a dense 1Hz series (zero-filled gaps, natural cubic spline)
//! - Look up CP / W' for the activity date and derive the recovery time constant
//! - Convolve above-CP power with an exponential decay over the trailing 20 minutes
//! - Detect matches with a smoothed, two-signal CP crossing scan
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch metric computation with rayon
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use wprime_balance::{CpRange, CpZones, RideSeries, WPrimeEngine};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
//! let zones = CpZones::new(vec![CpRange::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     None,
//!     250,
//!     20000,
//! )]);
//!
//! let mut watts = vec![150.0; 60];
//! watts.extend(vec![450.0; 60]);
//! watts.extend(vec![150.0; 120]);
//! let ride = RideSeries::from_watts(&watts, date);
//!
//! let mut engine = WPrimeEngine::new();
//! let result = engine.compute(&ride, Some(&zones)).unwrap();
//! println!("Lowest W': {:.0}J, {} matches", result.min_balance(), result.matches.len());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, WPrimeError};

// Tunable constants and configuration
pub mod config;
pub use config::WPrimeConfig;

// Natural cubic spline used by the resampler
pub mod spline;
pub use spline::NaturalSpline;

// Irregular samples -> dense 1Hz series
pub mod resample;
pub use resample::resample;

// CP / W' lookup, excess power, TAU
pub mod thresholds;
pub use thresholds::{derive_thresholds, excess_power, CpRange, CpZones, Thresholds, ZoneProvider};

// Decay convolution
pub mod depletion;
pub use depletion::{compute_depletion, time_axis_minutes, DepletionSeries};

// Match detection
pub mod matches;
pub use matches::{detect_matches, match_markers, MarkerPoint, Match};

// Stateful pipeline with reusable buffers
pub mod engine;
pub use engine::{WPrimeEngine, WPrimeResult, Workspace};

// Derived ride metrics
pub mod metrics;
pub use metrics::{
    compute_min_wprime_multi, register_wprime_metrics, MetricCatalogue, MinWPrime, RideMetric,
};
#[cfg(feature = "parallel")]
pub use metrics::compute_min_wprime_multi_parallel;

// JSON entry points
pub mod bridge;

// ============================================================================
// Core Types
// ============================================================================

/// A recorded power sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds from the start of the activity
    pub secs: u32,
    /// Power in watts
    pub watts: f64,
}

impl Sample {
    pub fn new(secs: u32, watts: f64) -> Self {
        Self { secs, watts }
    }
}

/// The slice of a ride the W' model needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideSeries {
    /// Samples ordered by time
    pub samples: Vec<Sample>,
    /// Nominal seconds between samples
    pub recording_interval: u32,
    /// Whether the recording has a power channel at all
    pub has_power: bool,
    /// Activity date, used to look up CP / W'
    pub date: NaiveDate,
}

impl RideSeries {
    pub fn new(samples: Vec<Sample>, recording_interval: u32, has_power: bool, date: NaiveDate) -> Self {
        Self {
            samples,
            recording_interval,
            has_power,
            date,
        }
    }

    /// Build a 1Hz ride from consecutive power values.
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use wprime_balance::RideSeries;
    ///
    /// let ride = RideSeries::from_watts(&[200.0, 210.0], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    /// assert_eq!(ride.samples[1].secs, 1);
    /// ```
    pub fn from_watts(watts: &[f64], date: NaiveDate) -> Self {
        let samples = watts
            .iter()
            .enumerate()
            .map(|(secs, &w)| Sample::new(secs as u32, w))
            .collect();
        Self::new(samples, 1, true, date)
    }
}
