//! # W' Balance Engine
//!
//! Runs the full pipeline for one ride at a time:
//!
//! 1. Resample the recorded samples to a dense 1Hz series
//! 2. Look up CP / W' and derive TAU
//! 3. Compute the W' balance series
//! 4. Detect matches and the chart markers
//!
//! The engine owns a [`Workspace`] of intermediate buffers that is reset at the
//! start of each run and reused by the next, so repeated calls on the same
//! engine avoid reallocating. Calls take `&mut self` and must be sequential.

use std::time::Instant;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::WPrimeConfig;
use crate::depletion::{
    compute_depletion_with_weights, decay_weights_into, time_axis_minutes, DepletionSeries,
};
use crate::error::Result;
use crate::matches::{match_markers, scan_matches, smooth_into, Match, MarkerPoint};
use crate::resample::{resample_into, whole_watts_into};
use crate::spline::NaturalSpline;
use crate::thresholds::{
    below_cp_mean, excess_power_into, lookup_cp, tau_from, Thresholds, ZoneProvider,
};
use crate::RideSeries;

/// Intermediate buffers for one computation.
#[derive(Debug, Default)]
pub struct Workspace {
    knots: Vec<(f64, f64)>,
    spline: NaturalSpline,
    dense: Vec<f64>,
    watts: Vec<i32>,
    excess: Vec<i32>,
    weights: Vec<f64>,
    smoothed: Vec<f64>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty every buffer, keeping the allocations.
    pub fn reset(&mut self) {
        self.knots.clear();
        self.dense.clear();
        self.watts.clear();
        self.excess.clear();
        self.weights.clear();
        self.smoothed.clear();
    }

    /// Dense whole-watt series from the last run.
    pub fn watts(&self) -> &[i32] {
        &self.watts
    }
}

/// Output of one W' balance computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WPrimeResult {
    /// CP, W' and TAU used for the run
    pub thresholds: Thresholds,
    /// Mean power below CP used to derive TAU
    pub below_cp_mean: f64,
    /// W' balance per second
    pub depletion: DepletionSeries,
    /// Time axis in minutes, parallel to the depletion values
    pub minutes: Vec<f64>,
    /// Matches in chronological order
    pub matches: Vec<Match>,
    /// Start/stop points of the larger matches, for charting
    pub markers: Vec<MarkerPoint>,
}

impl WPrimeResult {
    /// Lowest W' balance in joules, or 0 for an empty series.
    ///
    /// Unlike `depletion.min_y` this is not clamped to 0 from above.
    pub fn min_balance(&self) -> f64 {
        self.depletion
            .values
            .iter()
            .cloned()
            .reduce(f64::min)
            .unwrap_or(0.0)
    }
}

/// Stateful W' balance calculator.
#[derive(Debug, Default)]
pub struct WPrimeEngine {
    config: WPrimeConfig,
    workspace: Workspace,
}

impl WPrimeEngine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: WPrimeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            workspace: Workspace::new(),
        })
    }

    pub fn config(&self) -> &WPrimeConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Compute W' balance and matches for a ride.
    ///
    /// Rides with no samples or no power channel return an empty result with
    /// all thresholds at zero. That is a normal outcome, not an error.
    pub fn compute(
        &mut self,
        ride: &RideSeries,
        zones: Option<&dyn ZoneProvider>,
    ) -> Result<WPrimeResult> {
        let started = Instant::now();
        self.workspace.reset();

        if ride.samples.is_empty() || !ride.has_power {
            debug!("[WPrime] No power data, skipping");
            return Ok(WPrimeResult::default());
        }

        let ws = &mut self.workspace;
        let config = &self.config;

        // Step 1: 1 second series
        resample_into(
            &ride.samples,
            ride.recording_interval,
            &mut ws.knots,
            &mut ws.spline,
            &mut ws.dense,
        )?;
        whole_watts_into(&ws.dense, &mut ws.watts);
        debug!(
            "[WPrime] Resampled {} samples ({} knots) to {} seconds",
            ride.samples.len(),
            ws.knots.len(),
            ws.watts.len()
        );

        // Step 2: thresholds and excess power
        let (cp, w_prime) = lookup_cp(ride.date, zones, config.default_cp);
        let below_mean = below_cp_mean(&ws.watts, cp);
        let thresholds = Thresholds {
            cp,
            w_prime,
            tau: tau_from(cp, below_mean),
        };
        excess_power_into(&ws.watts, cp, &mut ws.excess);
        debug!(
            "[WPrime] CP={}W W'={}J TAU={}s (below CP mean {:.1}W)",
            thresholds.cp, thresholds.w_prime, thresholds.tau, below_mean
        );

        // Step 3: W' balance
        decay_weights_into(thresholds.tau, config.decay_window_secs, &mut ws.weights);
        let depletion = compute_depletion_with_weights(&ws.excess, w_prime, &ws.weights);
        let minutes = time_axis_minutes(depletion.len());

        // Step 4: matches
        smooth_into(&ws.watts, config.match_smoothing_secs, &mut ws.smoothed);
        let matches = scan_matches(
            &ws.watts,
            &ws.smoothed,
            cp,
            &depletion.values,
            config.match_min_joules,
        );
        let markers = match_markers(
            &matches,
            &depletion.values,
            &minutes,
            config.marker_min_joules,
        );

        info!(
            "[WPrime] {} seconds, min W'={:.0}J, {} matches in {:?}",
            depletion.len(),
            depletion.min_y,
            matches.len(),
            started.elapsed()
        );

        Ok(WPrimeResult {
            thresholds,
            below_cp_mean: below_mean,
            depletion,
            minutes,
            matches,
            markers,
        })
    }
}
