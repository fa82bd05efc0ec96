//! Decay convolution: the W' balance series.
//!
//! For every second the balance is W' minus a sum of the excess power over the
//! trailing window, each term weighted by `e^(-j/TAU)` where `j` is its age in
//! seconds. Index 0 never contributes, so the first second always reads W'.
//!
//! ## Example
//! ```rust
//! use wprime_balance::depletion::compute_depletion;
//!
//! let excess = vec![0, 100, 100, 0, 0];
//! let series = compute_depletion(&excess, 20000, 500, 1200);
//! assert_eq!(series.values[0], 20000.0);
//! assert!(series.values[2] < series.values[1]);
//! ```

use serde::{Deserialize, Serialize};

/// Remaining W' for each second of an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepletionSeries {
    /// W' balance in joules, one value per second (may go negative)
    pub values: Vec<f64>,
    /// Lowest balance reached, never above 0
    pub min_y: f64,
    /// Highest balance reached, never below 0
    pub max_y: f64,
}

impl DepletionSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Fill `weights` with `e^(-j/tau)` for `j` in `0..window`.
pub fn decay_weights_into(tau: u32, window: usize, weights: &mut Vec<f64>) {
    weights.clear();
    let tau = tau.max(1) as f64;
    weights.extend((0..window).map(|j| (-(j as f64) / tau).exp()));
}

/// Compute the depletion series using precomputed decay weights.
///
/// The window length is `weights.len()`.
pub fn compute_depletion_with_weights(
    excess: &[i32],
    w_prime: u32,
    weights: &[f64],
) -> DepletionSeries {
    let w_prime = w_prime as f64;
    let mut values = Vec::with_capacity(excess.len());
    let mut min_y = 0.0f64;
    let mut max_y = 0.0f64;

    for i in 0..excess.len() {
        let terms = weights.len().min(i);
        let sumproduct: f64 = weights[..terms]
            .iter()
            .enumerate()
            .map(|(j, &weight)| excess[i - j] as f64 * weight)
            .sum();

        let value = w_prime - sumproduct;
        if value < min_y {
            min_y = value;
        }
        if value > max_y {
            max_y = value;
        }
        values.push(value);
    }

    DepletionSeries {
        values,
        min_y,
        max_y,
    }
}

/// Compute the W' balance series.
///
/// # Arguments
/// * `excess` - Power above CP for each second
/// * `w_prime` - Initial W' in joules
/// * `tau` - Reconstitution time constant in seconds
/// * `window` - Trailing window in seconds (1200 by default)
pub fn compute_depletion(excess: &[i32], w_prime: u32, tau: u32, window: usize) -> DepletionSeries {
    let mut weights = Vec::with_capacity(window);
    decay_weights_into(tau, window, &mut weights);
    compute_depletion_with_weights(excess, w_prime, &weights)
}

/// Time axis in minutes for charting, one entry per second.
pub fn time_axis_minutes(len: usize) -> Vec<f64> {
    (0..len).map(|i| i as f64 / 60.0).collect()
}
