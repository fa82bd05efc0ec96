//! Match detection: above-CP efforts that cost a meaningful amount of W'.
//!
//! A match opens when either the smoothed or the raw power reaches CP, and only
//! closes once both have dropped below it. The close point is then walked back
//! over the raw data to the last second still at or above CP, so the trailing
//! tail of the moving average is not counted. A match still open when the data
//! ends is dropped.
//!
//! ## Example
//! ```rust
//! use wprime_balance::depletion::compute_depletion;
//! use wprime_balance::matches::detect_matches;
//! use wprime_balance::thresholds::excess_power;
//!
//! let mut raw = vec![100; 10];
//! raw.extend(vec![300; 20]);
//! raw.extend(vec![100; 40]);
//! let depletion = compute_depletion(&excess_power(&raw, 200), 20000, 516, 1200);
//! let matches = detect_matches(&raw, 200, &depletion.values, 25, 100.0);
//! assert_eq!(matches.len(), 1);
//! assert_eq!((matches[0].start, matches[0].stop), (10, 29));
//! ```

use serde::{Deserialize, Serialize};

/// An above-CP interval that depleted W'.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// First second of the effort
    pub start: usize,
    /// Last second at or above CP
    pub stop: usize,
    /// Duration in seconds, inclusive of both ends
    pub secs: u32,
    /// W' spent between start and stop, in joules
    pub cost: f64,
}

/// A point on the sparse chart marker series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerPoint {
    /// Position in minutes from the start
    pub minutes: f64,
    /// W' balance at that point
    pub balance: f64,
}

/// Trailing moving average of `window` seconds into `out`.
///
/// Seconds before `window` keep their raw value. The average is built from
/// the end backwards with a running sum: at each step the value leaving the
/// window is subtracted and the one entering is added.
pub fn smooth_into(raw: &[i32], window: usize, out: &mut Vec<f64>) {
    out.clear();
    out.extend(raw.iter().map(|&w| w as f64));
    if window == 0 || raw.len() <= window {
        return;
    }

    let last = raw.len() - 1;
    let mut total: f64 = raw[last + 1 - window..=last].iter().map(|&w| w as f64).sum();

    for i in (window..=last).rev() {
        out[i] = total / window as f64;
        total -= raw[i] as f64;
        total += raw[i - window] as f64;
    }
}

/// Trailing moving average of `window` seconds.
pub fn smooth(raw: &[i32], window: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(raw.len());
    smooth_into(raw, window, &mut out);
    out
}

/// Scan for matches given an already smoothed series.
///
/// `raw`, `smoothed` and `depletion` must be the same length.
pub fn scan_matches(
    raw: &[i32],
    smoothed: &[f64],
    cp: u32,
    depletion: &[f64],
    min_cost: f64,
) -> Vec<Match> {
    let cp_watts = cp as i64;
    let cp_f = cp as f64;
    let len = raw.len().min(smoothed.len()).min(depletion.len());

    let mut matches = Vec::new();
    let mut open: Option<usize> = None;

    for i in 0..len {
        let raw_above = raw[i] as i64 >= cp_watts;
        let smooth_above = smoothed[i] >= cp_f;

        match open {
            None if raw_above || smooth_above => open = Some(i),
            Some(start) if !raw_above && !smooth_above => {
                let mut end = i - 1;
                while end > start && (raw[end] as i64) < cp_watts {
                    end -= 1;
                }

                if end > start {
                    let cost = depletion[start] - depletion[end];
                    if cost >= min_cost {
                        matches.push(Match {
                            start,
                            stop: end,
                            secs: (end - start + 1) as u32,
                            cost,
                        });
                    }
                }
                open = None;
            }
            _ => {}
        }
    }

    matches
}

/// Detect matches in a whole-watt series.
///
/// # Arguments
/// * `raw` - Dense whole-watt series (1Hz)
/// * `cp` - Critical power in watts
/// * `depletion` - W' balance series for the same activity
/// * `smoothing` - Moving-average window (25 seconds by default)
/// * `min_cost` - Minimum W' cost in joules (100 by default)
pub fn detect_matches(
    raw: &[i32],
    cp: u32,
    depletion: &[f64],
    smoothing: usize,
    min_cost: f64,
) -> Vec<Match> {
    let smoothed = smooth(raw, smoothing);
    scan_matches(raw, &smoothed, cp, depletion, min_cost)
}

/// Start and stop markers for matches costing at least `min_cost` joules.
pub fn match_markers(
    matches: &[Match],
    depletion: &[f64],
    minutes: &[f64],
    min_cost: f64,
) -> Vec<MarkerPoint> {
    matches
        .iter()
        .filter(|m| m.cost >= min_cost)
        .flat_map(|m| [m.start, m.stop])
        .filter_map(|i| {
            Some(MarkerPoint {
                minutes: *minutes.get(i)?,
                balance: *depletion.get(i)?,
            })
        })
        .collect()
}
