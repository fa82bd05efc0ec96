//! CP / W' lookup and the excess-power preparation for the decay model.
//!
//! ## Example
//! ```rust
//! use chrono::NaiveDate;
//! use wprime_balance::thresholds::{derive_thresholds, CpRange, CpZones};
//!
//! let zones = CpZones::new(vec![CpRange::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     None,
//!     280,
//!     22000,
//! )]);
//! let watts = vec![150, 200, 350, 400, 180];
//! let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let thresholds = derive_thresholds(&watts, date, Some(&zones), 250);
//! assert_eq!(thresholds.cp, 280);
//! ```

use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

/// Source of CP and W' for an activity date.
///
/// Ranges are addressed by index, as returned from `which_range`.
pub trait ZoneProvider {
    /// Index of the range covering `date`, if any.
    fn which_range(&self, date: NaiveDate) -> Option<usize>;
    /// Critical power in watts for a range.
    fn cp(&self, range: usize) -> u32;
    /// W' in joules for a range.
    fn w_prime(&self, range: usize) -> u32;
}

/// A dated CP / W' setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpRange {
    /// First day the setting applies (inclusive)
    pub from: NaiveDate,
    /// Day the setting stops applying (exclusive), open-ended if None
    pub to: Option<NaiveDate>,
    /// Critical power in watts
    pub cp: u32,
    /// W' in joules
    pub w_prime: u32,
}

impl CpRange {
    pub fn new(from: NaiveDate, to: Option<NaiveDate>, cp: u32, w_prime: u32) -> Self {
        Self {
            from,
            to,
            cp,
            w_prime,
        }
    }

    fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && self.to.map_or(true, |to| date < to)
    }
}

/// In-memory zone configuration: a list of dated CP ranges.
///
/// When ranges overlap the first listed range wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpZones {
    pub ranges: Vec<CpRange>,
}

impl CpZones {
    pub fn new(ranges: Vec<CpRange>) -> Self {
        Self { ranges }
    }
}

impl ZoneProvider for CpZones {
    fn which_range(&self, date: NaiveDate) -> Option<usize> {
        self.ranges.iter().position(|r| r.contains(date))
    }

    fn cp(&self, range: usize) -> u32 {
        self.ranges.get(range).map_or(0, |r| r.cp)
    }

    fn w_prime(&self, range: usize) -> u32 {
        self.ranges.get(range).map_or(0, |r| r.w_prime)
    }
}

/// Parameters for one W' balance run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Critical power in watts
    pub cp: u32,
    /// Initial W' in joules
    pub w_prime: u32,
    /// Reconstitution time constant in seconds
    pub tau: u32,
}

/// Look up CP and W' for a date.
///
/// No provider at all falls back to `default_cp` with zero W'. A provider with
/// no range for the date yields zero for both.
pub fn lookup_cp(
    date: NaiveDate,
    zones: Option<&dyn ZoneProvider>,
    default_cp: u32,
) -> (u32, u32) {
    let Some(zones) = zones else {
        return (default_cp, 0);
    };
    match zones.which_range(date) {
        Some(range) => (zones.cp(range), zones.w_prime(range)),
        None => {
            warn!("[WPrime] No CP range covers {}, using CP=0 W'=0", date);
            (0, 0)
        }
    }
}

/// Mean of the whole-watt values strictly below CP, or 0 when there are none.
pub fn below_cp_mean(watts: &[i32], cp: u32) -> f64 {
    let cp = cp as i64;
    let (total, count) = watts
        .iter()
        .filter(|&&w| (w as i64) < cp)
        .fold((0.0f64, 0u64), |(total, count), &w| (total + w as f64, count + 1));

    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Reconstitution time constant, truncated toward zero.
///
/// `TAU = 546 * e^(-0.01 * (CP - below_mean)) + 316`
pub fn tau_from(cp: u32, below_mean: f64) -> u32 {
    let raw = 546.0 * (-0.01 * (cp as f64 - below_mean)).exp() + 316.0;
    raw.trunc() as u32
}

/// Power above CP for every second, zero at or below CP. `out` is cleared first.
pub fn excess_power_into(watts: &[i32], cp: u32, out: &mut Vec<i32>) {
    let cp = cp as i64;
    out.clear();
    out.extend(watts.iter().map(|&w| (w as i64 - cp).max(0) as i32));
}

/// Power above CP for every second.
pub fn excess_power(watts: &[i32], cp: u32) -> Vec<i32> {
    let mut out = Vec::with_capacity(watts.len());
    excess_power_into(watts, cp, &mut out);
    out
}

/// Derive CP, W' and TAU for an activity.
///
/// # Arguments
/// * `watts` - Dense whole-watt series (1Hz)
/// * `date` - Activity date used for the zone lookup
/// * `zones` - Zone configuration, if any
/// * `default_cp` - CP used when `zones` is None
pub fn derive_thresholds(
    watts: &[i32],
    date: NaiveDate,
    zones: Option<&dyn ZoneProvider>,
    default_cp: u32,
) -> Thresholds {
    let (cp, w_prime) = lookup_cp(date, zones, default_cp);
    let tau = tau_from(cp, below_cp_mean(watts, cp));
    Thresholds { cp, w_prime, tau }
}
