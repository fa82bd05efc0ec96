//! Conversion of recorded power samples to a dense 1 second series.
//!
//! Recording gaps are modelled as zero output (sensor dropout) rather than
//! missing data, and the result is interpolated with a natural cubic spline.
//!
//! ## Example
//! ```rust
//! use wprime_balance::{resample, Sample};
//!
//! let samples = vec![Sample::new(0, 200.0), Sample::new(1, 210.0), Sample::new(2, 220.0)];
//! let dense = resample(&samples, 1).unwrap();
//! assert_eq!(dense.len(), 3);
//! ```

use crate::error::{Result, WPrimeError};
use crate::spline::NaturalSpline;
use crate::Sample;

/// Build the spline knots from raw samples, appending to `knots`.
///
/// Samples that do not move time forward are dropped (first occurrence wins).
/// Between consecutive accepted samples, zero knots are inserted every
/// `interval_secs` strictly before the later sample. A recording that starts
/// after second 0 gets the same treatment, with zero knots from second 0.
pub fn gap_filled_knots_into(
    samples: &[Sample],
    interval_secs: u32,
    knots: &mut Vec<(f64, f64)>,
) -> Result<()> {
    if interval_secs == 0 {
        return Err(WPrimeError::InvalidRecordingInterval {
            interval: interval_secs,
        });
    }

    let mut prev: Option<u32> = None;
    for sample in samples {
        let mut t = match prev {
            Some(prev_secs) if sample.secs <= prev_secs => continue,
            Some(prev_secs) => prev_secs as u64 + interval_secs as u64,
            None => 0,
        };
        while t < sample.secs as u64 {
            knots.push((t as f64, 0.0));
            t += interval_secs as u64;
        }
        knots.push((sample.secs as f64, sample.watts));
        prev = Some(sample.secs);
    }
    Ok(())
}

/// Resample into a caller-owned buffer. `out` is cleared first.
///
/// `knots` and `spline` are scratch space, so repeated calls can reuse them.
pub fn resample_into(
    samples: &[Sample],
    interval_secs: u32,
    knots: &mut Vec<(f64, f64)>,
    spline: &mut NaturalSpline,
    out: &mut Vec<f64>,
) -> Result<()> {
    knots.clear();
    out.clear();
    gap_filled_knots_into(samples, interval_secs, knots)?;

    let Some(&(last, _)) = knots.last() else {
        return Ok(());
    };

    spline.set_points(knots);
    spline.sample_integers_into(last as u32, out);
    Ok(())
}

/// Resample samples to one value per second from 0 to the last accepted timestamp.
///
/// # Arguments
/// * `samples` - Recorded samples, ordered by time
/// * `interval_secs` - Nominal recording interval, used to detect gaps
///
/// # Returns
/// Dense series of length `last + 1`, or an empty series for empty input
pub fn resample(samples: &[Sample], interval_secs: u32) -> Result<Vec<f64>> {
    let mut knots = Vec::with_capacity(samples.len());
    let mut spline = NaturalSpline::new();
    let mut out = Vec::new();
    resample_into(samples, interval_secs, &mut knots, &mut spline, &mut out)?;
    Ok(out)
}

/// Truncate a dense series to whole watts (toward zero).
pub fn whole_watts_into(dense: &[f64], out: &mut Vec<i32>) {
    out.clear();
    out.extend(dense.iter().map(|&w| w as i32));
}
