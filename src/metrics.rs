//! Ride metrics derived from the W' balance model.
//!
//! Metrics are collected in a [`MetricCatalogue`] owned by the caller.
//! Nothing registers itself: the catalogue owner opts in with
//! [`register_wprime_metrics`].
//!
//! ## Example
//! ```rust
//! use wprime_balance::metrics::{register_wprime_metrics, MetricCatalogue, MIN_WPRIME_SYMBOL};
//!
//! let mut catalogue = MetricCatalogue::new();
//! register_wprime_metrics(&mut catalogue);
//! let metric = catalogue.get(MIN_WPRIME_SYMBOL).unwrap();
//! assert!(!metric.can_aggregate());
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::WPrimeConfig;
use crate::engine::WPrimeEngine;
use crate::error::{Result, WPrimeError};
use crate::thresholds::ZoneProvider;
use crate::RideSeries;

/// Symbol of the minimum W' metric.
pub const MIN_WPRIME_SYMBOL: &str = "skiba_wprime_low";

/// How values of a metric combine across activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// Sum over activities
    Total,
    /// Mean over activities
    Average,
    /// Highest value wins
    Peak,
    /// Lowest value wins
    Low,
}

/// A value computed from a single ride.
pub trait RideMetric: Send + Sync {
    /// Stable identifier
    fn symbol(&self) -> &'static str;
    /// Display name
    fn name(&self) -> &'static str;
    /// Display units
    fn units(&self) -> &'static str;
    /// Decimal places to show
    fn precision(&self) -> u32;
    fn kind(&self) -> MetricKind;
    /// Whether values from several activities may be combined.
    fn can_aggregate(&self) -> bool {
        true
    }
    /// Compute the metric for one ride.
    fn compute(&self, ride: &RideSeries, zones: Option<&dyn ZoneProvider>) -> Result<f64>;
}

/// Round to a number of decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

/// Lowest W' balance of a ride, in kJ.
///
/// Only meaningful per activity; averaging or summing it across rides is refused.
#[derive(Debug, Clone, Default)]
pub struct MinWPrime {
    config: WPrimeConfig,
}

impl MinWPrime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WPrimeConfig) -> Self {
        Self { config }
    }
}

impl RideMetric for MinWPrime {
    fn symbol(&self) -> &'static str {
        MIN_WPRIME_SYMBOL
    }

    fn name(&self) -> &'static str {
        "Minimum W'"
    }

    fn units(&self) -> &'static str {
        "kJ"
    }

    fn precision(&self) -> u32 {
        1
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Low
    }

    fn can_aggregate(&self) -> bool {
        false
    }

    fn compute(&self, ride: &RideSeries, zones: Option<&dyn ZoneProvider>) -> Result<f64> {
        let mut engine = WPrimeEngine::with_config(self.config.clone())?;
        let result = engine.compute(ride, zones)?;
        Ok(round_to(result.min_balance() / 1000.0, self.precision()))
    }
}

/// Registry of ride metrics, keyed by symbol.
#[derive(Default)]
pub struct MetricCatalogue {
    metrics: Vec<Box<dyn RideMetric>>,
}

impl MetricCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric. A metric with the same symbol is replaced.
    pub fn register(&mut self, metric: Box<dyn RideMetric>) {
        match self.metrics.iter().position(|m| m.symbol() == metric.symbol()) {
            Some(idx) => self.metrics[idx] = metric,
            None => {
                debug!("[Metrics] Registered {}", metric.symbol());
                self.metrics.push(metric);
            }
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&dyn RideMetric> {
        self.metrics
            .iter()
            .find(|m| m.symbol() == symbol)
            .map(|m| m.as_ref())
    }

    /// Symbols in registration order.
    pub fn symbols(&self) -> Vec<&'static str> {
        self.metrics.iter().map(|m| m.symbol()).collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Compute one metric for a ride.
    pub fn compute(
        &self,
        symbol: &str,
        ride: &RideSeries,
        zones: Option<&dyn ZoneProvider>,
    ) -> Result<f64> {
        self.lookup(symbol)?.compute(ride, zones)
    }

    /// Combine per-activity values of a metric.
    ///
    /// Fails for metrics that must be recomputed per activity.
    pub fn aggregate(&self, symbol: &str, values: &[f64]) -> Result<f64> {
        let metric = self.lookup(symbol)?;
        if !metric.can_aggregate() {
            return Err(WPrimeError::MetricNotAggregable {
                symbol: symbol.to_string(),
            });
        }
        if values.is_empty() {
            return Ok(0.0);
        }

        let value = match metric.kind() {
            MetricKind::Total => values.iter().sum(),
            MetricKind::Average => values.iter().sum::<f64>() / values.len() as f64,
            MetricKind::Peak => values.iter().cloned().fold(f64::MIN, f64::max),
            MetricKind::Low => values.iter().cloned().fold(f64::MAX, f64::min),
        };
        Ok(value)
    }

    fn lookup(&self, symbol: &str) -> Result<&dyn RideMetric> {
        self.get(symbol).ok_or_else(|| WPrimeError::UnknownMetric {
            symbol: symbol.to_string(),
        })
    }
}

/// Add the W' balance metrics to a catalogue.
pub fn register_wprime_metrics(catalogue: &mut MetricCatalogue) {
    catalogue.register(Box::new(MinWPrime::new()));
}

/// Minimum W' (kJ) for each activity, each computed on its own engine.
///
/// # Arguments
/// * `rides` - (activity_id, ride) pairs
/// * `zones` - Zone configuration shared by all rides
/// * `config` - Pipeline configuration
pub fn compute_min_wprime_multi(
    rides: &[(String, RideSeries)],
    zones: Option<&dyn ZoneProvider>,
    config: &WPrimeConfig,
) -> Result<Vec<(String, f64)>> {
    let metric = MinWPrime::with_config(config.clone());
    rides
        .iter()
        .map(|(activity_id, ride)| -> Result<(String, f64)> {
            Ok((activity_id.clone(), metric.compute(ride, zones)?))
        })
        .collect()
}

/// Minimum W' for each activity using parallel processing.
#[cfg(feature = "parallel")]
pub fn compute_min_wprime_multi_parallel(
    rides: &[(String, RideSeries)],
    zones: Option<&(dyn ZoneProvider + Sync)>,
    config: &WPrimeConfig,
) -> Result<Vec<(String, f64)>> {
    if rides.len() < 4 {
        return compute_min_wprime_multi(rides, zones.map(|z| z as &dyn ZoneProvider), config);
    }

    let metric = MinWPrime::with_config(config.clone());
    rides
        .par_iter()
        .map(|(activity_id, ride)| -> Result<(String, f64)> {
            let value = metric.compute(ride, zones.map(|z| z as &dyn ZoneProvider))?;
            Ok((activity_id.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thresholds::{CpRange, CpZones};
    use chrono::NaiveDate;

    struct TotalWork;

    impl RideMetric for TotalWork {
        fn symbol(&self) -> &'static str {
            "total_work"
        }
        fn name(&self) -> &'static str {
            "Work"
        }
        fn units(&self) -> &'static str {
            "kJ"
        }
        fn precision(&self) -> u32 {
            0
        }
        fn kind(&self) -> MetricKind {
            MetricKind::Total
        }
        fn compute(&self, ride: &RideSeries, _zones: Option<&dyn ZoneProvider>) -> Result<f64> {
            Ok(ride.samples.iter().map(|s| s.watts).sum::<f64>() / 1000.0)
        }
    }

    fn zones() -> CpZones {
        CpZones::new(vec![CpRange::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            None,
            250,
            20000,
        )])
    }

    fn hard_ride(secs_above: usize) -> RideSeries {
        let mut watts = vec![150.0; 30];
        watts.extend(vec![450.0; secs_above]);
        watts.extend(vec![150.0; 60]);
        RideSeries::from_watts(&watts, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(-3.4567, 1), -3.5);
        assert_eq!(round_to(12.04, 1), 12.0);
        assert_eq!(round_to(7.0, 0), 7.0);
    }

    #[test]
    fn test_min_wprime_value() {
        let ride = hard_ride(60);
        let zones = zones();

        let mut engine = WPrimeEngine::new();
        let result = engine.compute(&ride, Some(&zones)).unwrap();
        let expected = round_to(result.min_balance() / 1000.0, 1);

        let value = MinWPrime::new().compute(&ride, Some(&zones)).unwrap();
        assert_eq!(value, expected);
        // 60s at 200W over CP takes a big bite out of 20kJ
        assert!(value > 0.0 && value < 20.0);
    }

    #[test]
    fn test_min_wprime_untouched_ride() {
        let ride = RideSeries::from_watts(&[100.0; 120], NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        let value = MinWPrime::new().compute(&ride, Some(&zones())).unwrap();
        assert_eq!(value, 20.0);
    }

    #[test]
    fn test_min_wprime_no_power() {
        let mut ride = hard_ride(60);
        ride.has_power = false;
        assert_eq!(MinWPrime::new().compute(&ride, Some(&zones())).unwrap(), 0.0);
    }

    #[test]
    fn test_catalogue_opt_in() {
        let mut catalogue = MetricCatalogue::new();
        assert!(catalogue.get(MIN_WPRIME_SYMBOL).is_none());

        register_wprime_metrics(&mut catalogue);
        register_wprime_metrics(&mut catalogue);
        assert_eq!(catalogue.len(), 1);

        let metric = catalogue.get(MIN_WPRIME_SYMBOL).unwrap();
        assert_eq!(metric.name(), "Minimum W'");
        assert_eq!(metric.units(), "kJ");
        assert_eq!(metric.precision(), 1);
        assert_eq!(metric.kind(), MetricKind::Low);
    }

    #[test]
    fn test_min_wprime_not_aggregable() {
        let mut catalogue = MetricCatalogue::new();
        register_wprime_metrics(&mut catalogue);

        let err = catalogue.aggregate(MIN_WPRIME_SYMBOL, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, WPrimeError::MetricNotAggregable { .. }));
    }

    #[test]
    fn test_aggregable_metric() {
        let mut catalogue = MetricCatalogue::new();
        catalogue.register(Box::new(TotalWork));
        assert_eq!(catalogue.aggregate("total_work", &[1.0, 2.5]).unwrap(), 3.5);
        assert!(matches!(
            catalogue.aggregate("nope", &[1.0]),
            Err(WPrimeError::UnknownMetric { .. })
        ));
    }

    #[test]
    fn test_multi_is_per_activity() {
        let rides = vec![
            ("short".to_string(), hard_ride(20)),
            ("long".to_string(), hard_ride(90)),
        ];
        let zones = zones();
        let values = compute_min_wprime_multi(&rides, Some(&zones), &WPrimeConfig::default()).unwrap();

        assert_eq!(values.len(), 2);
        assert_eq!(values[0].0, "short");
        assert!(values[1].1 < values[0].1);

        let single = MinWPrime::new().compute(&rides[0].1, Some(&zones)).unwrap();
        assert_eq!(values[0].1, single);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_multi_parallel_matches_sequential() {
        let rides: Vec<(String, RideSeries)> = [10, 30, 60, 90, 120]
            .iter()
            .map(|&secs| (format!("ride_{}", secs), hard_ride(secs)))
            .collect();
        let zones = zones();
        let config = WPrimeConfig::default();

        let sequential = compute_min_wprime_multi(&rides, Some(&zones), &config).unwrap();
        let parallel = compute_min_wprime_multi_parallel(&rides, Some(&zones), &config).unwrap();

        assert_eq!(parallel.len(), 5);
        assert_eq!(parallel, sequential);
        assert_eq!(parallel[4].0, "ride_120");
    }
}
