//! JSON entry points for callers on the other side of a language boundary.
//!
//! Inputs are the serde forms of [`RideSeries`], [`CpZones`] and
//! [`WPrimeConfig`]; outputs are serialized results.

use log::info;

use crate::config::WPrimeConfig;
use crate::engine::WPrimeEngine;
use crate::error::Result;
use crate::metrics::{MinWPrime, RideMetric};
use crate::thresholds::{CpZones, ZoneProvider};
use crate::RideSeries;

fn parse_inputs(
    ride_json: &str,
    zones_json: Option<&str>,
    config_json: Option<&str>,
) -> Result<(RideSeries, Option<CpZones>, WPrimeConfig)> {
    let ride: RideSeries = serde_json::from_str(ride_json)?;
    let zones = zones_json
        .map(|json| serde_json::from_str::<CpZones>(json))
        .transpose()?;
    let config = match config_json {
        Some(json) => WPrimeConfig::from_json(json)?,
        None => WPrimeConfig::default(),
    };
    Ok((ride, zones, config))
}

/// Compute the full W' balance result and return it as JSON.
///
/// With no `zones_json` the default CP applies and W' is zero.
pub fn analyze_ride_json(
    ride_json: &str,
    zones_json: Option<&str>,
    config_json: Option<&str>,
) -> Result<String> {
    let (ride, zones, config) = parse_inputs(ride_json, zones_json, config_json)?;

    let mut engine = WPrimeEngine::with_config(config)?;
    let result = engine.compute(&ride, zones.as_ref().map(|z| z as &dyn ZoneProvider))?;

    info!(
        "[Bridge] Analyzed {} samples, {} matches",
        ride.samples.len(),
        result.matches.len()
    );

    Ok(serde_json::to_string(&result)?)
}

/// Minimum W' in kJ for one ride.
pub fn min_wprime_json(
    ride_json: &str,
    zones_json: Option<&str>,
    config_json: Option<&str>,
) -> Result<f64> {
    let (ride, zones, config) = parse_inputs(ride_json, zones_json, config_json)?;
    MinWPrime::with_config(config).compute(&ride, zones.as_ref().map(|z| z as &dyn ZoneProvider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::WPrimeResult;

    const RIDE: &str = r#"{
        "samples": [
            {"secs": 0, "watts": 100.0},
            {"secs": 1, "watts": 100.0},
            {"secs": 2, "watts": 400.0},
            {"secs": 3, "watts": 400.0},
            {"secs": 4, "watts": 100.0}
        ],
        "recording_interval": 1,
        "has_power": true,
        "date": "2024-05-01"
    }"#;

    const ZONES: &str = r#"{
        "ranges": [{"from": "2024-01-01", "to": null, "cp": 250, "w_prime": 20000}]
    }"#;

    #[test]
    fn test_analyze_ride_json() {
        let json = analyze_ride_json(RIDE, Some(ZONES), None).unwrap();
        let result: WPrimeResult = serde_json::from_str(&json).unwrap();

        assert_eq!(result.thresholds.cp, 250);
        assert_eq!(result.thresholds.w_prime, 20000);
        assert_eq!(result.depletion.len(), 5);
        assert_eq!(result.minutes.len(), 5);
        assert!(result.depletion.values[3] < 20000.0);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(analyze_ride_json("{", None, None).is_err());
        assert!(analyze_ride_json(RIDE, Some("[]"), None).is_err());
        assert!(analyze_ride_json(RIDE, None, Some(r#"{"decay_window_secs": 0}"#)).is_err());
    }

    #[test]
    fn test_min_wprime_json() {
        let value = min_wprime_json(RIDE, Some(ZONES), None).unwrap();
        assert!(value < 20.0);
        assert!(value > 19.0);
    }
}
