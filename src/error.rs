//! Unified error handling for the wprime-balance library.
//!
//! Degenerate ride data (no samples, no power channel, no zone range for the
//! activity date) is never an error: the pipeline falls back to defined values.
//! Errors are reserved for caller contract violations and the JSON bridge.

use thiserror::Error;

/// Unified error type for W' balance operations.
#[derive(Debug, Error)]
pub enum WPrimeError {
    /// Recording interval must be a positive number of seconds
    #[error("Recording interval must be positive, got {interval}s")]
    InvalidRecordingInterval { interval: u32 },

    /// Configuration error
    #[error("Configuration error: {message}")]
    InvalidConfig { message: String },

    /// Metric values cannot be combined across activities
    #[error("Metric '{symbol}' cannot be aggregated across activities")]
    MetricNotAggregable { symbol: String },

    /// No metric registered under the symbol
    #[error("Unknown metric '{symbol}'")]
    UnknownMetric { symbol: String },

    /// JSON encode/decode failure in the bridge
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for W' balance operations.
pub type Result<T> = std::result::Result<T, WPrimeError>;
