//! Wearable Telemetry
//!
//! Accelerometer samples and the pieces around them:
//! - Fall classification by G-force magnitude
//! - Synthetic walking / sitting stream with periodic fall spikes
//! - Live dashboard readout that yields to an active alert

pub mod config;
pub mod detector;
pub mod projection;
pub mod sample;
pub mod simulator;

pub use config::{SimulatorConfig, TelemetryConfig};
pub use detector::{Detection, FallDetector};
pub use projection::{Readout, StatusTone, TelemetryProjection};
pub use sample::{AccelSample, TelemetryUpdate};
pub use simulator::{Activity, ActivitySimulator, SimulatedSample};

use thiserror::Error;

/// Telemetry error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
