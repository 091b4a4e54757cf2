//! Telemetry configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::TelemetryError;

/// Telemetry pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// G-force magnitude above which a sample counts as a fall
    pub threshold_g: f64,
    /// Interval between samples (milliseconds)
    pub sample_interval_ms: u64,
    /// G-force shown as a full gauge
    pub gauge_full_scale_g: f64,
    /// Synthetic sensor stream
    pub simulator: SimulatorConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            threshold_g: 3.0,
            sample_interval_ms: 500,
            gauge_full_scale_g: 4.0,
            simulator: SimulatorConfig::default(),
        }
    }
}

impl TelemetryConfig {
    /// Sample interval as a duration
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Check the configuration for values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if !self.threshold_g.is_finite() || self.threshold_g <= 0.0 {
            return Err(TelemetryError::Config(format!(
                "threshold_g must be positive, got {}",
                self.threshold_g
            )));
        }
        if self.sample_interval_ms == 0 {
            return Err(TelemetryError::Config(
                "sample_interval_ms must be positive".into(),
            ));
        }
        if !self.gauge_full_scale_g.is_finite() || self.gauge_full_scale_g <= 0.0 {
            return Err(TelemetryError::Config(format!(
                "gauge_full_scale_g must be positive, got {}",
                self.gauge_full_scale_g
            )));
        }
        self.simulator.validate()
    }
}

/// Synthetic accelerometer stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Run the simulated sensor
    pub enabled: bool,
    /// Bounds of the random delay between simulated falls (seconds)
    pub fall_interval_secs: (u64, u64),
    /// Bounds of the random delay between walking / sitting switches (seconds)
    pub activity_interval_secs: (u64, u64),
    /// Fixed RNG seed for reproducible streams
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fall_interval_secs: (20, 60),
            activity_interval_secs: (10, 20),
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), TelemetryError> {
        for (name, (low, high)) in [
            ("fall_interval_secs", self.fall_interval_secs),
            ("activity_interval_secs", self.activity_interval_secs),
        ] {
            if low == 0 || low > high {
                return Err(TelemetryError::Config(format!(
                    "{} must be a non-empty range of positive seconds, got [{}, {}]",
                    name, low, high
                )));
            }
        }
        Ok(())
    }
}
