//! Accelerometer samples

use serde::{Deserialize, Serialize};

/// Three-axis acceleration reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccelSample {
    /// Acceleration in X (g)
    pub x: f64,
    /// Acceleration in Y (g)
    pub y: f64,
    /// Acceleration in Z (g)
    pub z: f64,
    /// Capture time (milliseconds since the Unix epoch)
    pub timestamp_ms: u64,
}

impl AccelSample {
    pub fn new(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self {
            x,
            y,
            z,
            timestamp_ms,
        }
    }

    /// Total G-force magnitude
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Live reading pushed to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryUpdate {
    /// Activity label, or `FALL DETECTED!`
    pub status: String,
    /// G-force magnitude, rounded to two decimals
    pub value: f64,
}

impl TelemetryUpdate {
    pub fn new(status: impl Into<String>, value: f64) -> Self {
        Self {
            status: status.into(),
            value: (value * 100.0).round() / 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude() {
        let sample = AccelSample::new(3.0, 4.0, 0.0, 0);
        assert!((sample.magnitude() - 5.0).abs() < 1e-12);
        assert_eq!(AccelSample::default().magnitude(), 0.0);
    }

    #[test]
    fn test_update_rounds_value() {
        let update = TelemetryUpdate::new("Walking", 1.73205);
        assert_eq!(update.value, 1.73);
        assert_eq!(update.status, "Walking");
    }
}
