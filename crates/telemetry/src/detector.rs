//! Threshold fall detector

use serde::Serialize;
use tracing::info;

use crate::sample::AccelSample;
use crate::TelemetryError;

/// Largest threshold an operator may configure (G)
const MAX_THRESHOLD_G: f64 = 16.0;

/// Classification of one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub is_fall: bool,
    /// G-force magnitude of the sample
    pub g_force: f64,
}

/// Flags samples whose G-force magnitude exceeds a threshold
#[derive(Debug, Clone)]
pub struct FallDetector {
    threshold_g: f64,
}

impl FallDetector {
    pub fn new(threshold_g: f64) -> Result<Self, TelemetryError> {
        validate_threshold(threshold_g)?;
        Ok(Self { threshold_g })
    }

    /// Classify a sample; strictly above the threshold is a fall
    pub fn check(&self, sample: &AccelSample) -> Detection {
        let g_force = sample.magnitude();
        Detection {
            is_fall: g_force > self.threshold_g,
            g_force,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_g
    }

    /// Change the threshold; invalid values leave it untouched
    pub fn set_threshold(&mut self, threshold_g: f64) -> Result<(), TelemetryError> {
        validate_threshold(threshold_g)?;
        info!("Fall threshold updated: {} G -> {} G", self.threshold_g, threshold_g);
        self.threshold_g = threshold_g;
        Ok(())
    }
}

impl Default for FallDetector {
    fn default() -> Self {
        Self { threshold_g: 3.0 }
    }
}

fn validate_threshold(threshold_g: f64) -> Result<(), TelemetryError> {
    if !threshold_g.is_finite() || threshold_g <= 0.0 || threshold_g > MAX_THRESHOLD_G {
        return Err(TelemetryError::OutOfRange {
            field: "threshold_g",
            value: threshold_g,
            min: 0.0,
            max: MAX_THRESHOLD_G,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_detects_spike() {
        let detector = FallDetector::default();
        let detection = detector.check(&AccelSample::new(4.0, 4.0, 4.0, 0));
        assert!(detection.is_fall);
        assert!((detection.g_force - 6.928).abs() < 1e-3);
    }

    #[test]
    fn test_walking_is_not_a_fall() {
        let detector = FallDetector::default();
        let detection = detector.check(&AccelSample::new(1.15, 1.15, 1.15, 0));
        assert!(!detection.is_fall);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let detector = FallDetector::new(5.0).unwrap();
        assert!(!detector.check(&AccelSample::new(3.0, 4.0, 0.0, 0)).is_fall);
    }

    #[test]
    fn test_set_threshold() {
        let mut detector = FallDetector::default();
        detector.set_threshold(2.5).unwrap();
        assert_eq!(detector.threshold(), 2.5);

        assert!(detector.set_threshold(-1.0).is_err());
        assert!(detector.set_threshold(f64::INFINITY).is_err());
        assert!(detector.set_threshold(100.0).is_err());
        assert_eq!(detector.threshold(), 2.5);
    }

    proptest! {
        #[test]
        fn prop_fall_iff_magnitude_above_threshold(
            x in -8.0f64..8.0,
            y in -8.0f64..8.0,
            z in -8.0f64..8.0,
            threshold in 0.5f64..10.0,
        ) {
            let detector = FallDetector::new(threshold).unwrap();
            let sample = AccelSample::new(x, y, z, 0);
            let detection = detector.check(&sample);
            prop_assert_eq!(detection.is_fall, sample.magnitude() > threshold);
        }
    }
}
