//! Simulated wearable accelerometer
//!
//! Stands in for real hardware: the wearer alternates between walking and
//! sitting, and a high-impact spike is injected at random intervals.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::SimulatorConfig;
use crate::sample::AccelSample;

/// Wearer activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Activity {
    Walking,
    Sitting,
}

impl Activity {
    pub fn label(&self) -> &'static str {
        match self {
            Activity::Walking => "Walking",
            Activity::Sitting => "Sitting",
        }
    }

    fn toggled(self) -> Self {
        match self {
            Activity::Walking => Activity::Sitting,
            Activity::Sitting => Activity::Walking,
        }
    }
}

/// One simulated reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedSample {
    pub sample: AccelSample,
    pub activity: Activity,
    /// Whether this reading is an injected impact spike
    pub spike: bool,
}

/// Random walking / sitting stream with periodic fall spikes
pub struct ActivitySimulator {
    rng: StdRng,
    config: SimulatorConfig,
    activity: Activity,
    next_activity_change: Instant,
    next_fall: Instant,
}

impl ActivitySimulator {
    /// Create a simulator whose schedule starts at `now`
    pub fn new(config: SimulatorConfig, now: Instant) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let next_fall = now + random_delay(&mut rng, config.fall_interval_secs);
        let next_activity_change = now + random_delay(&mut rng, config.activity_interval_secs);

        Self {
            rng,
            config,
            activity: Activity::Walking,
            next_activity_change,
            next_fall,
        }
    }

    /// Current activity
    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// When the next spike is due
    pub fn next_fall(&self) -> Instant {
        self.next_fall
    }

    /// Produce the reading for `now`
    pub fn next_sample(&mut self, now: Instant, timestamp_ms: u64) -> SimulatedSample {
        if now >= self.next_activity_change {
            self.activity = self.activity.toggled();
            self.next_activity_change =
                now + random_delay(&mut self.rng, self.config.activity_interval_secs);
            debug!("Simulated activity switched to {}", self.activity.label());
        }

        let spike = now >= self.next_fall;
        let (x, y, z) = if spike {
            self.next_fall = now + random_delay(&mut self.rng, self.config.fall_interval_secs);
            (
                self.rng.gen_range(3.0..5.0),
                self.rng.gen_range(3.0..5.0),
                self.rng.gen_range(3.0..5.0),
            )
        } else {
            match self.activity {
                Activity::Sitting => (
                    self.rng.gen_range(0.98..1.02),
                    self.rng.gen_range(0.0..0.1),
                    self.rng.gen_range(0.0..0.1),
                ),
                Activity::Walking => (
                    self.rng.gen_range(0.95..1.15),
                    self.rng.gen_range(0.95..1.15),
                    self.rng.gen_range(0.95..1.15),
                ),
            }
        };

        SimulatedSample {
            sample: AccelSample::new(x, y, z, timestamp_ms),
            activity: self.activity,
            spike,
        }
    }
}

/// Impact force for a manually triggered test fall, in [3.5, 6.0) G
pub fn manual_fall_force() -> f64 {
    let force: f64 = rand::thread_rng().gen_range(3.5..6.0);
    (force * 100.0).round() / 100.0
}

fn random_delay(rng: &mut StdRng, (low, high): (u64, u64)) -> Duration {
    Duration::from_secs_f64(rng.gen_range(low as f64..=high as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::FallDetector;

    fn seeded(seed: u64) -> SimulatorConfig {
        SimulatorConfig {
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_fall_within_configured_window() {
        let start = Instant::now();
        let sim = ActivitySimulator::new(seeded(7), start);
        let delay = sim.next_fall() - start;
        assert!(delay >= Duration::from_secs(20));
        assert!(delay <= Duration::from_secs(60));
    }

    #[test]
    fn test_quiet_samples_stay_below_threshold() {
        let start = Instant::now();
        let mut sim = ActivitySimulator::new(seeded(1), start);
        let detector = FallDetector::default();

        // First 19.5 s: no spike can be due yet
        for i in 0..40u64 {
            let now = start + Duration::from_millis(i * 500);
            let reading = sim.next_sample(now, i * 500);
            assert!(!reading.spike);
            assert!(!detector.check(&reading.sample).is_fall);
        }
    }

    #[test]
    fn test_spike_is_detected_and_rescheduled() {
        let start = Instant::now();
        let mut sim = ActivitySimulator::new(seeded(3), start);
        let due = sim.next_fall();

        let reading = sim.next_sample(due, 0);
        assert!(reading.spike);
        assert!(FallDetector::default().check(&reading.sample).is_fall);
        assert!(sim.next_fall() >= due + Duration::from_secs(20));

        let after = sim.next_sample(due + Duration::from_millis(500), 500);
        assert!(!after.spike);
    }

    #[test]
    fn test_activity_toggles() {
        let start = Instant::now();
        let mut sim = ActivitySimulator::new(seeded(11), start);
        assert_eq!(sim.activity(), Activity::Walking);

        sim.next_sample(start + Duration::from_secs(21), 0);
        assert_eq!(sim.activity(), Activity::Sitting);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let start = Instant::now();
        let mut a = ActivitySimulator::new(seeded(42), start);
        let mut b = ActivitySimulator::new(seeded(42), start);
        for i in 0..20u64 {
            let now = start + Duration::from_secs(i * 3);
            assert_eq!(a.next_sample(now, i), b.next_sample(now, i));
        }
    }

    #[test]
    fn test_manual_fall_force_range() {
        for _ in 0..100 {
            let force = manual_fall_force();
            assert!((3.5..=6.0).contains(&force));
        }
    }
}
