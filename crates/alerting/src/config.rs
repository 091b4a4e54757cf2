//! Escalation configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::AlertError;

/// Escalation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Time the wearer has to answer before auto-escalation (seconds)
    pub confirmation_window_secs: u64,
    /// How long the "help requested" state is shown before returning to normal (seconds)
    pub help_display_secs: u64,
    /// Countdown display granularity (milliseconds)
    pub countdown_tick_ms: u64,
    /// Largest force accepted as a physical reading (G)
    pub max_force_g: f64,
    /// Capacity of the state-change broadcast channel
    pub event_buffer: usize,
    /// Name of the caretaker contacted on escalation
    pub caretaker: String,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            confirmation_window_secs: 15,
            help_display_secs: 3,
            countdown_tick_ms: 1000,
            max_force_g: 50.0,
            event_buffer: 64,
            caretaker: "caretaker".to_string(),
        }
    }
}

impl EscalationConfig {
    /// Confirmation window as a duration
    pub fn confirmation_window(&self) -> Duration {
        Duration::from_secs(self.confirmation_window_secs)
    }

    /// Help display hold as a duration
    pub fn help_display(&self) -> Duration {
        Duration::from_secs(self.help_display_secs)
    }

    /// Countdown tick as a duration
    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    /// Check the configuration for values the engine cannot run with
    pub fn validate(&self) -> Result<(), AlertError> {
        if self.confirmation_window_secs == 0 {
            return Err(AlertError::Config(
                "confirmation_window_secs must be at least 1".into(),
            ));
        }
        if self.countdown_tick_ms == 0 {
            return Err(AlertError::Config("countdown_tick_ms must be positive".into()));
        }
        if !self.max_force_g.is_finite() || self.max_force_g <= 0.0 {
            return Err(AlertError::Config(format!(
                "max_force_g must be a positive number, got {}",
                self.max_force_g
            )));
        }
        if self.event_buffer == 0 {
            return Err(AlertError::Config("event_buffer must be positive".into()));
        }
        Ok(())
    }
}
