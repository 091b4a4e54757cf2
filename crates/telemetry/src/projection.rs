//! Live dashboard readout
//!
//! "Apply the latest sample" projection. While an alert is active the
//! readout is pinned to the fall so a late sample cannot overwrite it.

use serde::Serialize;

use crate::sample::TelemetryUpdate;

/// Status text shown during a fall
pub const FALL_STATUS: &str = "FALL DETECTED!";
/// Status text shown after an alert is cleared
pub const MONITORING_STATUS: &str = "Monitoring...";

/// Colour class of the status text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Normal,
    Caution,
    Alert,
}

/// What the dashboard displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readout {
    /// G-force value
    pub value: f64,
    /// Gauge fill, 0 to 100
    pub gauge_percent: f64,
    pub status: String,
    pub tone: StatusTone,
}

/// Projection of the telemetry stream onto the dashboard readout
pub struct TelemetryProjection {
    full_scale_g: f64,
    readout: Readout,
    pinned: bool,
}

impl TelemetryProjection {
    pub fn new(full_scale_g: f64) -> Self {
        Self {
            full_scale_g,
            readout: Readout {
                value: 0.0,
                gauge_percent: 0.0,
                status: MONITORING_STATUS.to_string(),
                tone: StatusTone::Normal,
            },
            pinned: false,
        }
    }

    /// Apply a live sample unless an alert is active. Returns whether the
    /// readout changed.
    pub fn apply(&mut self, update: &TelemetryUpdate, alert_active: bool) -> bool {
        if alert_active || self.pinned {
            return false;
        }

        let status = if update.status.is_empty() {
            "Walking".to_string()
        } else {
            update.status.clone()
        };
        let tone = if status == "Walking" {
            StatusTone::Normal
        } else {
            StatusTone::Caution
        };

        self.readout = Readout {
            value: update.value,
            gauge_percent: self.gauge_percent(update.value),
            status,
            tone,
        };
        true
    }

    /// Pin the readout to a fall
    pub fn show_alert(&mut self, force_value: f64) {
        self.pinned = true;
        self.readout = Readout {
            value: force_value,
            gauge_percent: 100.0,
            status: FALL_STATUS.to_string(),
            tone: StatusTone::Alert,
        };
    }

    /// Unpin after the alert is cleared
    pub fn resume(&mut self) {
        self.pinned = false;
        self.readout.status = MONITORING_STATUS.to_string();
        self.readout.tone = StatusTone::Normal;
    }

    pub fn readout(&self) -> &Readout {
        &self.readout
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    fn gauge_percent(&self, value: f64) -> f64 {
        (value / self.full_scale_g * 100.0).clamp(0.0, 100.0)
    }
}

impl Default for TelemetryProjection {
    fn default() -> Self {
        Self::new(4.0)
    }
}
