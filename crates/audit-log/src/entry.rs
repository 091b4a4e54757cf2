//! Audit Entry Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of safety event recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A fall started a new alert lifecycle
    FallDetected,
    /// The wearer confirmed they are fine
    UserConfirmedOk,
    /// The wearer asked for help
    UserRequestedHelp,
    /// Nobody answered within the confirmation window
    AutoEscalated,
}

impl EventType {
    /// Human-readable label shown in the activity table
    pub fn label(&self) -> &'static str {
        match self {
            EventType::FallDetected => "FALL DETECTED",
            EventType::UserConfirmedOk => "User Confirmed: OK",
            EventType::UserRequestedHelp => "Help Requested",
            EventType::AutoEscalated => "Auto-Escalated: No Response",
        }
    }

    /// Whether this event closes an alert lifecycle
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EventType::FallDetected)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the append order (never reused, survives `clear`)
    pub sequence: u64,
    /// When the entry was appended
    pub timestamp: DateTime<Utc>,
    /// What happened
    pub event_type: EventType,
    /// Impact force in G, rounded to two decimals
    pub force_value: f64,
}

impl LogEntry {
    /// Wall-clock time formatted for display (`HH:MM:SS`)
    pub fn time_display(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// Calendar date formatted for display (`YYYY-MM-DD`)
    pub fn date_display(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }
}

/// Round a force reading the way it is displayed (two decimals)
pub(crate) fn round_force(force_value: f64) -> f64 {
    (force_value * 100.0).round() / 100.0
}
