//! Alert lifecycle types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::AlertError;

/// Identifier of one alert lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(Uuid);

impl AlertId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monitoring state of the wearer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringState {
    #[default]
    Normal,
    AlertRaised,
    AwaitingConfirmation,
    Resolved,
}

impl MonitoringState {
    /// Whether `next` is a lifecycle edge from this state.
    ///
    /// Operator reset is not an edge; it forces `Normal` from anywhere.
    pub fn can_transition_to(self, next: MonitoringState) -> bool {
        matches!(
            (self, next),
            (MonitoringState::Normal, MonitoringState::AlertRaised)
                | (MonitoringState::AlertRaised, MonitoringState::AwaitingConfirmation)
                | (MonitoringState::AwaitingConfirmation, MonitoringState::Resolved)
                | (MonitoringState::Resolved, MonitoringState::Normal)
        )
    }
}

impl fmt::Display for MonitoringState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MonitoringState::Normal => "normal",
            MonitoringState::AlertRaised => "alert_raised",
            MonitoringState::AwaitingConfirmation => "awaiting_confirmation",
            MonitoringState::Resolved => "resolved",
        };
        f.write_str(name)
    }
}

/// A fall reported by an event source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallEvent {
    /// Impact force (G)
    pub force_value: f64,
    /// When the fall happened
    pub occurred_at: DateTime<Utc>,
}

impl FallEvent {
    /// Fall happening now
    pub fn new(force_value: f64) -> Self {
        Self::at(force_value, Utc::now())
    }

    /// Fall at a given instant
    pub fn at(force_value: f64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            force_value,
            occurred_at,
        }
    }
}

/// Wearer's answer to the confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAction {
    /// "I'm fine"
    #[serde(alias = "fine")]
    Ok,
    /// "Need help"
    Help,
}

impl FromStr for ResponseAction {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" | "fine" => Ok(ResponseAction::Ok),
            "help" => Ok(ResponseAction::Help),
            other => Err(AlertError::UnknownAction(other.to_string())),
        }
    }
}

/// How a lifecycle was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Wearer confirmed they are fine
    ConfirmedOk,
    /// Wearer asked for help
    HelpRequested,
    /// Confirmation window ran out
    AutoEscalated,
}

impl Resolution {
    /// Whether the caretaker is contacted
    pub fn is_escalation(&self) -> bool {
        !matches!(self, Resolution::ConfirmedOk)
    }

    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::ConfirmedOk => "confirmed_ok",
            Resolution::HelpRequested => "help_requested",
            Resolution::AutoEscalated => "auto_escalated",
        }
    }
}

/// Result of reporting a fall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReportOutcome {
    /// A new lifecycle was started
    Raised { alert_id: AlertId },
    /// A lifecycle was already in progress
    Ignored { active: AlertId },
}

/// Result of a wearer response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RespondOutcome {
    /// The response resolved the active lifecycle
    Applied {
        alert_id: AlertId,
        resolution: Resolution,
    },
    /// Nothing was awaiting confirmation
    Ignored,
}

/// Active alert as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSnapshot {
    pub alert_id: AlertId,
    /// Force of the fall that opened the lifecycle (G)
    pub force_value: f64,
    /// Force of the most recent fall reported during the lifecycle (G)
    pub latest_force_value: f64,
    pub occurred_at: DateTime<Utc>,
    /// Seconds left in the confirmation window, while awaiting confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

/// Current monitoring status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub state: MonitoringState,
    pub alert_active: bool,
    pub help_requested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertSnapshot>,
}

/// Notification emitted by the alert engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertEvent {
    /// The monitoring state changed
    StateChanged {
        #[serde(skip_serializing_if = "Option::is_none")]
        alert_id: Option<AlertId>,
        from: MonitoringState,
        to: MonitoringState,
        /// Force of the lifecycle's fall, when one is active
        #[serde(skip_serializing_if = "Option::is_none")]
        force_value: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        resolution: Option<Resolution>,
    },
    /// Confirmation countdown tick
    Countdown {
        alert_id: AlertId,
        remaining_seconds: u32,
    },
}
