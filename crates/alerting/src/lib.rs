//! Fall Alert Escalation
//!
//! State machine that runs after a fall is reported: a timed confirmation
//! window, race-free cancellation of that window, idempotent resolution and
//! an audit trail of every safety event.

mod config;
mod engine;
mod notifier;
mod timer;
mod types;

pub use config::EscalationConfig;
pub use engine::AlertEngine;
pub use notifier::{CaretakerNotifier, EscalationNotice, LogNotifier};
pub use timer::CountdownTimer;
pub use types::{
    AlertEvent, AlertId, AlertSnapshot, FallEvent, MonitoringState, ReportOutcome,
    RespondOutcome, Resolution, ResponseAction, StatusSnapshot,
};

use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlertError {
    #[error("Force value {value} G is outside the accepted range [0, {max}] G")]
    ForceOutOfRange { value: f64, max: f64 },

    #[error("Force value is not a finite number")]
    NonFiniteForce,

    #[error("Unknown response action: {0}")]
    UnknownAction(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
