//! Caretaker notification

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::types::{AlertId, Resolution};

/// Escalation handed to the caretaker channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscalationNotice {
    pub alert_id: AlertId,
    /// Impact force of the fall (G)
    pub force_value: f64,
    /// Why the caretaker is contacted
    pub reason: Resolution,
    /// When the fall happened
    pub occurred_at: DateTime<Utc>,
    /// When the escalation was decided
    pub escalated_at: DateTime<Utc>,
}

/// Delivery channel for escalations
///
/// Called exactly once per escalated lifecycle, outside the engine lock.
pub trait CaretakerNotifier: Send + Sync {
    fn notify(&self, notice: &EscalationNotice);
}

/// Notifier that only logs the call/SMS it would place
pub struct LogNotifier {
    caretaker: String,
}

impl LogNotifier {
    pub fn new(caretaker: impl Into<String>) -> Self {
        Self {
            caretaker: caretaker.into(),
        }
    }
}

impl CaretakerNotifier for LogNotifier {
    fn notify(&self, notice: &EscalationNotice) {
        warn!(
            alert_id = %notice.alert_id,
            reason = notice.reason.as_str(),
            "[EMERGENCY] Fall detected! Impact: {:.2}G",
            notice.force_value
        );
        info!(
            "Calling {}... sending SMS with location and time: {}",
            self.caretaker,
            notice.escalated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}
