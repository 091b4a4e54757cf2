//! Alert Engine Implementation
//!
//! Single authority over the monitoring state. Every mutation happens under
//! one mutex that is never held across an `.await`; timer callbacks re-enter
//! through the same lock and re-check the lifecycle guard before acting.

use audit_log::{AuditLog, EventType, LogEntry};
use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::EscalationConfig;
use crate::notifier::{CaretakerNotifier, EscalationNotice, LogNotifier};
use crate::timer::CountdownTimer;
use crate::types::{
    AlertEvent, AlertId, AlertSnapshot, FallEvent, MonitoringState, ReportOutcome,
    RespondOutcome, Resolution, ResponseAction, StatusSnapshot,
};
use crate::AlertError;

/// One pass from fall detection to resolution
struct Lifecycle {
    id: AlertId,
    force_value: f64,
    latest_force_value: f64,
    occurred_at: DateTime<Utc>,
    /// Live confirmation countdown (at most one system-wide)
    confirmation: Option<CountdownTimer>,
    /// "Help requested" display hold
    hold: Option<CountdownTimer>,
    resolution: Option<Resolution>,
}

/// `lifecycle` is `Some` exactly when `state` is not `Normal`
struct Machine {
    state: MonitoringState,
    lifecycle: Option<Lifecycle>,
}

struct Shared {
    config: EscalationConfig,
    machine: Mutex<Machine>,
    log: Arc<AuditLog>,
    notifier: Arc<dyn CaretakerNotifier>,
    events: broadcast::Sender<AlertEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(|poisoned| {
            warn!("Alert engine lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn transition(&self, machine: &mut Machine, to: MonitoringState) {
        let from = machine.state;
        debug_assert!(
            from.can_transition_to(to),
            "illegal lifecycle edge {} -> {}",
            from,
            to
        );
        machine.state = to;

        let (alert_id, force_value, resolution) = match &machine.lifecycle {
            Some(l) => (Some(l.id), Some(l.force_value), l.resolution),
            None => (None, None, None),
        };
        info!("Monitoring state {} -> {}", from, to);
        let _ = self.events.send(AlertEvent::StateChanged {
            alert_id,
            from,
            to,
            force_value,
            resolution,
        });
    }
}

/// Fall alert state machine
///
/// Cheap to clone; all clones drive the same state.
#[derive(Clone)]
pub struct AlertEngine {
    shared: Arc<Shared>,
}

impl AlertEngine {
    /// Create an engine with a fresh audit log and a logging notifier
    pub fn new(config: EscalationConfig) -> Result<Self, AlertError> {
        let notifier = Arc::new(LogNotifier::new(config.caretaker.clone()));
        Self::with_parts(config, Arc::new(AuditLog::new()), notifier)
    }

    /// Create an engine around an existing audit log and notifier
    pub fn with_parts(
        config: EscalationConfig,
        log: Arc<AuditLog>,
        notifier: Arc<dyn CaretakerNotifier>,
    ) -> Result<Self, AlertError> {
        config.validate()?;
        info!("Creating alert engine with config: {:?}", config);

        let (events, _) = broadcast::channel(config.event_buffer);
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                machine: Mutex::new(Machine {
                    state: MonitoringState::Normal,
                    lifecycle: None,
                }),
                log,
                notifier,
                events,
            }),
        })
    }

    /// Report a fall.
    ///
    /// Starts a lifecycle from `Normal`. While a lifecycle is in progress the
    /// fall only refreshes the alert's displayed force: no log entry and no
    /// second timer.
    pub fn report_fall(&self, event: FallEvent) -> Result<ReportOutcome, AlertError> {
        self.validate_force(event.force_value)?;

        let shared = &self.shared;
        let mut machine = shared.lock();

        if let Some(active) = machine.lifecycle.as_mut() {
            active.latest_force_value = event.force_value;
            debug!(
                alert_id = %active.id,
                "Fall of {:.2} G during active alert, not starting a new one",
                event.force_value
            );
            counter!("fallwatch_falls_ignored_total").increment(1);
            return Ok(ReportOutcome::Ignored { active: active.id });
        }

        let alert_id = AlertId::new();
        machine.lifecycle = Some(Lifecycle {
            id: alert_id,
            force_value: event.force_value,
            latest_force_value: event.force_value,
            occurred_at: event.occurred_at,
            confirmation: None,
            hold: None,
            resolution: None,
        });

        shared.transition(&mut machine, MonitoringState::AlertRaised);
        shared.log.append(EventType::FallDetected, event.force_value);
        shared.transition(&mut machine, MonitoringState::AwaitingConfirmation);

        let timer = self.start_confirmation(alert_id);
        if let Some(lifecycle) = machine.lifecycle.as_mut() {
            lifecycle.confirmation = Some(timer);
        }

        warn!(
            alert_id = %alert_id,
            "Fall detected ({:.2} G), awaiting confirmation for {}s",
            event.force_value,
            shared.config.confirmation_window_secs
        );
        counter!("fallwatch_falls_reported_total").increment(1);
        Ok(ReportOutcome::Raised { alert_id })
    }

    /// Apply the wearer's answer to the confirmation prompt.
    ///
    /// Only effective while awaiting confirmation; anything else is a no-op.
    pub fn respond(&self, action: ResponseAction) -> RespondOutcome {
        let shared = &self.shared;
        let mut machine = shared.lock();

        if machine.state != MonitoringState::AwaitingConfirmation {
            debug!("Ignoring {:?} response in state {}", action, machine.state);
            return RespondOutcome::Ignored;
        }
        let Some(lifecycle) = machine.lifecycle.as_mut() else {
            return RespondOutcome::Ignored;
        };

        // Cancel before appending so the expiry callback cannot also log
        if let Some(timer) = lifecycle.confirmation.take() {
            timer.cancel();
        }
        let alert_id = lifecycle.id;
        let force_value = lifecycle.force_value;

        let (resolution, notice) = match action {
            ResponseAction::Ok => {
                shared.log.append(EventType::UserConfirmedOk, 0.0);
                lifecycle.resolution = Some(Resolution::ConfirmedOk);
                shared.transition(&mut machine, MonitoringState::Resolved);
                shared.transition(&mut machine, MonitoringState::Normal);
                machine.lifecycle = None;
                counter!("fallwatch_resolutions_total", "outcome" => Resolution::ConfirmedOk.as_str())
                    .increment(1);
                info!(alert_id = %alert_id, "Wearer confirmed OK, monitoring resumed");
                (Resolution::ConfirmedOk, None)
            }
            ResponseAction::Help => {
                shared.log.append(EventType::UserRequestedHelp, force_value);
                let notice = self.escalate(&mut machine, Resolution::HelpRequested);
                (Resolution::HelpRequested, notice)
            }
        };
        drop(machine);

        if let Some(notice) = notice {
            shared.notifier.notify(&notice);
        }
        RespondOutcome::Applied {
            alert_id,
            resolution,
        }
    }

    /// Confirmation window expiry for `alert_id`.
    ///
    /// Has effect only when `alert_id` is the tracked lifecycle and it is
    /// still awaiting confirmation; a timer that lost the race to a response
    /// or reset is ignored.
    pub fn timer_expired(&self, alert_id: AlertId) -> bool {
        let shared = &self.shared;
        let mut machine = shared.lock();

        let current = machine.lifecycle.as_ref().map(|l| l.id);
        if machine.state != MonitoringState::AwaitingConfirmation || current != Some(alert_id) {
            debug!(alert_id = %alert_id, "Ignoring stale confirmation expiry");
            return false;
        }
        let Some(lifecycle) = machine.lifecycle.as_mut() else {
            return false;
        };

        lifecycle.confirmation.take();
        let force_value = lifecycle.force_value;
        shared.log.append(EventType::AutoEscalated, force_value);
        warn!(
            alert_id = %alert_id,
            "No response within {}s, escalating automatically",
            shared.config.confirmation_window_secs
        );

        let notice = self.escalate(&mut machine, Resolution::AutoEscalated);
        drop(machine);

        if let Some(notice) = notice {
            shared.notifier.notify(&notice);
        }
        true
    }

    /// Operator reset: cancel any live timer and force `Normal`.
    ///
    /// Not a safety event, so nothing is logged. Returns whether anything
    /// changed.
    pub fn reset(&self) -> bool {
        let shared = &self.shared;
        let mut machine = shared.lock();

        let lifecycle = machine.lifecycle.take();
        if let Some(l) = &lifecycle {
            if let Some(timer) = &l.confirmation {
                timer.cancel();
            }
            if let Some(timer) = &l.hold {
                timer.cancel();
            }
        }

        let from = machine.state;
        if from == MonitoringState::Normal && lifecycle.is_none() {
            debug!("Reset requested while already monitoring normally");
            return false;
        }

        machine.state = MonitoringState::Normal;
        info!("Operator reset from {}, monitoring resumed", from);
        let _ = shared.events.send(AlertEvent::StateChanged {
            alert_id: lifecycle.as_ref().map(|l| l.id),
            from,
            to: MonitoringState::Normal,
            force_value: None,
            resolution: None,
        });
        counter!("fallwatch_resets_total").increment(1);
        true
    }

    /// Drop all audit entries; returns how many were removed
    pub fn clear_log(&self) -> usize {
        self.shared.log.clear()
    }

    /// Current monitoring state
    pub fn state(&self) -> MonitoringState {
        self.shared.lock().state
    }

    /// Whether an alert lifecycle is in progress
    pub fn is_alert_active(&self) -> bool {
        self.state() != MonitoringState::Normal
    }

    /// Seconds left in the confirmation window, if one is running
    pub fn remaining_seconds(&self) -> Option<u32> {
        let machine = self.shared.lock();
        machine
            .lifecycle
            .as_ref()
            .and_then(|l| l.confirmation.as_ref())
            .map(|t| t.remaining_seconds())
    }

    /// Number of confirmation timers that can still fire (0 or 1)
    pub fn live_timer_count(&self) -> usize {
        let machine = self.shared.lock();
        machine
            .lifecycle
            .iter()
            .filter_map(|l| l.confirmation.as_ref())
            .filter(|t| !t.has_fired() && !t.is_cancelled())
            .count()
    }

    /// State plus the active alert, for display
    pub fn snapshot(&self) -> StatusSnapshot {
        let machine = self.shared.lock();
        let alert = machine.lifecycle.as_ref().map(|l| AlertSnapshot {
            alert_id: l.id,
            force_value: l.force_value,
            latest_force_value: l.latest_force_value,
            occurred_at: l.occurred_at,
            remaining_seconds: l.confirmation.as_ref().map(|t| t.remaining_seconds()),
            resolution: l.resolution,
        });
        let help_requested = alert
            .as_ref()
            .and_then(|a| a.resolution)
            .map_or(false, |r| r.is_escalation());

        StatusSnapshot {
            state: machine.state,
            alert_active: machine.state != MonitoringState::Normal,
            help_requested,
            alert,
        }
    }

    /// Subscribe to state changes and countdown ticks
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.shared.events.subscribe()
    }

    /// Shared audit log
    pub fn audit_log(&self) -> Arc<AuditLog> {
        Arc::clone(&self.shared.log)
    }

    /// Audit entries, most recent first
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.shared.log.all()
    }

    /// Engine configuration
    pub fn config(&self) -> &EscalationConfig {
        &self.shared.config
    }

    fn validate_force(&self, force_value: f64) -> Result<(), AlertError> {
        if !force_value.is_finite() {
            warn!("Rejected fall report with non-finite force");
            return Err(AlertError::NonFiniteForce);
        }
        let max = self.shared.config.max_force_g;
        if !(0.0..=max).contains(&force_value) {
            warn!("Rejected fall report with force {} G", force_value);
            return Err(AlertError::ForceOutOfRange {
                value: force_value,
                max,
            });
        }
        Ok(())
    }

    /// Enter the "help requested" hold. Caller has already logged the
    /// terminal entry and must deliver the returned notice after unlocking.
    fn escalate(&self, machine: &mut Machine, resolution: Resolution) -> Option<EscalationNotice> {
        let hold = {
            let lifecycle = machine.lifecycle.as_ref()?;
            self.start_hold(lifecycle.id)
        };
        let lifecycle = machine.lifecycle.as_mut()?;
        lifecycle.resolution = Some(resolution);
        lifecycle.hold = Some(hold);

        let notice = EscalationNotice {
            alert_id: lifecycle.id,
            force_value: lifecycle.force_value,
            reason: resolution,
            occurred_at: lifecycle.occurred_at,
            escalated_at: Utc::now(),
        };

        self.shared.transition(machine, MonitoringState::Resolved);
        counter!("fallwatch_resolutions_total", "outcome" => resolution.as_str()).increment(1);
        Some(notice)
    }

    /// Hold finished: leave the help display and resume monitoring
    fn finish_hold(&self, alert_id: AlertId) -> bool {
        let shared = &self.shared;
        let mut machine = shared.lock();

        let current = machine.lifecycle.as_ref().map(|l| l.id);
        if machine.state != MonitoringState::Resolved || current != Some(alert_id) {
            debug!(alert_id = %alert_id, "Ignoring stale help display expiry");
            return false;
        }

        shared.transition(&mut machine, MonitoringState::Normal);
        machine.lifecycle = None;
        info!(alert_id = %alert_id, "Help display finished, monitoring resumed");
        true
    }

    fn start_confirmation(&self, alert_id: AlertId) -> CountdownTimer {
        let config = &self.shared.config;
        let events = self.shared.events.clone();
        let engine = Arc::downgrade(&self.shared);

        CountdownTimer::start(
            config.confirmation_window(),
            config.countdown_tick(),
            move |remaining_seconds| {
                let _ = events.send(AlertEvent::Countdown {
                    alert_id,
                    remaining_seconds,
                });
            },
            move || {
                if let Some(shared) = engine.upgrade() {
                    AlertEngine { shared }.timer_expired(alert_id);
                }
            },
        )
    }

    fn start_hold(&self, alert_id: AlertId) -> CountdownTimer {
        let config = &self.shared.config;
        let engine = Arc::downgrade(&self.shared);

        CountdownTimer::start(
            config.help_display(),
            config.countdown_tick(),
            |_| {},
            move || {
                if let Some(shared) = engine.upgrade() {
                    AlertEngine { shared }.finish_hold(alert_id);
                }
            },
        )
    }
}
