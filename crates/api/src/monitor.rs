//! Background tasks
//!
//! The sensor monitor samples the (simulated) wearable and reports falls to
//! the alert engine. The alert projection task keeps the dashboard readout
//! pinned to an active fall.

use alerting::{AlertEvent, FallEvent, MonitoringState, ReportOutcome};
use telemetry::projection::FALL_STATUS;
use telemetry::{
    ActivitySimulator, SimulatedSample, TelemetryConfig, TelemetryProjection, TelemetryUpdate,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::{AppState, ApiError, SharedState};

/// Sample the simulated wearable forever
pub fn spawn_sensor_monitor(state: SharedState, config: TelemetryConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Sensor monitoring started ({} ms interval)",
            config.sample_interval_ms
        );
        let mut simulator =
            ActivitySimulator::new(config.simulator.clone(), std::time::Instant::now());
        let mut ticker = tokio::time::interval(config.sample_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let timestamp_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
            let reading = simulator.next_sample(std::time::Instant::now(), timestamp_ms);

            let mut state = state.write().await;
            if let Err(e) = process_sample(&mut state, &reading) {
                error!("Error processing sensor sample: {}", e);
            }
        }
    })
}

/// Classify one reading, report a fall if there is one and publish the live
/// update. Returns the engine's answer when a fall was reported.
pub fn process_sample(
    state: &mut AppState,
    reading: &SimulatedSample,
) -> Result<Option<ReportOutcome>, ApiError> {
    let detection = state.detector.check(&reading.sample);
    let update = if detection.is_fall {
        TelemetryUpdate::new(FALL_STATUS, detection.g_force)
    } else {
        TelemetryUpdate::new(reading.activity.label(), detection.g_force)
    };

    let outcome = if detection.is_fall {
        warn!("Sensor fall detected: {:.2} G", update.value);
        Some(state.engine.report_fall(FallEvent::new(update.value))?)
    } else {
        None
    };

    state.publish(update);
    Ok(outcome)
}

/// Follow alert events and pin or release the dashboard readout
pub fn spawn_alert_projection(
    state: SharedState,
    mut events: broadcast::Receiver<AlertEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let mut state = state.write().await;
                    apply_alert_event(&mut state.projection, &event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Alert projection lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Alert event channel closed");
                    break;
                }
            }
        }
    })
}

/// Apply one alert event to the readout
pub fn apply_alert_event(projection: &mut TelemetryProjection, event: &AlertEvent) {
    match event {
        AlertEvent::StateChanged {
            to: MonitoringState::AlertRaised,
            force_value: Some(force_value),
            ..
        } => projection.show_alert(*force_value),
        AlertEvent::StateChanged {
            to: MonitoringState::Normal,
            ..
        } => projection.resume(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;
    use audit_log::EventType;
    use telemetry::{AccelSample, Activity, StatusTone};

    fn reading(x: f64, y: f64, z: f64, activity: Activity) -> SimulatedSample {
        SimulatedSample {
            sample: AccelSample::new(x, y, z, 0),
            activity,
            spike: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_sample_updates_readout() {
        let mut state = AppState::new(&AppConfig::default()).unwrap();
        let mut rx = state.telemetry_tx.subscribe();

        let outcome =
            process_sample(&mut state, &reading(1.0, 0.05, 0.05, Activity::Sitting)).unwrap();
        assert!(outcome.is_none());
        assert_eq!(state.engine.state(), MonitoringState::Normal);

        let update = rx.recv().await.unwrap();
        assert_eq!(update.status, "Sitting");
        assert_eq!(state.projection.readout().status, "Sitting");
        assert_eq!(state.projection.readout().tone, StatusTone::Caution);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spike_reports_fall() {
        let mut state = AppState::new(&AppConfig::default()).unwrap();
        let mut rx = state.telemetry_tx.subscribe();

        let outcome =
            process_sample(&mut state, &reading(4.0, 4.0, 4.0, Activity::Walking)).unwrap();
        assert!(matches!(outcome, Some(ReportOutcome::Raised { .. })));
        assert_eq!(state.engine.state(), MonitoringState::AwaitingConfirmation);

        let update = rx.recv().await.unwrap();
        assert_eq!(update.status, FALL_STATUS);
        assert_eq!(update.value, 6.93);

        let latest = state.engine.audit_log().latest().unwrap();
        assert_eq!(latest.event_type, EventType::FallDetected);
        assert_eq!(latest.force_value, 6.93);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_spike_is_ignored() {
        let mut state = AppState::new(&AppConfig::default()).unwrap();
        process_sample(&mut state, &reading(4.0, 4.0, 4.0, Activity::Walking)).unwrap();

        let outcome =
            process_sample(&mut state, &reading(3.0, 3.0, 3.0, Activity::Walking)).unwrap();
        assert!(matches!(outcome, Some(ReportOutcome::Ignored { .. })));
        assert_eq!(state.engine.audit_log().count_of(EventType::FallDetected), 1);
        assert_eq!(state.engine.live_timer_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_events_pin_and_release_readout() {
        let state = AppState::new(&AppConfig::default()).unwrap();
        let mut events = state.engine.subscribe();
        let mut projection = TelemetryProjection::default();

        state.engine.report_fall(FallEvent::new(4.2)).unwrap();
        state.engine.respond(alerting::ResponseAction::Ok);

        let mut pinned_seen = false;
        while let Ok(event) = events.try_recv() {
            apply_alert_event(&mut projection, &event);
            if projection.is_pinned() {
                pinned_seen = true;
                assert_eq!(projection.readout().value, 4.2);
                assert_eq!(projection.readout().tone, StatusTone::Alert);
            }
        }

        assert!(pinned_seen);
        assert!(!projection.is_pinned());
        assert_eq!(projection.readout().status, telemetry::projection::MONITORING_STATUS);
    }
}
