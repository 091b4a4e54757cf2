//! Sequence properties of the alert engine

use alerting::{
    AlertEngine, CaretakerNotifier, EscalationConfig, EscalationNotice, FallEvent,
    MonitoringState, ReportOutcome, ResponseAction,
};
use audit_log::{AuditLog, EventType};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct CountingNotifier {
    notices: Mutex<usize>,
}

impl CaretakerNotifier for CountingNotifier {
    fn notify(&self, _notice: &EscalationNotice) {
        *self.notices.lock().unwrap() += 1;
    }
}

#[derive(Debug, Clone)]
enum Op {
    Fall(f64),
    Respond(ResponseAction),
    Reset,
    ClearLog,
    Wait(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0.0f64..10.0).prop_map(Op::Fall),
        2 => Just(Op::Respond(ResponseAction::Ok)),
        2 => Just(Op::Respond(ResponseAction::Help)),
        1 => Just(Op::Reset),
        1 => Just(Op::ClearLog),
        3 => (0u64..20).prop_map(Op::Wait),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// At most one confirmation timer is live, and it exists only while
    /// awaiting confirmation.
    #[test]
    fn prop_single_live_timer(ops in prop::collection::vec(op_strategy(), 1..40)) {
        runtime().block_on(async {
            let engine = AlertEngine::new(EscalationConfig::default()).unwrap();
            for op in ops {
                match op {
                    Op::Fall(force) => { engine.report_fall(FallEvent::new(force)).unwrap(); }
                    Op::Respond(action) => { engine.respond(action); }
                    Op::Reset => { engine.reset(); }
                    Op::ClearLog => { engine.clear_log(); }
                    Op::Wait(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                }

                let live = engine.live_timer_count();
                prop_assert!(live <= 1);
                if engine.state() != MonitoringState::AwaitingConfirmation {
                    prop_assert_eq!(live, 0);
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Every lifecycle gets exactly one fall entry and at most one terminal
    /// entry, and every escalation entry reaches the caretaker exactly once.
    #[test]
    fn prop_single_resolution_per_lifecycle(ops in prop::collection::vec(op_strategy(), 1..40)) {
        runtime().block_on(async {
            let log = Arc::new(AuditLog::new());
            let notifier = Arc::new(CountingNotifier::default());
            let engine = AlertEngine::with_parts(
                EscalationConfig::default(),
                log.clone(),
                notifier.clone(),
            ).unwrap();

            let mut escalations = 0;
            let mut raised = 0;
            let mut falls_logged = 0;
            for op in ops {
                match op {
                    Op::Fall(force) => {
                        let outcome = engine.report_fall(FallEvent::new(force)).unwrap();
                        if matches!(outcome, ReportOutcome::Raised { .. }) {
                            raised += 1;
                        }
                    }
                    Op::Respond(action) => { engine.respond(action); }
                    Op::Reset => { engine.reset(); }
                    Op::ClearLog => {
                        escalations += log.count_of(EventType::UserRequestedHelp)
                            + log.count_of(EventType::AutoEscalated);
                        falls_logged += log.count_of(EventType::FallDetected);
                        engine.clear_log();
                    }
                    Op::Wait(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                }

                // Append order is the reverse of display order
                let mut entries = log.all();
                entries.reverse();
                for pair in entries.windows(2) {
                    prop_assert!(
                        !(pair[0].event_type.is_terminal() && pair[1].event_type.is_terminal()),
                        "two terminal entries in a row: {:?}", pair
                    );
                }
                prop_assert_eq!(falls_logged + log.count_of(EventType::FallDetected), raised);
            }

            tokio::time::sleep(Duration::from_secs(60)).await;
            escalations += log.count_of(EventType::UserRequestedHelp)
                + log.count_of(EventType::AutoEscalated);
            prop_assert_eq!(*notifier.notices.lock().unwrap(), escalations);
            prop_assert_eq!(engine.state(), MonitoringState::Normal);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
