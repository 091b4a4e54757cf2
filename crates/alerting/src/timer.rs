//! Cancellable single-fire countdown

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

const PENDING: u8 = 0;
const CANCELLED: u8 = 1;
const FIRED: u8 = 2;

/// A countdown that invokes its expiry callback at most once.
///
/// The expiry decision is made from the deadline, never from a tick count, so
/// a task that wakes late fires once, immediately. Whoever moves the shared
/// phase out of `PENDING` first wins: a successful [`cancel`](Self::cancel)
/// means the expiry callback will never run.
///
/// Must be started from within a tokio runtime.
pub struct CountdownTimer {
    fire_at: Instant,
    phase: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

impl CountdownTimer {
    /// Start a countdown of `duration`, calling `on_tick` with the whole
    /// seconds remaining every `tick`, and `on_expire` once at the deadline.
    pub fn start<T, E>(duration: Duration, tick: Duration, on_tick: T, on_expire: E) -> Self
    where
        T: Fn(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let fire_at = Instant::now() + duration;
        let phase = Arc::new(AtomicU8::new(PENDING));
        let task_phase = Arc::clone(&phase);

        let task = tokio::spawn(async move {
            loop {
                let now = Instant::now();
                if now >= fire_at {
                    break;
                }
                if task_phase.load(Ordering::Acquire) != PENDING {
                    return;
                }
                on_tick(seconds_until(fire_at, now));
                sleep_until((now + tick).min(fire_at)).await;
            }

            if task_phase
                .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                on_expire();
            }
        });

        Self {
            fire_at,
            phase,
            task,
        }
    }

    /// Cancel the countdown.
    ///
    /// Safe to call any number of times, before or after expiry. Returns
    /// `true` only if this call prevented the expiry callback.
    pub fn cancel(&self) -> bool {
        let prevented = self
            .phase
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if prevented {
            self.task.abort();
            debug!("Countdown cancelled");
        }
        prevented
    }

    /// Whole seconds left until the deadline (0 once fired or cancelled)
    pub fn remaining_seconds(&self) -> u32 {
        if self.phase.load(Ordering::Acquire) != PENDING {
            return 0;
        }
        seconds_until(self.fire_at, Instant::now())
    }

    /// Deadline of the countdown
    pub fn fire_at(&self) -> Instant {
        self.fire_at
    }

    /// Whether the expiry callback has been triggered
    pub fn has_fired(&self) -> bool {
        self.phase.load(Ordering::Acquire) == FIRED
    }

    /// Whether the countdown was cancelled before firing
    pub fn is_cancelled(&self) -> bool {
        self.phase.load(Ordering::Acquire) == CANCELLED
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Whole seconds from `now` to `deadline`, rounded up
fn seconds_until(deadline: Instant, now: Instant) -> u32 {
    let left = deadline.saturating_duration_since(now);
    let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}
