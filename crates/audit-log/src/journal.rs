//! Audit Log Implementation

use crate::entry::{round_force, EventType, LogEntry};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Session-scoped, append-only audit log
///
/// Entries are kept in append order internally and handed out newest-first.
/// Appending never fails: a poisoned lock is recovered instead of surfaced,
/// since a safety event must always be recorded.
pub struct AuditLog {
    /// Entries in append order
    entries: Mutex<Vec<LogEntry>>,
    /// Next sequence number, taken while holding `entries`
    next_sequence: AtomicU64,
}

impl AuditLog {
    /// Create an empty audit log
    pub fn new() -> Self {
        info!("Creating in-memory audit log");
        Self {
            entries: Mutex::new(Vec::with_capacity(256)),
            next_sequence: AtomicU64::new(1),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Audit log lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Append a safety event and return the stored entry
    pub fn append(&self, event_type: EventType, force_value: f64) -> LogEntry {
        let mut entries = self.entries();
        let entry = LogEntry {
            sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            event_type,
            force_value: round_force(force_value),
        };

        entries.push(entry.clone());
        debug!(
            "Audit entry #{} appended: {} ({:.2} G)",
            entry.sequence, entry.event_type, entry.force_value
        );
        entry
    }

    /// All entries, most recent first
    pub fn all(&self) -> Vec<LogEntry> {
        self.entries().iter().rev().cloned().collect()
    }

    /// Up to `limit` entries, most recent first
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries().iter().rev().take(limit).cloned().collect()
    }

    /// Most recent entry, if any
    pub fn latest(&self) -> Option<LogEntry> {
        self.entries().last().cloned()
    }

    /// Number of entries of a given type
    pub fn count_of(&self, event_type: EventType) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the log holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop every entry (operator action); returns how many were removed
    pub fn clear(&self) -> usize {
        let mut entries = self.entries();
        let removed = entries.len();
        entries.clear();
        info!("Audit log cleared ({} entries removed)", removed);
        removed
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_read_newest_first() {
        let log = AuditLog::new();
        log.append(EventType::FallDetected, 4.75);
        log.append(EventType::UserConfirmedOk, 0.0);

        let all = log.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].event_type, EventType::UserConfirmedOk);
        assert_eq!(all[1].event_type, EventType::FallDetected);
        assert_eq!(all[1].force_value, 4.75);
    }

    #[test]
    fn test_sequence_is_monotonic_across_clear() {
        let log = AuditLog::new();
        let first = log.append(EventType::FallDetected, 3.2);
        log.append(EventType::AutoEscalated, 3.2);

        assert_eq!(log.clear(), 2);
        assert!(log.is_empty());

        let after = log.append(EventType::FallDetected, 5.0);
        assert_eq!(first.sequence, 1);
        assert_eq!(after.sequence, 3);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_concurrent_appends_get_unique_ordered_sequences() {
        let log = std::sync::Arc::new(AuditLog::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        log.append(EventType::FallDetected, 4.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Newest first, so sequences strictly decrease with no gaps
        let sequences: Vec<u64> = log.all().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences.len(), 200);
        assert_eq!(sequences.first(), Some(&200));
        assert!(sequences.windows(2).all(|w| w[0] == w[1] + 1));
    }

    #[test]
    fn test_recent_limit() {
        let log = AuditLog::new();
        for i in 0..10 {
            log.append(EventType::FallDetected, i as f64);
        }

        let recent = log.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].force_value, 9.0);
        assert_eq!(recent[2].force_value, 7.0);
    }

    #[test]
    fn test_latest_and_count() {
        let log = AuditLog::new();
        assert!(log.latest().is_none());

        log.append(EventType::FallDetected, 4.0);
        log.append(EventType::UserRequestedHelp, 4.0);
        log.append(EventType::FallDetected, 3.5);

        assert_eq!(log.latest().unwrap().force_value, 3.5);
        assert_eq!(log.count_of(EventType::FallDetected), 2);
        assert_eq!(log.count_of(EventType::AutoEscalated), 0);
    }

    #[test]
    fn test_force_rounded_on_append() {
        let log = AuditLog::new();
        let entry = log.append(EventType::FallDetected, 5.19615242);
        assert_eq!(entry.force_value, 5.2);
    }

    #[test]
    fn test_entries_are_copies() {
        let log = AuditLog::new();
        log.append(EventType::FallDetected, 4.0);

        let mut snapshot = log.all();
        snapshot[0].force_value = 99.0;

        assert_eq!(log.latest().unwrap().force_value, 4.0);
    }
}
