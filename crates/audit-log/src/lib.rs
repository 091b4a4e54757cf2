//! Safety Audit Log
//!
//! Keeps an ordered, append-only record of safety-relevant events
//! (falls, user confirmations, escalations) for the current session.

mod entry;
mod journal;

pub use entry::{EventType, LogEntry};
pub use journal::AuditLog;
