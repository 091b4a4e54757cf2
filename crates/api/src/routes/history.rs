//! Event Log Routes

use audit_log::{EventType, LogEntry};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::SharedState;

/// Largest page the log endpoint returns
const MAX_LIMIT: usize = 1000;

/// Query parameters for the log endpoint
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// Log row as shown in the dashboard history table
#[derive(Debug, Serialize)]
pub struct LogRecord {
    pub sequence: u64,
    pub date: String,
    pub time: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub label: String,
    pub force_value: f64,
}

impl From<LogEntry> for LogRecord {
    fn from(entry: LogEntry) -> Self {
        Self {
            sequence: entry.sequence,
            date: entry.date_display(),
            time: entry.time_display(),
            timestamp: entry.timestamp,
            event_type: entry.event_type,
            label: entry.event_type.label().to_string(),
            force_value: entry.force_value,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub data: Vec<LogRecord>,
    pub count: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// Newest-first event log
pub async fn get_log(
    State(state): State<SharedState>,
    Query(params): Query<LogQuery>,
) -> Json<LogResponse> {
    let log = state.read().await.engine.audit_log();
    let limit = params.limit.min(MAX_LIMIT);

    let data: Vec<LogRecord> = log.recent(limit).into_iter().map(LogRecord::from).collect();
    Json(LogResponse {
        count: data.len(),
        total: log.len(),
        data,
    })
}

/// Clear the event log
pub async fn clear_log(State(state): State<SharedState>) -> Json<ClearResponse> {
    let removed = state.read().await.engine.clear_log();
    info!("Event log cleared ({} entries)", removed);
    Json(ClearResponse { removed })
}
