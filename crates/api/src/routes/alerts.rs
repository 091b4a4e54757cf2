//! Alert Routes

use alerting::{FallEvent, ReportOutcome, RespondOutcome, ResponseAction, StatusSnapshot};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use telemetry::projection::FALL_STATUS;
use telemetry::{simulator::manual_fall_force, TelemetryUpdate};
use tracing::info;

use crate::{ApiError, SharedState};

/// Body of a manual fall report; an empty body simulates a random impact
#[derive(Debug, Default, Deserialize)]
pub struct FallRequest {
    pub force_value: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct FallResponse {
    pub result: ReportOutcome,
    pub force_value: f64,
    pub status: StatusSnapshot,
}

/// Wearer response body, e.g. `{"action": "ok"}`
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub result: RespondOutcome,
    pub status: StatusSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub reset: bool,
    pub status: StatusSnapshot,
}

/// Current monitoring status
pub async fn get_status(State(state): State<SharedState>) -> Json<StatusSnapshot> {
    let state = state.read().await;
    Json(state.engine.snapshot())
}

/// Report a fall by hand (the dashboard's test button)
pub async fn report_fall(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<FallResponse>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        FallRequest::default()
    } else {
        serde_json::from_slice::<FallRequest>(&body)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    let force_value = request.force_value.unwrap_or_else(manual_fall_force);
    info!("Manual fall report: {:.2} G", force_value);

    let mut state = state.write().await;
    let result = state.engine.report_fall(FallEvent::new(force_value))?;
    if matches!(result, ReportOutcome::Raised { .. }) {
        // Pinned under the same write lock as the report
        state.projection.show_alert(force_value);
        state.publish(TelemetryUpdate::new(FALL_STATUS, force_value));
    }

    Ok(Json(FallResponse {
        result,
        force_value,
        status: state.engine.snapshot(),
    }))
}

/// Apply the wearer's answer to the confirmation prompt
pub async fn respond(
    State(state): State<SharedState>,
    request: Result<Json<RespondRequest>, JsonRejection>,
) -> Result<Json<RespondResponse>, ApiError> {
    let Json(request) = request?;
    let action: ResponseAction = request.action.parse()?;
    let state = state.read().await;
    let result = state.engine.respond(action);

    Ok(Json(RespondResponse {
        result,
        status: state.engine.snapshot(),
    }))
}

/// Operator reset back to normal monitoring
pub async fn reset(State(state): State<SharedState>) -> Json<ResetResponse> {
    let state = state.read().await;
    let reset = state.engine.reset();

    Json(ResetResponse {
        reset,
        status: state.engine.snapshot(),
    })
}
