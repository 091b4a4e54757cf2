//! Live Telemetry Routes

use axum::{extract::State, Json};
use serde::Serialize;
use telemetry::Readout;

use crate::SharedState;

/// Response for the live telemetry endpoint
#[derive(Debug, Serialize)]
pub struct LiveResponse {
    pub readout: Readout,
    pub alert_active: bool,
    pub threshold_g: f64,
}

/// Current dashboard readout
pub async fn get_live(State(state): State<SharedState>) -> Json<LiveResponse> {
    let state = state.read().await;
    Json(LiveResponse {
        readout: state.projection.readout().clone(),
        alert_active: state.engine.is_alert_active(),
        threshold_g: state.detector.threshold(),
    })
}
