//! Settings Routes

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, ApiError, SharedState};

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub threshold_g: f64,
    pub confirmation_window_secs: u64,
    pub help_display_secs: u64,
}

impl From<&AppState> for SettingsResponse {
    fn from(state: &AppState) -> Self {
        let escalation = state.engine.config();
        Self {
            threshold_g: state.detector.threshold(),
            confirmation_window_secs: escalation.confirmation_window_secs,
            help_display_secs: escalation.help_display_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub threshold_g: f64,
}

pub async fn get_settings(State(state): State<SharedState>) -> Json<SettingsResponse> {
    let state = state.read().await;
    Json(SettingsResponse::from(&*state))
}

/// Change the fall threshold at runtime
pub async fn update_settings(
    State(state): State<SharedState>,
    update: Result<Json<SettingsUpdate>, JsonRejection>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let Json(update) = update?;
    let mut state = state.write().await;
    state.detector.set_threshold(update.threshold_g)?;
    Ok(Json(SettingsResponse::from(&*state)))
}
