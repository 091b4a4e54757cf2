//! Dashboard WebSocket
//!
//! Pushes the current status on connect, then every alert event and live
//! telemetry update as `{"channel": ..., "payload": ...}` frames.

use alerting::{AlertEngine, AlertEvent, StatusSnapshot};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use serde::Serialize;
use telemetry::TelemetryUpdate;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::SharedState;

/// Frame sent to the dashboard
#[derive(Debug, Serialize)]
#[serde(tag = "channel", content = "payload", rename_all = "snake_case")]
pub enum Outbound {
    Status(StatusSnapshot),
    Alert(AlertEvent),
    Telemetry(TelemetryUpdate),
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    let (engine, telemetry) = {
        let state = state.read().await;
        (state.engine.clone(), state.telemetry_tx.subscribe())
    };
    ws.on_upgrade(move |socket| stream_updates(socket, engine, telemetry))
}

async fn stream_updates(
    mut socket: WebSocket,
    engine: AlertEngine,
    mut telemetry: broadcast::Receiver<TelemetryUpdate>,
) {
    let mut alerts = engine.subscribe();
    debug!("Dashboard client connected");

    if send(&mut socket, &Outbound::Status(engine.snapshot())).await.is_err() {
        return;
    }

    loop {
        let frame = tokio::select! {
            event = alerts.recv() => match event {
                Ok(event) => Outbound::Alert(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Dashboard client lagged, skipped {} alert events", skipped);
                    // Resync after dropping events
                    Outbound::Status(engine.snapshot())
                }
                Err(RecvError::Closed) => break,
            },
            update = telemetry.recv() => match update {
                Ok(update) => Outbound::Telemetry(update),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            },
        };

        if send(&mut socket, &frame).await.is_err() {
            break;
        }
    }

    debug!("Dashboard client disconnected");
}

async fn send(socket: &mut WebSocket, frame: &Outbound) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to encode dashboard frame: {}", e);
            return Ok(());
        }
    };
    socket.send(Message::Text(text)).await
}
