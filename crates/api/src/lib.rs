//! Fall Watch Dashboard Server
//!
//! REST API and WebSocket server for the wearable fall detection dashboard.

use alerting::{AlertEngine, MonitoringState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use telemetry::{FallDetector, TelemetryProjection, TelemetryUpdate};
use tokio::sync::{broadcast, RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod monitor;
mod routes;
mod ws;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use error::ApiError;

/// Capacity of the live telemetry channel
const TELEMETRY_BUFFER: usize = 64;

/// Application state shared across handlers
pub struct AppState {
    /// Alert escalation engine
    pub engine: AlertEngine,
    /// Threshold classifier for sensor samples
    pub detector: FallDetector,
    /// Live readout shown on the dashboard
    pub projection: TelemetryProjection,
    /// Live telemetry fan-out for WebSocket clients
    pub telemetry_tx: broadcast::Sender<TelemetryUpdate>,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

/// State as held by the router
pub type SharedState = Arc<RwLock<AppState>>;

impl AppState {
    /// Create new application state
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let (telemetry_tx, _) = broadcast::channel(TELEMETRY_BUFFER);
        Ok(Self {
            engine: AlertEngine::new(config.escalation.clone())?,
            detector: FallDetector::new(config.telemetry.threshold_g)?,
            projection: TelemetryProjection::new(config.telemetry.gauge_full_scale_g),
            telemetry_tx,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        })
    }

    /// Attach a Prometheus handle for `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Push a live reading to the dashboard projection and subscribers
    pub fn publish(&mut self, update: TelemetryUpdate) {
        let alert_active = self.engine.is_alert_active();
        self.projection.apply(&update, alert_active);
        // No subscribers is fine
        let _ = self.telemetry_tx.send(update);
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub monitoring: MonitoringState,
    pub log_entries: usize,
    pub live_timers: usize,
    pub threshold_g: f64,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/status", get(routes::alerts::get_status))
        .route("/api/v1/falls", post(routes::alerts::report_fall))
        .route("/api/v1/respond", post(routes::alerts::respond))
        .route("/api/v1/reset", post(routes::alerts::reset))
        .route(
            "/api/v1/log",
            get(routes::history::get_log).delete(routes::history::clear_log),
        )
        .route("/api/v1/telemetry/live", get(routes::sensors::get_live))
        .route(
            "/api/v1/settings",
            get(routes::settings::get_settings).put(routes::settings::update_settings),
        )
        .route("/api/v1/ws", get(ws::ws_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        monitoring: state.engine.state(),
        log_entries: state.engine.audit_log().len(),
        live_timers: state.engine.live_timer_count(),
        threshold_g: state.detector.threshold(),
    })
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<SharedState>) -> Response {
    let state = state.read().await;
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), ApiError> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| ApiError::Logging(format!("unknown log level '{}'", config.level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| ApiError::Logging(e.to_string()))
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> Result<PrometheusHandle, ApiError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Metrics(e.to_string()))
}

/// Run the server
pub async fn run_server(config: AppConfig) -> Result<(), ApiError> {
    let handle = install_metrics()?;
    let state = AppState::new(&config)?.with_metrics(handle);
    let alert_events = state.engine.subscribe();
    let state: SharedState = Arc::new(RwLock::new(state));

    monitor::spawn_alert_projection(state.clone(), alert_events);
    if config.telemetry.simulator.enabled {
        monitor::spawn_sensor_monitor(state.clone(), config.telemetry.clone());
    } else {
        info!("Sensor simulator disabled; falls arrive through the API only");
    }

    let app = create_router(state);

    info!("Starting API server on {}", config.server.addr);

    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
