//! API Error Types

use alerting::AlertError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use telemetry::TelemetryError;
use thiserror::Error;

/// Errors surfaced by the dashboard server
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body or parameter
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Body rejected by the JSON extractor
    #[error("{}", .0.body_text())]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Alert(#[from] AlertError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Json(rejection) => rejection.status(),
            ApiError::Alert(AlertError::Config(_))
            | ApiError::Telemetry(TelemetryError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Alert(_) | ApiError::Telemetry(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_unprocessable() {
        let err = ApiError::from(AlertError::NonFiniteForce);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ApiError::from(AlertError::UnknownAction("maybe".into()));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_json_rejection_keeps_status_and_json_body() {
        use axum::body::{to_bytes, Body};
        use axum::extract::FromRequest;
        use axum::http::Request;

        #[derive(Debug, serde::Deserialize)]
        struct Threshold {
            #[allow(dead_code)]
            threshold_g: f64,
        }

        let request = Request::builder()
            .method("PUT")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"threshold_g":"high"}"#))
            .unwrap();
        let rejection = axum::Json::<Threshold>::from_request(request, &())
            .await
            .unwrap_err();

        let response = ApiError::from(rejection).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("threshold_g"));
    }

    #[test]
    fn test_bad_body_is_bad_request() {
        let err = ApiError::BadRequest("expected JSON".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
