use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use chrono::Utc;

use crate::dto::{EmailRequest, ErrorResponse, HealthResponse, ServiceStatus};
use crate::service::EmailServiceError;
use crate::state::AppState;

pub const VERSION: &str = "2.0.0";

#[debug_handler]
pub async fn send_email(State(state): State<AppState>, body: Bytes) -> Response {
    // Parsed by hand so malformed JSON gets the structured error shape
    // instead of the framework's plain-text rejection.
    let request: EmailRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!("Failed to parse send request: {e}");
            return error_response(
                "Invalid request body",
                StatusCode::BAD_REQUEST,
                "Failed to parse JSON",
            );
        }
    };

    match state.service.send_email(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(EmailServiceError::Validation(e)) => {
            error_response(&e.to_string(), StatusCode::BAD_REQUEST, "Validation failed")
        }
        Err(EmailServiceError::Send(e)) => {
            tracing::error!("Failed to send email: {e}");
            error_response(
                "Failed to send email",
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            )
        }
    }
}

#[debug_handler]
pub async fn health_check() -> Response {
    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
        services: ServiceStatus {
            email: "operational".to_string(),
            database: "n/a".to_string(),
            cache: "n/a".to_string(),
        },
    };

    (StatusCode::OK, Json(response)).into_response()
}

#[debug_handler]
pub async fn stats(State(state): State<AppState>) -> Response {
    (StatusCode::OK, Json(state.stats.snapshot())).into_response()
}

pub fn error_response(error: &str, status: StatusCode, message: &str) -> Response {
    let body = ErrorResponse {
        error: error.to_string(),
        code: status.as_u16(),
        message: message.to_string(),
    };

    (status, Json(body)).into_response()
}
