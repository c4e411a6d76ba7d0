//! REST API endpoints.
//!
//! Axum-based HTTP API for generating stratagem reports from uploaded
//! rosters and managing the reference dataset cache.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::ProcessError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "DATA_UNAVAILABLE")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ProcessError> for ApiError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::InvalidInput(e) => ApiError::BadRequest(e.to_string()),
            ProcessError::DataUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            // The cause chain was logged where the error was built.
            internal @ ProcessError::Internal(_) => ApiError::Internal(internal.to_string()),
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = match state.config.server.cors_origin.as_str() {
        "*" => CorsLayer::new().allow_origin(Any),
        origin => match HeaderValue::from_str(origin) {
            Ok(value) => CorsLayer::new().allow_origin(value),
            Err(_) => {
                tracing::warn!(origin, "Invalid CORS origin, allowing any");
                CorsLayer::new().allow_origin(Any)
            }
        },
    }
    .allow_methods(Any)
    .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/report", post(routes::report::create_report))
        .route("/api/dataset/refresh", post(routes::dataset::refresh))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RosterError;

    #[test]
    fn test_process_error_mapping() {
        let err: ApiError = ProcessError::InvalidInput(RosterError::Empty).into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err: ApiError = ProcessError::DataUnavailable("no tables".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let err: ApiError = ProcessError::Internal(anyhow::anyhow!("disk on fire")).into();
        assert!(!err.to_string().contains("disk on fire"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(test_support::state(tmp.path(), crate::fetch::MockSource::new()));
        let (status, _) = test_support::get_json(app, "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
