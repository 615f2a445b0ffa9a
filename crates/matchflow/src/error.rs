use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::matching::router::error_response;
use crate::workflows::matching::MatchingServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Process-level failure surfaced by the binary and the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("matching error: {0}")]
    Matching(#[from] MatchingServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Matching(err) => error_response(err),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": other.to_string(), "kind": "internal" })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::matching::OpportunityId;

    #[test]
    fn matching_errors_keep_their_status() {
        let err = AppError::from(MatchingServiceError::CapacityExceeded(OpportunityId(
            "opp-1".to_string(),
        )));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn process_errors_are_internal() {
        let err = AppError::from(std::io::Error::other("socket closed"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
