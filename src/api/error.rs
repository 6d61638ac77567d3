use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::adapters::AdapterError;
use crate::db::DatabaseError;
use crate::services::ServiceError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Boundary-level error, already mapped to the stable HTTP status/code
/// table. Every service error crosses into one of these before a
/// response is built.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// A 500 whose message is itself part of the contract (e.g. "saved
    /// for manual review") rather than an internal detail to redact.
    #[error("{0}")]
    ManualReview(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::NotFound { entity_type, id } => (StatusCode::NOT_FOUND, "NOT_FOUND", format!("{entity_type} not found: {id}")),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!(detail = %msg, "internal error crossing API boundary");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "an internal error occurred".to_string())
            }
            ApiError::ManualReview(msg) => {
                tracing::warn!(%msg, "check-in completed via fallback, needs manual review");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = ErrorBody {
            code,
            message,
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

/// Maps `ServiceError` onto the stable error-code table from the
/// boundary design: validation → 400, not-found → 404, adapter failure
/// → 503, everything else → 500.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::Validation(msg),
            ServiceError::NotFound { entity_type, id } => ApiError::NotFound { entity_type, id },
            ServiceError::Unavailable(adapter_err) => ApiError::Unavailable(adapter_err.to_string()),
            ServiceError::Database(db_err) => ApiError::Internal(db_err.to_string()),
            ServiceError::SessionExpired => ApiError::Validation("session expired".to_string()),
            ServiceError::SessionNotActive { status } => ApiError::Validation(format!("session already {status}")),
        }
    }
}

impl From<AdapterError> for ApiError {
    fn from(err: AdapterError) -> Self {
        ApiError::Unavailable(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn validation_returns_400_with_stable_code() {
        let response = ApiError::validation("bad input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let response = ApiError::NotFound {
            entity_type: "medication".into(),
            id: "x".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_hides_detail_from_client() {
        let response = ApiError::Internal("leaked detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "an internal error occurred");
    }

    #[tokio::test]
    async fn service_unavailable_maps_to_503() {
        let response: ApiError = ServiceError::Unavailable(AdapterError::RateLimited).into();
        let response = response.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
