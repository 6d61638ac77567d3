use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;

use crate::api::error::ErrorBody;

/// Catches a panic inside any handler, logs it, and turns it into a 500
/// response instead of tearing down the worker task.
pub fn layer() -> CatchPanicLayer<fn(Box<dyn std::any::Any + Send>) -> Response<Body>> {
    CatchPanicLayer::custom(handle_panic)
}

fn handle_panic(err: Box<dyn std::any::Any + Send>) -> Response<Body> {
    let detail = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %detail, "handler panicked, recovered by middleware");

    let body = ErrorBody {
        code: "INTERNAL_ERROR",
        message: "an internal error occurred".to_string(),
        details: None,
    };
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
}
