use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::config;

#[derive(Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// `GET /` — unauthenticated service info.
pub async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: config::APP_NAME,
        version: config::APP_VERSION,
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub database: &'static str,
}

/// `GET /health` — DB-connectivity liveness probe. A failed round-trip
/// still returns a body (never panics); the status code carries the
/// verdict.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let cancel = CancellationToken::new();
    match state.store.get_user(Uuid::nil(), &cancel).await {
        Ok(_) => (StatusCode::OK, Json(HealthResponse { database: "connected" })),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse { database: "unreachable" })),
    }
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
}

/// `GET /api/v1/status` — readiness probe.
pub async fn readiness() -> Json<ReadinessResponse> {
    Json(ReadinessResponse { ready: true })
}
