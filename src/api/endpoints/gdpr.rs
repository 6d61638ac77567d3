use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::request_context;
use crate::api::state::AppState;
use crate::services::gdpr::ExportDocument;

/// `DELETE /users/:user_id/data` — single-transaction erase across every
/// user-owned table, recorded in the audit log on commit.
pub async fn delete_user_data(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    state.gdpr.delete_user_data(user_id, context, &cancel).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/:user_id/export` — a single JSON document covering every
/// per-user table.
pub async fn export_user_data(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<ExportDocument>, ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    let export = state.gdpr.export_user_data(user_id, context, &cancel).await?;
    Ok(Json(export))
}
