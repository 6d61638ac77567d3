use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::request_context;
use crate::api::state::AppState;
use crate::models::Report;

#[derive(Deserialize)]
pub struct GenerateReportRequest {
    pub user_id: Uuid,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// `POST /reports/generate`
pub async fn generate(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<GenerateReportRequest>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    let report = state.report.generate(body.user_id, body.name, body.start, body.end, context, &cancel).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// `GET /reports/:id` — raw PDF bytes.
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response, ApiError> {
    let cancel = CancellationToken::new();
    let (_report, bytes) = state.report.get(id, &cancel).await?;
    Ok(([(axum::http::header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
}
