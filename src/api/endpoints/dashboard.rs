use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::services::dashboard::DashboardSummary;

#[derive(Deserialize)]
pub struct SummaryQuery {
    pub user_id: Uuid,
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    7
}

/// `GET /dashboard/summary?user_id&days`
pub async fn summary(State(state): State<AppState>, Query(query): Query<SummaryQuery>) -> Result<Json<DashboardSummary>, ApiError> {
    let cancel = CancellationToken::new();
    let summary = state.dashboard.summary(query.user_id, query.days, &cancel).await?;
    Ok(Json(summary))
}
