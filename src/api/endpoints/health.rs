use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::request_context;
use crate::api::state::AppState;
use crate::models::enums::FlowIntensity;
use crate::models::{BloodPressureReading, MenstruationCycle};
use crate::services::health_data::RawFitnessPoint;

#[derive(Deserialize)]
pub struct RecordBloodPressureRequest {
    pub user_id: Uuid,
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: i32,
    pub measured_at: DateTime<Utc>,
}

/// `POST /health/blood-pressure`
pub async fn record_blood_pressure(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<RecordBloodPressureRequest>,
) -> Result<(StatusCode, Json<BloodPressureReading>), ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    let reading = state
        .health_data
        .record_blood_pressure(body.user_id, body.systolic, body.diastolic, body.pulse, body.measured_at, context, &cancel)
        .await?;
    Ok((StatusCode::CREATED, Json(reading)))
}

#[derive(Deserialize)]
pub struct BloodPressureRangeQuery {
    pub user_id: Uuid,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// `GET /health/blood-pressure` — newest first.
pub async fn list_blood_pressure(State(state): State<AppState>, Query(query): Query<BloodPressureRangeQuery>) -> Result<Json<Vec<BloodPressureReading>>, ApiError> {
    let cancel = CancellationToken::new();
    let readings = state.health_data.list_blood_pressure(query.user_id, query.from, query.to, &cancel).await?;
    Ok(Json(readings))
}

#[derive(Deserialize)]
pub struct RecordCycleRequest {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow_intensity: Option<FlowIntensity>,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

/// `POST /health/menstruation`
pub async fn record_cycle(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<RecordCycleRequest>,
) -> Result<(StatusCode, Json<MenstruationCycle>), ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    let cycle = state
        .health_data
        .record_cycle(body.user_id, body.start_date, body.end_date, body.flow_intensity, body.symptoms, context, &cancel)
        .await?;
    Ok((StatusCode::CREATED, Json(cycle)))
}

#[derive(Deserialize)]
pub struct DateRangeQuery {
    pub user_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// `GET /health/menstruation` — newest first.
pub async fn list_cycles(State(state): State<AppState>, Query(query): Query<DateRangeQuery>) -> Result<Json<Vec<MenstruationCycle>>, ApiError> {
    let cancel = CancellationToken::new();
    let cycles = state.health_data.list_cycles(query.user_id, query.from, query.to, &cancel).await?;
    Ok(Json(cycles))
}

#[derive(Deserialize)]
pub struct FitnessSyncPoint {
    pub date: NaiveDate,
    pub data_type: String,
    pub value: f64,
    pub unit: String,
    pub source: String,
    pub source_data_id: String,
}

#[derive(Deserialize)]
pub struct FitnessSyncRequest {
    pub user_id: Uuid,
    pub points: Vec<FitnessSyncPoint>,
}

#[derive(Serialize)]
pub struct FitnessSyncResponse {
    pub ingested: usize,
    pub skipped_duplicate: usize,
}

/// `POST /health/fitness-sync` — bulk, idempotent on `source_data_id`;
/// unrecognized `data_type` values are skipped, not rejected.
pub async fn sync_fitness_data(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<FitnessSyncRequest>,
) -> Result<Json<FitnessSyncResponse>, ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    let points = body
        .points
        .into_iter()
        .map(|p| RawFitnessPoint {
            date: p.date,
            data_type: p.data_type,
            value: p.value,
            unit: p.unit,
            source: p.source,
            source_data_id: p.source_data_id,
        })
        .collect();

    let summary = state.health_data.sync_fitness_data(body.user_id, points, context, &cancel).await?;
    Ok(Json(FitnessSyncResponse {
        ingested: summary.ingested,
        skipped_duplicate: summary.skipped_duplicate,
    }))
}
