use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::request_context;
use crate::api::state::AppState;
use crate::models::{Medication, MedicationLog};
use crate::services::medication::{MedicationPatch, NewMedication};

#[derive(Deserialize)]
pub struct AddMedicationRequest {
    pub user_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// `POST /health/medications`
pub async fn add(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<AddMedicationRequest>,
) -> Result<(StatusCode, Json<Medication>), ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    let medication = state
        .medication
        .add(
            body.user_id,
            NewMedication {
                name: body.name,
                dosage: body.dosage,
                frequency: body.frequency,
                start_date: body.start_date,
                end_date: body.end_date,
                notes: body.notes,
            },
            context,
            &cancel,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(medication)))
}

#[derive(Deserialize)]
pub struct ListMedicationsQuery {
    pub user_id: Uuid,
}

/// `GET /health/medications` — newest first by `start_date`.
pub async fn list(State(state): State<AppState>, axum::extract::Query(query): axum::extract::Query<ListMedicationsQuery>) -> Result<Json<Vec<Medication>>, ApiError> {
    let cancel = CancellationToken::new();
    let medications = state.medication.list(query.user_id, &cancel).await?;
    Ok(Json(medications))
}

#[derive(Deserialize, Default)]
pub struct UpdateMedicationRequest {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub notes: Option<Option<String>>,
}

/// `POST /health/medications/:id` — partial update; `id` and `user_id`
/// are never touched.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<UpdateMedicationRequest>,
) -> Result<Json<Medication>, ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    let medication = state
        .medication
        .update(
            id,
            MedicationPatch {
                name: body.name,
                dosage: body.dosage,
                frequency: body.frequency,
                start_date: body.start_date,
                end_date: body.end_date,
                notes: body.notes,
            },
            context,
            &cancel,
        )
        .await?;

    Ok(Json(medication))
}

/// `GET /health/medications/:id`
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Medication>, ApiError> {
    let cancel = CancellationToken::new();
    let medication = state
        .store
        .get_medication(id, &cancel)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity_type: "medication".into(),
            id: id.to_string(),
        })?;
    Ok(Json(medication))
}

/// `DELETE /health/medications/:id`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    state.medication.delete(id, context, &cancel).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct LogAdherenceRequest {
    pub taken_at: DateTime<Utc>,
    pub adherence: bool,
}

/// `POST /health/medications/:id/log`
pub async fn log_adherence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<LogAdherenceRequest>,
) -> Result<(StatusCode, Json<MedicationLog>), ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    let log = state.medication.log_adherence(id, body.taken_at, body.adherence, context, &cancel).await?;
    Ok((StatusCode::CREATED, Json(log)))
}
