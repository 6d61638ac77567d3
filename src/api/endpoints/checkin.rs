use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::request_context;
use crate::api::state::AppState;

#[derive(Deserialize)]
pub struct StartRequest {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct StartResponse {
    pub session_id: Uuid,
    pub question_text: String,
    pub question_id: u8,
    pub audio_base64: Option<String>,
}

/// `POST /checkin/start`
pub async fn start(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    let result = state.checkin.start(body.user_id, context, &cancel).await?;

    Ok(Json(StartResponse {
        session_id: result.session.id,
        question_text: result.question_text,
        question_id: result.question_id,
        audio_base64: result.audio.map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)),
    }))
}

#[derive(Deserialize)]
pub struct AudioStreamQuery {
    pub session_id: Uuid,
}

#[derive(Serialize)]
pub struct TranscriptionResponse {
    pub transcription: String,
}

/// `POST /checkin/audio-stream?session_id=...` — STT failure here is
/// surfaced as a 500, not swallowed: the mobile client needs to know the
/// transcription did not happen.
pub async fn audio_stream(
    State(state): State<AppState>,
    Query(query): Query<AudioStreamQuery>,
    body: Bytes,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    let cancel = CancellationToken::new();

    state
        .store
        .get_session(query.session_id, &cancel)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity_type: "session".into(),
            id: query.session_id.to_string(),
        })?;

    let transcription = state
        .stt
        .transcribe(&body, &cancel)
        .await
        .map_err(|e| ApiError::Internal(format!("speech-to-text failed: {e}")))?;

    Ok(Json(TranscriptionResponse { transcription }))
}

#[derive(Deserialize)]
pub struct RespondRequest {
    pub session_id: Uuid,
    pub response: String,
}

#[derive(Serialize)]
pub struct RespondResponse {
    pub is_complete: bool,
    pub question_text: Option<String>,
    pub question_id: Option<u8>,
    pub audio_base64: Option<String>,
}

/// `POST /checkin/respond`
pub async fn respond(State(state): State<AppState>, Json(body): Json<RespondRequest>) -> Result<Json<RespondResponse>, ApiError> {
    let cancel = CancellationToken::new();
    let result = state.checkin.respond(body.session_id, &body.response, &cancel).await?;

    Ok(Json(RespondResponse {
        is_complete: result.is_complete,
        question_text: result.question_text,
        question_id: result.question_id,
        audio_base64: result.audio.map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)),
    }))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub session_id: Uuid,
    pub status: &'static str,
    pub current_question: i64,
    pub total_questions: usize,
}

/// `GET /checkin/status/:session_id`
pub async fn status(State(state): State<AppState>, Path(session_id): Path<Uuid>) -> Result<Json<StatusResponse>, ApiError> {
    let cancel = CancellationToken::new();
    let view = state.checkin.status(session_id, &cancel).await?;

    Ok(Json(StatusResponse {
        session_id: view.session.id,
        status: view.session.status.as_str(),
        current_question: view.current_question,
        total_questions: view.total_questions,
    }))
}

/// `GET /checkin/question-audio/:session_id/:question_id` — raw audio
/// bytes, cache-first.
pub async fn question_audio(State(state): State<AppState>, Path((session_id, question_id)): Path<(Uuid, u8)>) -> Result<Response, ApiError> {
    let cancel = CancellationToken::new();
    let bytes = state.checkin.audio_for_question(session_id, question_id, &cancel).await?;

    Ok(([(axum::http::header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response())
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    pub session_id: Uuid,
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub check_in_id: Uuid,
    pub needs_manual_review: bool,
}

/// `POST /checkin/complete` — the raw-transcript fallback still saves
/// the check-in, but the response is a 500 whose message says "saved
/// for manual review", per the error-handling contract for LLM failure
/// during completion.
pub async fn complete(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let cancel = CancellationToken::new();
    let context = request_context::extract(&headers, connect_info.as_ref());
    let outcome = state.checkin.complete(body.session_id, context, &cancel).await?;

    if outcome.needs_manual_review {
        return Err(ApiError::ManualReview("check-in saved for manual review".into()));
    }

    Ok(Json(CompleteResponse {
        check_in_id: outcome.check_in.id,
        needs_manual_review: outcome.needs_manual_review,
    }))
}
