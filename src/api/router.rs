use axum::routing::{delete, get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware::{logging, recovery};
use crate::api::state::AppState;

/// Builds the full HTTP surface: unauthenticated info/liveness endpoints
/// at the root, everything else under `/api/v1`.
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/status", get(endpoints::status::readiness))
        .route("/checkin/start", post(endpoints::checkin::start))
        .route("/checkin/audio-stream", post(endpoints::checkin::audio_stream))
        .route("/checkin/respond", post(endpoints::checkin::respond))
        .route("/checkin/status/{session_id}", get(endpoints::checkin::status))
        .route("/checkin/question-audio/{session_id}/{question_id}", get(endpoints::checkin::question_audio))
        .route("/checkin/complete", post(endpoints::checkin::complete))
        .route(
            "/health/medications",
            get(endpoints::medications::list).post(endpoints::medications::add),
        )
        .route(
            "/health/medications/{id}",
            get(endpoints::medications::get).post(endpoints::medications::update).delete(endpoints::medications::delete),
        )
        .route("/health/medications/{id}/log", post(endpoints::medications::log_adherence))
        .route(
            "/health/menstruation",
            get(endpoints::health::list_cycles).post(endpoints::health::record_cycle),
        )
        .route(
            "/health/blood-pressure",
            get(endpoints::health::list_blood_pressure).post(endpoints::health::record_blood_pressure),
        )
        .route("/health/fitness-sync", post(endpoints::health::sync_fitness_data))
        .route("/dashboard/summary", get(endpoints::dashboard::summary))
        .route("/reports/generate", post(endpoints::reports::generate))
        .route("/reports/{id}", get(endpoints::reports::get))
        .route("/users/{user_id}/data", delete(endpoints::gdpr::delete_user_data))
        .route("/users/{user_id}/export", get(endpoints::gdpr::export_user_data))
        .with_state(state.clone());

    Router::new()
        .route("/", get(endpoints::status::info))
        .route("/health", get(endpoints::status::health))
        .with_state(state)
        .nest("/api/v1", v1)
        .layer(recovery::layer())
        .layer(axum::middleware::from_fn(logging::log_requests))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLlm, InMemoryStore, InMemorySttClient, InMemoryTtsClient};
    use crate::db::sqlite::open_memory_database;
    use crate::storage::Store;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let store = Arc::new(Store::new(open_memory_database().unwrap()));
        AppState::new(
            store,
            Arc::new(InMemoryLlm::with_response(r#"{"mood": "positive"}"#)),
            Arc::new(InMemoryTtsClient::new()),
            Arc::new(InMemorySttClient::new()),
            Arc::new(InMemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn root_returns_service_info() {
        let app = build_router(test_state());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_probe_under_v1_prefix() {
        let app = build_router(test_state());
        let request = Request::builder().uri("/api/v1/status").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = build_router(test_state());
        let request = Request::builder().uri("/api/v1/nope").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn checkin_start_round_trips_through_the_router() {
        let app = build_router(test_state());
        let user_id = uuid::Uuid::new_v4();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/checkin/start")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"user_id":"{user_id}"}}"#)))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
