use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::adapters::{LlmClient, ObjectStore, TtsClient};
use crate::extraction;
use crate::models::enums::{AuditOperationType, MessageRole, SessionStatus};
use crate::models::{HealthCheckIn, Session};
use crate::question_flow::{self, Question};
use crate::storage::Store;

use super::audit::{AuditService, RequestContext};
use super::error::ServiceError;

const SESSION_TIMEOUT: chrono::Duration = chrono::Duration::minutes(30);
const CACHE_UPLOAD_DEADLINE: Duration = Duration::from_secs(30);

pub struct CheckInService {
    store: Arc<Store>,
    llm: Arc<dyn LlmClient>,
    tts: Arc<dyn TtsClient>,
    object_store: Arc<dyn ObjectStore>,
    audit: Arc<AuditService>,
}

pub struct StartResult {
    pub session: Session,
    pub question_text: String,
    pub question_id: u8,
    pub audio: Option<Vec<u8>>,
}

pub struct RespondResult {
    pub is_complete: bool,
    pub question_text: Option<String>,
    pub question_id: Option<u8>,
    pub audio: Option<Vec<u8>>,
}

pub struct CompleteOutcome {
    pub check_in: HealthCheckIn,
    pub needs_manual_review: bool,
}

pub struct SessionStatusView {
    pub session: Session,
    pub current_question: i64,
    pub total_questions: usize,
}

impl CheckInService {
    pub fn new(store: Arc<Store>, llm: Arc<dyn LlmClient>, tts: Arc<dyn TtsClient>, object_store: Arc<dyn ObjectStore>, audit: Arc<AuditService>) -> Self {
        Self {
            store,
            llm,
            tts,
            object_store,
            audit,
        }
    }

    pub async fn start(&self, user_id: Uuid, context: RequestContext, cancel: &CancellationToken) -> Result<StartResult, ServiceError> {
        self.store.ensure_user(user_id, cancel).await?;

        let session = Session::new(user_id);
        self.store.insert_session(session.clone(), cancel).await?;

        let question = question_flow::next(0).expect("question script is non-empty");
        self.store
            .insert_message(session.id, MessageRole::Assistant, question.text_hu.to_string(), None, cancel)
            .await?;

        let audio = self.question_audio(question, cancel).await;

        self.audit
            .record(user_id, AuditOperationType::Create, "session", &session.id.to_string(), &context, None, cancel)
            .await;

        Ok(StartResult {
            session,
            question_text: question.text_hu.to_string(),
            question_id: question.id,
            audio,
        })
    }

    pub async fn respond(&self, session_id: Uuid, text: &str, cancel: &CancellationToken) -> Result<RespondResult, ServiceError> {
        let session = self.load_active_session(session_id, cancel).await?;

        if expired(&session, Utc::now()) {
            self.store.mark_session_expired(session_id, Utc::now(), cancel).await?;
            return Err(ServiceError::SessionExpired);
        }

        if text.trim().is_empty() {
            return Err(ServiceError::validation("response must not be empty"));
        }

        self.store
            .insert_message(session_id, MessageRole::User, text.to_string(), None, cancel)
            .await?;

        let assistant_count = self.store.count_assistant_messages(session_id, cancel).await?;
        let cursor = assistant_count as usize;

        if question_flow::is_complete(cursor) {
            return Ok(RespondResult {
                is_complete: true,
                question_text: None,
                question_id: None,
                audio: None,
            });
        }

        let question = question_flow::next(cursor).expect("cursor checked against is_complete above");
        self.store
            .insert_message(session_id, MessageRole::Assistant, question.text_hu.to_string(), None, cancel)
            .await?;

        let audio = self.question_audio(question, cancel).await;

        Ok(RespondResult {
            is_complete: false,
            question_text: Some(question.text_hu.to_string()),
            question_id: Some(question.id),
            audio,
        })
    }

    pub async fn complete(&self, session_id: Uuid, context: RequestContext, cancel: &CancellationToken) -> Result<CompleteOutcome, ServiceError> {
        let session = self.load_active_session(session_id, cancel).await?;

        let messages = self.store.list_messages(session_id, cancel).await?;
        let outcome = extraction::extract(
            self.llm.as_ref(),
            session.user_id,
            session_id,
            Utc::now().date_naive(),
            &messages,
            cancel,
        )
        .await;

        let needs_manual_review = outcome.is_fallback();
        let check_in = outcome.into_check_in();

        self.store.insert_health_check_in(check_in.clone(), cancel).await?;
        self.store.mark_session_completed(session_id, Utc::now(), cancel).await?;

        self.audit
            .record(session.user_id, AuditOperationType::Create, "check_in", &check_in.id.to_string(), &context, None, cancel)
            .await;

        Ok(CompleteOutcome {
            check_in,
            needs_manual_review,
        })
    }

    /// Standalone question-audio fetch (the `GET
    /// /checkin/question-audio/:session_id/:question_id` route). The
    /// session id only gates access; the cache key itself is
    /// session-independent.
    pub async fn audio_for_question(&self, session_id: Uuid, question_id: u8, cancel: &CancellationToken) -> Result<Vec<u8>, ServiceError> {
        self.store
            .get_session(session_id, cancel)
            .await?
            .ok_or_else(|| ServiceError::not_found("session", session_id.to_string()))?;

        let question = question_flow::by_id(question_id).ok_or_else(|| ServiceError::validation(format!("unknown question id {question_id}")))?;

        self.question_audio(question, cancel)
            .await
            .ok_or_else(|| ServiceError::Unavailable(crate::adapters::AdapterError::Network("speech synthesis unavailable".into())))
    }

    pub async fn status(&self, session_id: Uuid, cancel: &CancellationToken) -> Result<SessionStatusView, ServiceError> {
        let session = self
            .store
            .get_session(session_id, cancel)
            .await?
            .ok_or_else(|| ServiceError::not_found("session", session_id.to_string()))?;

        let current_question = self.store.count_assistant_messages(session_id, cancel).await?;

        Ok(SessionStatusView {
            session,
            current_question,
            total_questions: question_flow::TOTAL_QUESTIONS,
        })
    }

    /// Cache-first question audio. On a miss, synthesizes via TTS and
    /// fires a detached upload with its own 30s deadline — request
    /// cancellation must not prevent caching useful audio.
    async fn question_audio(&self, question: &Question, cancel: &CancellationToken) -> Option<Vec<u8>> {
        let cache_key = question_audio_key(question.id);

        if let Ok(Some(bytes)) = self.object_store.get(&cache_key, cancel).await {
            return Some(bytes);
        }

        let bytes = self.tts.synthesize(question.text_hu, cancel).await.ok()?;

        let object_store = self.object_store.clone();
        let upload_bytes = bytes.clone();
        tokio::spawn(async move {
            let upload_cancel = CancellationToken::new();
            let upload = object_store.put(&cache_key, "audio/mpeg", upload_bytes, &upload_cancel);
            match tokio::time::timeout(CACHE_UPLOAD_DEADLINE, upload).await {
                Ok(Err(e)) => tracing::warn!(error = %e, "question-audio cache upload failed"),
                Err(_) => tracing::warn!("question-audio cache upload timed out"),
                Ok(Ok(())) => {}
            }
        });

        Some(bytes)
    }

    async fn load_active_session(&self, session_id: Uuid, cancel: &CancellationToken) -> Result<Session, ServiceError> {
        let session = self
            .store
            .get_session(session_id, cancel)
            .await?
            .ok_or_else(|| ServiceError::not_found("session", session_id.to_string()))?;

        if session.status != SessionStatus::Active {
            return Err(ServiceError::SessionNotActive {
                status: session.status.as_str(),
            });
        }

        Ok(session)
    }
}

fn expired(session: &Session, now: DateTime<Utc>) -> bool {
    now - session.started_at > SESSION_TIMEOUT
}

/// Canonical, session- and user-independent cache key — the question
/// text is shared across every session.
fn question_audio_key(question_id: u8) -> String {
    format!("question-audio/hu-HU/{question_id}.mp3")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLlm, InMemoryStore, InMemoryTtsClient};
    use crate::db::sqlite::open_memory_database;

    fn service() -> CheckInService {
        let store = Arc::new(Store::new(open_memory_database().unwrap()));
        let llm = Arc::new(InMemoryLlm::with_response(r#"{"mood": "positive"}"#));
        let tts = Arc::new(InMemoryTtsClient::new());
        let object_store = Arc::new(InMemoryStore::new());
        let audit = Arc::new(AuditService::new(store.clone()));
        CheckInService::new(store, llm, tts, object_store, audit)
    }

    fn context() -> RequestContext {
        RequestContext {
            ip_address: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn start_records_first_question_as_assistant_message() {
        let service = service();
        let cancel = CancellationToken::new();
        let result = service.start(Uuid::new_v4(), context(), &cancel).await.unwrap();
        assert_eq!(result.question_id, 0);
        assert!(result.audio.is_some());
    }

    #[tokio::test]
    async fn respond_rejects_empty_text() {
        let service = service();
        let cancel = CancellationToken::new();
        let started = service.start(Uuid::new_v4(), context(), &cancel).await.unwrap();
        let result = service.respond(started.session.id, "  ", &cancel).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn full_script_completes_and_extracts() {
        let service = service();
        let cancel = CancellationToken::new();
        let started = service.start(Uuid::new_v4(), context(), &cancel).await.unwrap();

        let mut last = service.respond(started.session.id, "valasz 1", &cancel).await.unwrap();
        let mut answered = 1;
        while !last.is_complete {
            last = service.respond(started.session.id, "valasz", &cancel).await.unwrap();
            answered += 1;
            if answered > 20 {
                panic!("script never completed");
            }
        }

        let outcome = service.complete(started.session.id, context(), &cancel).await.unwrap();
        assert!(!outcome.needs_manual_review);

        let status = service.status(started.session.id, &cancel).await.unwrap();
        assert_eq!(status.session.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn respond_on_expired_session_marks_expired_and_fails() {
        let service = service();
        let cancel = CancellationToken::new();
        let user_id = Uuid::new_v4();
        service.store.ensure_user(user_id, &cancel).await.unwrap();

        let mut session = Session::new(user_id);
        session.started_at = Utc::now() - chrono::Duration::hours(2);
        service.store.insert_session(session.clone(), &cancel).await.unwrap();
        service
            .store
            .insert_message(session.id, MessageRole::Assistant, "q".into(), None, &cancel)
            .await
            .unwrap();

        let result = service.respond(session.id, "too late", &cancel).await;
        assert!(matches!(result, Err(ServiceError::SessionExpired)));

        let reloaded = service.store.get_session(session.id, &cancel).await.unwrap().unwrap();
        assert_eq!(reloaded.status, SessionStatus::Expired);
    }

    #[tokio::test]
    async fn question_audio_is_cached_after_first_synthesis() {
        let service = service();
        let cancel = CancellationToken::new();
        let started = service.start(Uuid::new_v4(), context(), &cancel).await.unwrap();
        assert_eq!(started.question_id, 0);

        tokio::time::sleep(Duration::from_millis(50)).await;

        let cache_key = question_audio_key(0);
        assert!(service.object_store.get(&cache_key, &cancel).await.unwrap().is_some());
    }
}
