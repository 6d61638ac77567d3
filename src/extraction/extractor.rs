use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::adapters::{AdapterError, LlmClient};
use crate::models::checkin::HealthCheckIn;
use crate::models::Message;

use super::normalize::{normalize, RawExtraction};
use super::parse::parse_llm_response;
use super::prompt::build_prompt;

/// Result of attempting extraction on a completed session. Either arm
/// still produces a `HealthCheckIn` row — the contract of record is
/// "raw saved, marked for review", never "nothing saved".
pub enum ExtractionOutcome {
    Structured(HealthCheckIn),
    Fallback(HealthCheckIn),
}

impl ExtractionOutcome {
    pub fn into_check_in(self) -> HealthCheckIn {
        match self {
            ExtractionOutcome::Structured(c) | ExtractionOutcome::Fallback(c) => c,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ExtractionOutcome::Fallback(_))
    }
}

/// Runs the LLM completion, parses and normalizes its response, and
/// builds a `HealthCheckIn`. Any LLM failure or parse failure falls back
/// to a raw-transcript record with every extracted enum left null.
pub async fn extract(
    llm: &dyn LlmClient,
    user_id: Uuid,
    session_id: Uuid,
    check_in_date: chrono::NaiveDate,
    messages: &[Message],
    cancel: &CancellationToken,
) -> ExtractionOutcome {
    if cancel.is_cancelled() {
        return ExtractionOutcome::Fallback(fallback_check_in(user_id, session_id, check_in_date, messages));
    }

    let prompt = build_prompt(messages);

    let completion = match llm.complete(&prompt, cancel).await {
        Ok(text) => text,
        Err(AdapterError::Cancelled) | Err(_) => {
            return ExtractionOutcome::Fallback(fallback_check_in(user_id, session_id, check_in_date, messages));
        }
    };

    let parsed = match parse_llm_response(&completion) {
        Ok(parsed) => parsed,
        Err(_) => {
            return ExtractionOutcome::Fallback(fallback_check_in(user_id, session_id, check_in_date, messages));
        }
    };

    let normalized: RawExtraction = normalize(parsed);

    ExtractionOutcome::Structured(HealthCheckIn {
        id: Uuid::new_v4(),
        user_id,
        session_id,
        check_in_date,
        symptoms: normalized.symptoms,
        mood: Some(normalized.mood),
        pain_level: normalized.pain_level,
        energy_level: Some(normalized.energy_level),
        sleep_quality: Some(normalized.sleep_quality),
        medication_taken: Some(normalized.medication_taken),
        physical_activity: normalized.physical_activity,
        breakfast: normalized.breakfast,
        lunch: normalized.lunch,
        dinner: normalized.dinner,
        general_feeling: normalized.general_feeling,
        additional_notes: normalized.additional_notes,
        raw_transcript: None,
        created_at: Utc::now(),
    })
}

fn fallback_check_in(user_id: Uuid, session_id: Uuid, check_in_date: chrono::NaiveDate, messages: &[Message]) -> HealthCheckIn {
    let transcript = messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    HealthCheckIn {
        id: Uuid::new_v4(),
        user_id,
        session_id,
        check_in_date,
        symptoms: Vec::new(),
        mood: None,
        pain_level: None,
        energy_level: None,
        sleep_quality: None,
        medication_taken: None,
        physical_activity: Vec::new(),
        breakfast: None,
        lunch: None,
        dinner: None,
        general_feeling: None,
        additional_notes: None,
        raw_transcript: Some(transcript),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLlm;
    use crate::models::enums::MessageRole;

    fn sample_messages(session_id: Uuid) -> Vec<Message> {
        vec![Message {
            id: Uuid::new_v4(),
            session_id,
            role: MessageRole::Assistant,
            content: "Hogy erzi magat?".into(),
            audio_blob_key: None,
            created_at: Utc::now(),
            sequence: 1,
        }]
    }

    #[tokio::test]
    async fn successful_completion_yields_structured_check_in() {
        let llm = InMemoryLlm::with_response(
            r#"{"symptoms": ["fejfajas"], "mood": "positive", "pain_level": 2}"#,
        );
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let cancel = CancellationToken::new();

        let outcome = extract(
            &llm,
            user_id,
            session_id,
            Utc::now().date_naive(),
            &sample_messages(session_id),
            &cancel,
        )
        .await;

        assert!(!outcome.is_fallback());
        let check_in = outcome.into_check_in();
        assert!(check_in.is_well_formed());
        assert!(check_in.raw_transcript.is_none());
    }

    #[tokio::test]
    async fn llm_failure_falls_back_to_raw_transcript() {
        let llm = InMemoryLlm::with_error(AdapterError::ServerError(503));
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let cancel = CancellationToken::new();

        let outcome = extract(
            &llm,
            user_id,
            session_id,
            Utc::now().date_naive(),
            &sample_messages(session_id),
            &cancel,
        )
        .await;

        assert!(outcome.is_fallback());
        let check_in = outcome.into_check_in();
        assert!(check_in.is_well_formed());
        assert!(check_in.raw_transcript.is_some());
        assert!(check_in.mood.is_none());
    }

    #[tokio::test]
    async fn unparseable_response_falls_back() {
        let llm = InMemoryLlm::with_response("not json");
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let cancel = CancellationToken::new();

        let outcome = extract(
            &llm,
            user_id,
            session_id,
            Utc::now().date_naive(),
            &sample_messages(session_id),
            &cancel,
        )
        .await;

        assert!(outcome.is_fallback());
    }

    #[tokio::test]
    async fn cancelled_token_falls_back_without_calling_llm() {
        let llm = InMemoryLlm::with_response(r#"{"mood": "positive"}"#);
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = extract(
            &llm,
            user_id,
            session_id,
            Utc::now().date_naive(),
            &sample_messages(session_id),
            &cancel,
        )
        .await;

        assert!(outcome.is_fallback());
        assert!(llm.prompts_seen().is_empty());
    }
}
