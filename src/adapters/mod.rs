//! External adapters — LLM, TTS, STT, object store.
//!
//! Each trait is `#[async_trait]` and has one HTTP-backed implementation
//! plus one in-memory double used throughout the service-layer tests,
//! following the reference app's `OllamaClient`/mock-client split.

pub mod llm;
pub mod object_store;
pub mod stt;
pub mod tts;

pub use llm::{HttpLlmClient, InMemoryLlm, LlmClient};
pub use object_store::{InMemoryStore, LocalObjectStore, ObjectStore};
pub use stt::{HttpSttClient, InMemorySttClient, SttClient};
pub use tts::{HttpTtsClient, InMemoryTtsClient, TtsClient};

use thiserror::Error;

/// Failure modes surfaced by any external adapter call.
///
/// Only `Network`, `ServerError` with a 5xx code, and `RateLimited` are
/// retried by the LLM adapter's backoff loop; the rest are terminal.
#[derive(Error, Debug, Clone)]
pub enum AdapterError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server error: {0}")]
    ServerError(u16),

    #[error("rate limited")]
    RateLimited,

    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("cancelled")]
    Cancelled,
}

impl AdapterError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdapterError::Network(_) | AdapterError::ServerError(500..=599) | AdapterError::RateLimited
        )
    }
}
