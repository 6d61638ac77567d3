use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::AdapterError;

/// Speech-to-text transcription of a streamed audio chunk.
#[async_trait]
pub trait SttClient: Send + Sync {
    async fn transcribe(&self, audio: &[u8], cancel: &CancellationToken) -> Result<String, AdapterError>;
}

pub struct HttpSttClient {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

impl HttpSttClient {
    pub fn new(base_url: impl Into<String>, language: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client build");
        Self {
            client,
            base_url: base_url.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl SttClient for HttpSttClient {
    async fn transcribe(&self, audio: &[u8], cancel: &CancellationToken) -> Result<String, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }

        #[derive(serde::Deserialize)]
        struct TranscribeResponse {
            text: String,
        }

        let response = tokio::select! {
            result = self
                .client
                .post(format!("{}/v1/transcribe?lang={}", self.base_url, self.language))
                .body(audio.to_vec())
                .send() => result.map_err(|e| AdapterError::Network(e.to_string()))?,
            _ = cancel.cancelled() => return Err(AdapterError::Cancelled),
        };

        let status = response.status();
        if status.is_server_error() {
            return Err(AdapterError::ServerError(status.as_u16()));
        }
        if !status.is_success() {
            return Err(AdapterError::BadRequest(status.to_string()));
        }

        response
            .json::<TranscribeResponse>()
            .await
            .map(|body| body.text)
            .map_err(|e| AdapterError::Network(e.to_string()))
    }
}

/// In-memory double. Returns the audio bytes decoded as UTF-8 when the
/// test feeds text-as-bytes directly, else a fixed placeholder.
pub struct InMemorySttClient {
    fixed_transcription: Mutex<Option<String>>,
}

impl Default for InMemorySttClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySttClient {
    pub fn new() -> Self {
        Self {
            fixed_transcription: Mutex::new(None),
        }
    }

    pub fn with_fixed_transcription(text: impl Into<String>) -> Self {
        Self {
            fixed_transcription: Mutex::new(Some(text.into())),
        }
    }
}

#[async_trait]
impl SttClient for InMemorySttClient {
    async fn transcribe(&self, audio: &[u8], cancel: &CancellationToken) -> Result<String, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        if let Some(fixed) = self.fixed_transcription.lock().unwrap().clone() {
            return Ok(fixed);
        }
        Ok(String::from_utf8_lossy(audio).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_stt_echoes_bytes_as_text() {
        let stt = InMemorySttClient::new();
        let cancel = CancellationToken::new();
        let result = stt.transcribe("jol aludtam".as_bytes(), &cancel).await.unwrap();
        assert_eq!(result, "jol aludtam");
    }

    #[tokio::test]
    async fn in_memory_stt_honors_cancellation() {
        let stt = InMemorySttClient::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = stt.transcribe(b"x", &cancel).await;
        assert!(matches!(result, Err(AdapterError::Cancelled)));
    }
}
