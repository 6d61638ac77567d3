use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::AdapterError;

/// Text-to-speech synthesis for the fixed Hungarian question script.
#[async_trait]
pub trait TtsClient: Send + Sync {
    /// Client-playable MP3 bytes.
    async fn synthesize(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<u8>, AdapterError>;

    /// WAV bytes, suitable as input to the STT service.
    async fn synthesize_wav(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<u8>, AdapterError>;
}

pub struct HttpTtsClient {
    client: reqwest::Client,
    base_url: String,
    voice: String,
}

impl HttpTtsClient {
    pub fn new(base_url: impl Into<String>, voice: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client build");
        Self {
            client,
            base_url: base_url.into(),
            voice: voice.into(),
        }
    }
}

#[async_trait]
impl TtsClient for HttpTtsClient {
    async fn synthesize(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<u8>, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }

        #[derive(serde::Serialize)]
        struct SynthesizeRequest<'a> {
            text: &'a str,
            voice: &'a str,
        }

        let response = tokio::select! {
            result = self
                .client
                .post(format!("{}/v1/synthesize", self.base_url))
                .json(&SynthesizeRequest { text, voice: &self.voice })
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
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| AdapterError::Network(e.to_string()))
    }

    async fn synthesize_wav(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<u8>, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }

        #[derive(serde::Serialize)]
        struct SynthesizeRequest<'a> {
            text: &'a str,
            voice: &'a str,
        }

        let response = tokio::select! {
            result = self
                .client
                .post(format!("{}/v1/synthesize/wav", self.base_url))
                .json(&SynthesizeRequest { text, voice: &self.voice })
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
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| AdapterError::Network(e.to_string()))
    }
}

/// In-memory double: deterministic bytes derived from the question text,
/// so repeated calls for the same text are byte-identical — matching the
/// "all writers produce identical bytes" cache convergence invariant.
pub struct InMemoryTtsClient {
    calls: Mutex<HashMap<String, u32>>,
}

impl Default for InMemoryTtsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTtsClient {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn call_count(&self, text: &str) -> u32 {
        *self.calls.lock().unwrap().get(text).unwrap_or(&0)
    }
}

#[async_trait]
impl TtsClient for InMemoryTtsClient {
    async fn synthesize(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<u8>, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        *self.calls.lock().unwrap().entry(text.to_string()).or_insert(0) += 1;
        Ok(text.as_bytes().to_vec())
    }

    async fn synthesize_wav(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<u8>, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        *self.calls.lock().unwrap().entry(text.to_string()).or_insert(0) += 1;
        let mut wav = b"WAV".to_vec();
        wav.extend_from_slice(text.as_bytes());
        Ok(wav)
    }
}
