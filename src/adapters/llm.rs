use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::AdapterError;

const BASE_BACKOFF: Duration = Duration::from_secs(1);
const BACKOFF_FACTOR: u32 = 2;
const MAX_ATTEMPTS: u32 = 3;

/// Large-language-model completion, used by the extractor to turn a
/// conversation transcript into structured fields.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, AdapterError>;
}

/// HTTP-backed implementation against an Ollama-compatible `/api/generate`
/// endpoint, mirroring the reference app's `OllamaClient` request shape.
pub struct HttpLlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl HttpLlmClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client build");
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    async fn complete_once(&self, prompt: &str) -> Result<String, AdapterError> {
        #[derive(serde::Serialize)]
        struct GenerateRequest<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
        }

        #[derive(serde::Deserialize)]
        struct GenerateResponse {
            response: String,
            #[serde(default)]
            prompt_eval_count: u64,
            #[serde(default)]
            eval_count: u64,
        }

        let start = std::time::Instant::now();

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AdapterError::Unauthorized);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AdapterError::RateLimited);
        }
        if status.is_client_error() {
            return Err(AdapterError::BadRequest(status.to_string()));
        }
        if status.is_server_error() {
            return Err(AdapterError::ServerError(status.as_u16()));
        }

        let body = response.json::<GenerateResponse>().await.map_err(classify_reqwest_error)?;

        tracing::info!(
            prompt_tokens = body.prompt_eval_count,
            completion_tokens = body.eval_count,
            total_tokens = body.prompt_eval_count + body.eval_count,
            wall_time_ms = start.elapsed().as_millis() as u64,
            "llm completion"
        );

        Ok(body.response)
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> AdapterError {
    if error.is_timeout() || error.is_connect() {
        AdapterError::Network(error.to_string())
    } else {
        AdapterError::Network(error.to_string())
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, AdapterError> {
        retry_with_backoff(cancel, || self.complete_once(prompt)).await
    }
}

/// Exponential backoff (base 1s, factor 2, 3 attempts) shared by every
/// retryable adapter call. A cancelled sleep aborts the loop immediately.
async fn retry_with_backoff<F, Fut>(cancel: &CancellationToken, mut call: F) -> Result<String, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<String, AdapterError>>,
{
    let mut attempt = 0;
    let mut delay = BASE_BACKOFF;

    loop {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }

        attempt += 1;
        let result = call().await;

        match &result {
            Ok(_) => return result,
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(AdapterError::Cancelled),
                }
                delay *= BACKOFF_FACTOR;
            }
            Err(_) => return result,
        }
    }
}

/// In-memory double used by service-level tests. Records every prompt it
/// was asked to complete and returns a pre-configured response, or a
/// pre-configured error for fault-injection tests.
pub struct InMemoryLlm {
    response: Mutex<Result<String, AdapterError>>,
    prompts_seen: Mutex<Vec<String>>,
}

impl InMemoryLlm {
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Mutex::new(Ok(response.into())),
            prompts_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_error(error: AdapterError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            prompts_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts_seen(&self) -> Vec<String> {
        self.prompts_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for InMemoryLlm {
    async fn complete(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        self.prompts_seen.lock().unwrap().push(prompt.to_string());
        self.response.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_llm_returns_configured_response() {
        let llm = InMemoryLlm::with_response("{}");
        let cancel = CancellationToken::new();
        let result = llm.complete("hello", &cancel).await.unwrap();
        assert_eq!(result, "{}");
        assert_eq!(llm.prompts_seen(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let llm = InMemoryLlm::with_response("{}");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = llm.complete("hello", &cancel).await;
        assert!(matches!(result, Err(AdapterError::Cancelled)));
    }

    #[test]
    fn only_network_5xx_and_rate_limited_are_retryable() {
        assert!(AdapterError::Network("x".into()).is_retryable());
        assert!(AdapterError::ServerError(503).is_retryable());
        assert!(AdapterError::RateLimited.is_retryable());
        assert!(!AdapterError::ServerError(404).is_retryable());
        assert!(!AdapterError::Unauthorized.is_retryable());
        assert!(!AdapterError::BadRequest("x".into()).is_retryable());
        assert!(!AdapterError::Cancelled.is_retryable());
    }
}
