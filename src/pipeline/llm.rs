//! Completion client: send the extraction prompt, get the raw reply back.
//!
//! [`CompletionClient`] is the seam between the pipeline and the network.
//! [`ProviderClient`] implements it on top of an `edgequake_llm`
//! [`LLMProvider`]; tests substitute a scripted client.
//!
//! The request is a single user message with no system message. There are no
//! retries: a failed call fails the upload and the user can simply re-submit.

use crate::config::ExtractionConfig;
use crate::error::Pdf2FormError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;
use tracing::debug;

/// One raw model reply plus usage.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    /// The reply text, untouched.
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub duration_ms: u64,
}

/// A text-generation service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `prompt` and return the model's reply.
    async fn complete(&self, prompt: &str) -> Result<Completion, Pdf2FormError>;
}

/// [`CompletionClient`] backed by an `edgequake_llm` provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout: Option<Duration>,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExtractionConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
            timeout: config.api_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &"<dyn LLMProvider>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl CompletionClient for ProviderClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, Pdf2FormError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];
        let response = bounded_call(
            self.provider.chat(&messages, Some(&self.options)),
            self.timeout,
        )
        .await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Completion: {} input tokens, {} output tokens, {}ms",
            response.prompt_tokens, response.completion_tokens, duration_ms
        );

        Ok(Completion {
            content: response.content,
            prompt_tokens: response.prompt_tokens as usize,
            completion_tokens: response.completion_tokens as usize,
            duration_ms,
        })
    }
}

/// Await a provider call, mapping an elapsed `timeout` to
/// [`Pdf2FormError::ApiTimeout`] and a provider error to
/// [`Pdf2FormError::LlmApiError`].
async fn bounded_call<T, E, F>(call: F, timeout: Option<Duration>) -> Result<T, Pdf2FormError>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            Pdf2FormError::ApiTimeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            }
        })?,
        None => call.await,
    };

    result.map_err(|e| Pdf2FormError::LlmApiError {
        message: format!("{}", e),
    })
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = ExtractionConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, Some(1024));
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, String>("late")
        };
        let err = bounded_call(slow, Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(
            matches!(err, Pdf2FormError::ApiTimeout { elapsed_ms } if elapsed_ms < 5000),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn provider_error_maps_to_api_error() {
        let failing = async { Err::<(), _>("rate limited (429)") };
        match bounded_call(failing, None).await {
            Err(Pdf2FormError::LlmApiError { message }) => assert!(message.contains("429")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fast_call_within_timeout_succeeds() {
        let fast = async { Ok::<_, String>("{}") };
        let reply = bounded_call(fast, Some(Duration::from_secs(1))).await.unwrap();
        assert_eq!(reply, "{}");
    }
}
