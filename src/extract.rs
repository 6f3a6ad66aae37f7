//! Extraction entry points.
//!
//! [`FormExtractor`] owns the resolved configuration and the completion
//! client, and runs one document through the pipeline from start to finish:
//!
//! ```text
//! upload → text → prompt → completion → normalize → parse → validate → render
//! ```
//!
//! Every step either hands its output to the next or ends the run with a
//! [`Pdf2FormError`]. Nothing is retried and nothing is kept between runs.

use crate::config::ExtractionConfig;
use crate::error::Pdf2FormError;
use crate::fields::{ExtractedFields, FieldKey};
use crate::output::{ExtractionStats, FormOutput};
use crate::pipeline::input::{validate_upload, Upload};
use crate::pipeline::llm::{CompletionClient, ProviderClient};
use crate::pipeline::text::{self, DocumentText};
use crate::pipeline::{normalize, render, validate};
use crate::prompts::build_extraction_prompt;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs documents through the extraction pipeline.
#[derive(Clone)]
pub struct FormExtractor {
    config: ExtractionConfig,
    client: Arc<dyn CompletionClient>,
}

impl std::fmt::Debug for FormExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormExtractor")
            .field("config", &self.config)
            .field("client", &"<dyn CompletionClient>")
            .finish()
    }
}

impl FormExtractor {
    /// Build an extractor around an existing completion client.
    pub fn new(config: ExtractionConfig, client: Arc<dyn CompletionClient>) -> Self {
        Self { config, client }
    }

    /// Resolve the LLM provider from `config` and build an extractor on it.
    ///
    /// Call this once at startup: a missing credential surfaces here as
    /// [`Pdf2FormError::ProviderNotConfigured`] instead of on the first upload.
    pub fn from_config(config: ExtractionConfig) -> Result<Self, Pdf2FormError> {
        let provider = resolve_provider(&config)?;
        let client = ProviderClient::new(provider, &config);
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run the full pipeline on an uploaded PDF.
    pub async fn extract_from_upload(
        &self,
        upload: Upload<'_>,
    ) -> Result<FormOutput, Pdf2FormError> {
        let total_start = Instant::now();

        // ── Step 1: Validate upload ──────────────────────────────────────────
        validate_upload(&upload, self.config.max_upload_bytes)?;

        // ── Step 2: Extract text ─────────────────────────────────────────────
        let text_start = Instant::now();
        let document = text::extract_text(
            upload.bytes.to_vec(),
            self.config.pdfium_lib_path.clone(),
            self.config.pdf_password.clone(),
        )
        .await?;
        let text_duration_ms = text_start.elapsed().as_millis() as u64;
        info!(
            "Extracted {} chars from {}/{} pages in {}ms",
            document.text.len(),
            document.pages_with_text,
            document.page_count,
            text_duration_ms
        );

        let mut output = self.extract_document(&document).await?;
        output.stats.text_duration_ms = text_duration_ms;
        output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
        Ok(output)
    }

    /// Run the full pipeline on raw PDF bytes with no client metadata.
    pub async fn extract_from_bytes(&self, bytes: &[u8]) -> Result<FormOutput, Pdf2FormError> {
        self.extract_from_upload(Upload::from_bytes(bytes)).await
    }

    /// Run the pipeline from already-extracted document text.
    pub async fn extract_from_text(&self, text: &str) -> Result<FormOutput, Pdf2FormError> {
        let total_start = Instant::now();
        let document = DocumentText {
            text: text.to_string(),
            ..DocumentText::default()
        };
        let mut output = self.extract_document(&document).await?;
        output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
        Ok(output)
    }

    async fn extract_document(&self, document: &DocumentText) -> Result<FormOutput, Pdf2FormError> {
        // ── Step 3: Refuse blank documents before any network call ───────────
        if document.text.trim().is_empty() {
            warn!("Document has no extractable text");
            return Err(Pdf2FormError::EmptyDocument);
        }

        // ── Step 4: Ask the model ────────────────────────────────────────────
        let prompt =
            build_extraction_prompt(&document.text, self.config.prompt_template.as_deref());
        debug!("Prompt: {} chars", prompt.len());

        let completion = self.client.complete(&prompt).await.inspect_err(|e| {
            warn!("Completion failed: {}", e);
        })?;
        debug!("Reply: {} chars", completion.content.len());

        // ── Step 5: Normalise and parse ──────────────────────────────────────
        let candidate = normalize::normalize_reply(&completion.content);
        let object = normalize::parse_candidate(&candidate).inspect_err(|e| {
            warn!("{}", e);
        })?;

        // ── Step 6: Reject degenerate extractions ────────────────────────────
        validate::validate_fields(&object).inspect_err(|e| {
            warn!("{}", e);
        })?;

        // ── Step 7: Render ───────────────────────────────────────────────────
        let mut fields = ExtractedFields::from_json_object(&object);
        let fields_found = fields
            .iter()
            .filter(|(k, v)| *k != FieldKey::SaleDate && !v.is_missing())
            .count();
        fields.override_sale_date(&self.config.sale_date_placeholder);
        let html = render::render_form(&fields)?;

        info!(
            "Form rendered: {}/{} fields found, {} tokens in / {} out",
            fields_found,
            FieldKey::ALL.len() - 1,
            completion.prompt_tokens,
            completion.completion_tokens
        );

        Ok(FormOutput {
            html,
            fields,
            raw_reply: completion.content,
            stats: ExtractionStats {
                page_count: document.page_count,
                pages_with_text: document.pages_with_text,
                text_chars: document.text.chars().count(),
                fields_found,
                input_tokens: completion.prompt_tokens,
                output_tokens: completion.completion_tokens,
                llm_duration_ms: completion.duration_ms,
                ..ExtractionStats::default()
            },
        })
    }
}

// ── Provider resolution ──────────────────────────────────────────────────

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`): used as-is.
/// 2. **Named provider** (`config.provider_name`): created by
///    [`ProviderFactory::create_llm_provider`] with the configured model;
///    the factory reads that provider's API key variable.
/// 3. **Auto-detection** ([`ProviderFactory::from_env`]): the first provider
///    with a credential present wins.
pub fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, Pdf2FormError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model_or_default();
        info!("Using provider '{}' with model '{}'", name, model);
        return ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            Pdf2FormError::ProviderNotConfigured {
                provider: name.to_string(),
                hint: format!("{e}"),
            }
        });
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2FormError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::Completion;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replies with a fixed string and records every prompt.
    struct ScriptedClient {
        reply: String,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl ScriptedClient {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, prompt: &str) -> Result<Completion, Pdf2FormError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok(Completion {
                content: self.reply.clone(),
                prompt_tokens: 100,
                completion_tokens: 20,
                duration_ms: 1,
            })
        }
    }

    struct FailingClient;

    #[async_trait]
    impl CompletionClient for FailingClient {
        async fn complete(&self, _prompt: &str) -> Result<Completion, Pdf2FormError> {
            Err(Pdf2FormError::LlmApiError {
                message: "connection refused".into(),
            })
        }
    }

    fn extractor(client: Arc<dyn CompletionClient>) -> FormExtractor {
        FormExtractor::new(ExtractionConfig::default(), client)
    }

    fn all_missing_except_buyer() -> String {
        let body = FieldKey::ALL
            .iter()
            .map(|k| match k {
                FieldKey::BuyerName => format!("\"{}\": \"Jane Doe\"", k.json_key()),
                _ => format!("\"{}\": \"missing\"", k.json_key()),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("```json\n{{{body}}}\n```")
    }

    #[tokio::test]
    async fn fenced_reply_with_one_field_renders() {
        let client = ScriptedClient::new(&all_missing_except_buyer());
        let out = extractor(client.clone())
            .extract_from_text("BILL OF SALE\nBuyer: Jane Doe")
            .await
            .unwrap();
        assert!(out.html.contains("Jane Doe"));
        assert_eq!(out.stats.fields_found, 1);
        assert_eq!(out.stats.input_tokens, 100);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.ends_with("BILL OF SALE\nBuyer: Jane Doe"));
    }

    #[tokio::test]
    async fn prose_wrapped_degenerate_reply_is_rejected() {
        let client = ScriptedClient::new(
            "Here is the data: {\"buyer_name\": \"missing\", \"vin\": \"\"}",
        );
        let err = extractor(client)
            .extract_from_text("some document")
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2FormError::DegenerateExtraction));
    }

    #[tokio::test]
    async fn empty_text_never_calls_the_model() {
        let client = ScriptedClient::new("{}");
        let err = extractor(client.clone())
            .extract_from_text(" \n\t ")
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2FormError::EmptyDocument));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reply_without_json_is_malformed() {
        let client = ScriptedClient::new("Sorry, I cannot help with that.");
        let err = extractor(client)
            .extract_from_text("some document")
            .await
            .unwrap_err();
        assert_eq!(err.raw_candidate(), Some("Sorry, I cannot help with that."));
    }

    #[tokio::test]
    async fn model_sale_date_is_discarded() {
        let client = ScriptedClient::new(
            "{\"vin\": \"1HGCM82633A004352\", \"sale_date\": \"2024-03-01\"}",
        );
        let config = ExtractionConfig::builder()
            .sale_date_placeholder("TBD")
            .build()
            .unwrap();
        let out = FormExtractor::new(config, client)
            .extract_from_text("doc")
            .await
            .unwrap();
        assert_eq!(out.fields.get(FieldKey::SaleDate).as_str(), "TBD");
        assert!(!out.html.contains("2024-03-01"));
        assert!(out.raw_reply.contains("2024-03-01"));
    }

    #[tokio::test]
    async fn sale_date_alone_does_not_count_as_found() {
        let client = ScriptedClient::new("{\"sale_date\": \"2024-03-01\", \"vin\": \"X1\"}");
        let out = extractor(client).extract_from_text("doc").await.unwrap();
        assert_eq!(out.stats.fields_found, 1);
    }

    #[tokio::test]
    async fn client_failure_propagates() {
        let err = extractor(Arc::new(FailingClient))
            .extract_from_text("doc")
            .await
            .unwrap_err();
        assert!(err.user_message().contains("connection refused"));
    }

    #[tokio::test]
    async fn non_pdf_upload_is_rejected_before_pdfium() {
        let client = ScriptedClient::new("{}");
        let err = extractor(client.clone())
            .extract_from_bytes(b"plain text, not a pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2FormError::NotAPdf { .. }));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn custom_prompt_template_is_used() {
        let config = ExtractionConfig::builder()
            .prompt_template("KEYS={keys}\n{text}")
            .build()
            .unwrap();
        let client = ScriptedClient::new("{\"vin\": \"X\"}");
        let ex = FormExtractor::new(config, client.clone());
        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(ex.extract_from_text("doc"))
            .unwrap();
        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.starts_with("KEYS=seller_name"));
    }
}
