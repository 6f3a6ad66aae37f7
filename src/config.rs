//! Configuration types for PDF-to-form extraction.
//!
//! All pipeline behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The config is resolved once at
//! startup and handed to [`crate::extract::FormExtractor`]; nothing in the
//! pipeline reads the process environment on its own.
//!
//! [`ServerConfig`] carries the few knobs that only the web shell needs.

use crate::error::Pdf2FormError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Placeholder written into `sale_date` on every rendered form.
pub const DEFAULT_SALE_DATE_PLACEHOLDER: &str = "MM/DD/YYYY";

/// Default upload limit: 20 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Configuration for a PDF-to-form extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2form::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4.1-mini")
///     .max_tokens(800)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 800);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses "gpt-4.1-nano".
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected at startup.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0.
    ///
    /// Field extraction must copy what is on the page, so sampling stays greedy.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 1024.
    ///
    /// Fourteen fields with addresses rarely exceed 400 tokens; the headroom
    /// covers models that wrap the JSON in prose.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Default: None (wait for the service).
    pub api_timeout_secs: Option<u64>,

    /// Custom prompt. Must contain a `{text}` placeholder. If None, uses
    /// [`crate::prompts::DEFAULT_EXTRACTION_PROMPT`].
    pub prompt_template: Option<String>,

    /// Value rendered for `sale_date`, whatever the model extracted.
    pub sale_date_placeholder: String,

    /// Largest accepted upload in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,

    /// Directory containing the pdfium shared library. If None, binds to the
    /// system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    pub pdf_password: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 1024,
            api_timeout_secs: None,
            prompt_template: None,
            sale_date_placeholder: DEFAULT_SALE_DATE_PLACEHOLDER.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            pdfium_lib_path: None,
            pdf_password: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("prompt_template", &self.prompt_template.as_ref().map(|p| p.len()))
            .field("sale_date_placeholder", &self.sale_date_placeholder)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("pdf_password", &self.pdf_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model name used when none is configured.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or("gpt-4.1-nano")
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn sale_date_placeholder(mut self, value: impl Into<String>) -> Self {
        self.config.sale_date_placeholder = value.into();
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn pdf_password(mut self, pwd: impl Into<String>) -> Self {
        self.config.pdf_password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2FormError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(Pdf2FormError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(Pdf2FormError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(Pdf2FormError::InvalidConfig(
                "api_timeout_secs must be ≥ 1 when set".into(),
            ));
        }
        if let Some(ref t) = c.prompt_template {
            if !t.contains("{text}") {
                return Err(Pdf2FormError::InvalidConfig(
                    "prompt template must contain a {text} placeholder".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

/// Settings for the interactive web shell.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: 127.0.0.1:8501.
    pub bind: SocketAddr,

    /// Uploads processed at the same time. Default: 1 (strictly one at a time).
    pub max_concurrent_uploads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            max_concurrent_uploads: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert_eq!(c.temperature, 0.0);
        assert_eq!(c.max_tokens, 1024);
        assert_eq!(c.sale_date_placeholder, DEFAULT_SALE_DATE_PLACEHOLDER);
        assert_eq!(c.model_or_default(), "gpt-4.1-nano");
        assert!(c.api_timeout_secs.is_none());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ExtractionConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn prompt_template_requires_placeholder() {
        let err = ExtractionConfig::builder()
            .prompt_template("Extract the fields.")
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2FormError::InvalidConfig(_)));

        let ok = ExtractionConfig::builder()
            .prompt_template("Extract the fields.\n{text}")
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(ExtractionConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let c = ExtractionConfig::builder()
            .pdf_password("hunter2")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn server_defaults_to_single_upload() {
        let s = ServerConfig::default();
        assert_eq!(s.max_concurrent_uploads, 1);
        assert_eq!(s.bind.port(), 8501);
    }
}
