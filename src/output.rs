//! Result types returned by the extraction pipeline.

use crate::fields::ExtractedFields;
use serde::Serialize;

/// Everything produced for one document.
#[derive(Debug, Clone, Serialize)]
pub struct FormOutput {
    /// Rendered form HTML, values escaped, sale date set to the placeholder.
    pub html: String,
    /// The schema fields as rendered (sale date included as the placeholder).
    pub fields: ExtractedFields,
    /// The model's reply before normalisation.
    pub raw_reply: String,
    pub stats: ExtractionStats,
}

/// Sizes and timings for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionStats {
    /// Pages in the PDF; zero when the pipeline started from text.
    pub page_count: usize,
    pub pages_with_text: usize,
    pub text_chars: usize,
    /// Fields carrying a value, sale date excluded.
    pub fields_found: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub text_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}
