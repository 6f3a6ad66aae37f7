//! Error types for the edgequake-pdf2form library.
//!
//! Every failure of a single upload is a [`Pdf2FormError`]. None of them is
//! fatal to the process: the web shell turns each one into an inline message
//! via [`Pdf2FormError::user_message`] and stays ready for the next upload.
//!
//! Three variants are the user-facing classification of a bad document:
//!
//! * [`Pdf2FormError::EmptyDocument`]: the PDF has no text layer to read.
//! * [`Pdf2FormError::MalformedResponse`]: the model reply is not a JSON object.
//! * [`Pdf2FormError::DegenerateExtraction`]: every field came back empty or missing.
//!
//! Everything else (network, pdfium, template, config) is reported as a
//! generic failure carrying the underlying error text.

use thiserror::Error;

/// All errors returned by the edgequake-pdf2form library.
#[derive(Debug, Error)]
pub enum Pdf2FormError {
    // ── Document classification ──────────────────────────────────────────
    /// The PDF yielded no text (blank or whitespace-only after extraction).
    #[error("No text could be extracted from the document.\nScanned PDFs without a text layer are not supported.")]
    EmptyDocument,

    /// The normalised model reply could not be parsed as a JSON object.
    #[error("Model reply is not a valid JSON object: {detail}")]
    MalformedResponse {
        /// The candidate JSON text after normalisation, kept for diagnosis.
        candidate: String,
        detail: String,
    },

    /// Every extracted field is empty or marked missing.
    #[error("None of the required fields were found in the document")]
    DegenerateExtraction,

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The upload carried no bytes.
    #[error("The uploaded file is empty")]
    EmptyUpload,

    /// The upload declared a content type other than PDF.
    #[error("Unsupported content type '{content_type}': only application/pdf is accepted")]
    UnsupportedContentType { content_type: String },

    /// The upload exceeds the configured size limit.
    #[error("Upload exceeds the {limit} byte limit")]
    UploadTooLarge { limit: usize },

    /// The bytes do not start with the `%PDF` magic.
    #[error("File is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not parse the document.
    #[error("PDF is corrupt: {detail}")]
    CorruptPdf { detail: String },

    /// The PDF is encrypted and no (or a wrong) password was configured.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium, or install it system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider could not be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The completion endpoint returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The completion call exceeded the configured timeout.
    #[error("LLM call timed out after {elapsed_ms}ms")]
    ApiTimeout { elapsed_ms: u64 },

    // ── Rendering / config ────────────────────────────────────────────────
    /// The HTML template failed to render.
    #[error("Failed to render form: {0}")]
    RenderFailed(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2FormError {
    /// Inline message shown to the person who uploaded the document.
    pub fn user_message(&self) -> String {
        match self {
            Pdf2FormError::EmptyDocument => {
                "No text could be extracted from the document. Please upload a PDF with selectable text."
                    .to_string()
            }
            Pdf2FormError::MalformedResponse { .. } => {
                "Failed to extract information from the document: the model reply was not valid JSON."
                    .to_string()
            }
            Pdf2FormError::DegenerateExtraction => {
                "Failed to extract information from the document. Please ensure the document contains the required information."
                    .to_string()
            }
            other => format!("An error occurred: {other}"),
        }
    }

    /// The offending candidate text, when the model reply failed to parse.
    pub fn raw_candidate(&self) -> Option<&str> {
        match self {
            Pdf2FormError::MalformedResponse { candidate, .. } => Some(candidate),
            _ => None,
        }
    }

    /// True for failures caused by the uploaded file rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Pdf2FormError::EmptyUpload
                | Pdf2FormError::UnsupportedContentType { .. }
                | Pdf2FormError::UploadTooLarge { .. }
                | Pdf2FormError::NotAPdf { .. }
                | Pdf2FormError::CorruptPdf { .. }
                | Pdf2FormError::PasswordRequired
                | Pdf2FormError::EmptyDocument
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_response_keeps_candidate() {
        let e = Pdf2FormError::MalformedResponse {
            candidate: "not json".into(),
            detail: "expected value at line 1 column 1".into(),
        };
        assert_eq!(e.raw_candidate(), Some("not json"));
        assert!(e.to_string().contains("line 1 column 1"));
    }

    #[test]
    fn unclassified_failure_wraps_error_text() {
        let e = Pdf2FormError::LlmApiError {
            message: "connection reset".into(),
        };
        let msg = e.user_message();
        assert!(msg.starts_with("An error occurred:"), "got: {msg}");
        assert!(msg.contains("connection reset"));
        assert_eq!(e.raw_candidate(), None);
    }

    #[test]
    fn degenerate_extraction_message() {
        let msg = Pdf2FormError::DegenerateExtraction.user_message();
        assert!(msg.contains("required information"));
    }

    #[test]
    fn upload_too_large_display() {
        let e = Pdf2FormError::UploadTooLarge { limit: 20 };
        assert!(e.to_string().contains("20 byte limit"));
        assert!(e.is_client_error());
    }

    #[test]
    fn network_failure_is_not_client_error() {
        let e = Pdf2FormError::ApiTimeout { elapsed_ms: 5000 };
        assert!(!e.is_client_error());
        assert!(e.to_string().contains("5000ms"));
    }
}
