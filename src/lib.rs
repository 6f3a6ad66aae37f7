//! # edgequake-pdf2form
//!
//! Turn an uploaded PDF vehicle-sales document into a filled-in state
//! authority form, using a language model to read the document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Input      reject non-PDF, empty or oversized uploads
//!  ├─ 2. Text       read every page's text layer via pdfium (spawn_blocking)
//!  ├─ 3. Prompt     fixed instructions + field list + document text
//!  ├─ 4. LLM        one completion call, no retries
//!  ├─ 5. Normalize  strip ``` fences, take the first-{ to last-} span
//!  ├─ 6. Validate   reject replies where every field is empty/"missing"
//!  └─ 7. Render     escaped HTML form; sale date set to a fixed placeholder
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2form::{ExtractionConfig, FormExtractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let extractor = FormExtractor::from_config(ExtractionConfig::default())?;
//!     let bytes = std::fs::read("bill_of_sale.pdf")?;
//!     let output = extractor.extract_from_bytes(&bytes).await?;
//!     println!("{}", output.html);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2form` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod fields;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, ServerConfig};
pub use error::Pdf2FormError;
pub use extract::{resolve_provider, FormExtractor};
pub use fields::{ExtractedFields, FieldKey, FieldValue};
pub use output::{ExtractionStats, FormOutput};
pub use pipeline::llm::{Completion, CompletionClient, ProviderClient};
pub use server::{create_router, start_server, AppState};
