//! Pipeline stages for PDF-to-form extraction.
//!
//! Each submodule implements exactly one step. Control flow is strictly
//! linear per upload; see [`crate::extract::FormExtractor`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──▶ llm ──▶ normalize ──▶ validate ──▶ render
//! (upload)  (pdfium) (LLM)   (fences,      (degenerate  (askama,
//!                             brace span)   check)       escaped)
//! ```
//!
//! 1. [`input`]: reject non-PDF, empty or oversized uploads
//! 2. [`text`]: read the text layer of every page; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`llm`]: the only stage with network I/O
//! 4. [`normalize`]: strip fences and select the JSON object
//! 5. [`validate`]: reject replies where no field was found
//! 6. [`render`]: fill the HTML form

pub mod input;
pub mod llm;
pub mod normalize;
pub mod render;
pub mod text;
pub mod validate;
