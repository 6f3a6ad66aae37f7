//! PDF text extraction via pdfium's native text layer.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is CPU-bound while parsing. `tokio::task::spawn_blocking` moves
//! the work off the async worker threads so a large upload cannot stall the
//! web shell.
//!
//! Only the embedded text layer is read. Scanned documents with no text layer
//! produce an empty string, which the caller reports as
//! [`crate::error::Pdf2FormError::EmptyDocument`].

use crate::error::Pdf2FormError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Text pulled from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentText {
    /// Page texts joined with `\n`; pages without text are skipped.
    pub text: String,
    pub page_count: usize,
    /// Pages that contributed text.
    pub pages_with_text: usize,
}

/// Extract the concatenated text of every page.
pub async fn extract_text(
    bytes: Vec<u8>,
    pdfium_lib_path: Option<PathBuf>,
    password: Option<String>,
) -> Result<DocumentText, Pdf2FormError> {
    tokio::task::spawn_blocking(move || {
        extract_text_blocking(&bytes, pdfium_lib_path.as_deref(), password.as_deref())
    })
    .await
    .map_err(|e| Pdf2FormError::Internal(format!("Text extraction task panicked: {}", e)))?
}

/// Bind to pdfium, preferring an explicit library directory.
pub fn bind_pdfium(lib_dir: Option<&Path>) -> Result<Pdfium, Pdf2FormError> {
    let bindings = match lib_dir {
        Some(dir) => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Pdf2FormError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(
    bytes: &[u8],
    lib_dir: Option<&Path>,
    password: Option<&str>,
) -> Result<DocumentText, Pdf2FormError> {
    let pdfium = bind_pdfium(lib_dir)?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                Pdf2FormError::PasswordRequired
            } else {
                Pdf2FormError::CorruptPdf { detail: err_str }
            }
        })?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    info!("PDF loaded: {} pages", page_count);

    let page_texts = pages.iter().enumerate().map(|(idx, page)| {
        // A page whose text layer cannot be read contributes nothing.
        let text = page.text().map(|t| t.all()).unwrap_or_default();
        debug!("Page {}: {} chars", idx + 1, text.len());
        text
    });

    let (text, pages_with_text) = join_page_texts(page_texts);

    Ok(DocumentText {
        text,
        page_count,
        pages_with_text,
    })
}

/// Join page texts with `\n`, skipping pages that have no text.
///
/// Returns the joined text and the number of pages that contributed.
pub fn join_page_texts<I>(pages: I) -> (String, usize)
where
    I: IntoIterator<Item = String>,
{
    let kept: Vec<String> = pages
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .collect();
    let count = kept.len();
    (kept.join("\n"), count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_skips_empty_pages() {
        let pages = vec![
            "BILL OF SALE".to_string(),
            String::new(),
            "  \n ".to_string(),
            "Buyer: Jane Doe".to_string(),
        ];
        let (text, n) = join_page_texts(pages);
        assert_eq!(text, "BILL OF SALE\nBuyer: Jane Doe");
        assert_eq!(n, 2);
    }

    #[test]
    fn test_join_all_empty() {
        let (text, n) = join_page_texts(vec![String::new(), String::new()]);
        assert!(text.is_empty());
        assert_eq!(n, 0);
    }

    #[test]
    fn test_bind_to_missing_directory_fails() {
        let err = bind_pdfium(Some(Path::new("/nonexistent/pdfium-dir")))
            .err()
            .expect("binding to a missing directory must fail");
        assert!(matches!(err, Pdf2FormError::PdfiumBindingFailed(_)));
    }
}
