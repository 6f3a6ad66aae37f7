//! Upload validation: accept only non-empty PDF bytes within the size limit.
//!
//! The browser's declared content type is checked first because it is the
//! cheapest signal, but it is not trusted on its own: the `%PDF` magic is
//! verified before the bytes ever reach pdfium, so a renamed text file gets a
//! meaningful error rather than a pdfium parse failure.

use crate::error::Pdf2FormError;
use tracing::debug;

/// The only content type accepted from the upload control.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A file as received from the upload control.
#[derive(Debug, Clone)]
pub struct Upload<'a> {
    pub bytes: &'a [u8],
    /// Content type declared by the client, if any.
    pub content_type: Option<&'a str>,
    /// Original file name, used only for logging.
    pub file_name: Option<&'a str>,
}

impl<'a> Upload<'a> {
    /// An upload with no client metadata (e.g. a file read from disk).
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            content_type: None,
            file_name: None,
        }
    }
}

/// Validate an upload before text extraction.
pub fn validate_upload(upload: &Upload<'_>, max_bytes: usize) -> Result<(), Pdf2FormError> {
    if let Some(ct) = upload.content_type {
        if !is_pdf_content_type(ct) {
            return Err(Pdf2FormError::UnsupportedContentType {
                content_type: ct.to_string(),
            });
        }
    }

    if upload.bytes.is_empty() {
        return Err(Pdf2FormError::EmptyUpload);
    }

    if upload.bytes.len() > max_bytes {
        debug!("Rejected upload of {} bytes", upload.bytes.len());
        return Err(Pdf2FormError::UploadTooLarge { limit: max_bytes });
    }

    if !upload.bytes.starts_with(b"%PDF") {
        let magic = upload.bytes.iter().take(4).copied().collect();
        return Err(Pdf2FormError::NotAPdf { magic });
    }

    debug!(
        "Accepted upload {} ({} bytes)",
        upload.file_name.unwrap_or("<unnamed>"),
        upload.bytes.len()
    );
    Ok(())
}

/// Accept `application/pdf`, ignoring case and parameters.
fn is_pdf_content_type(ct: &str) -> bool {
    ct.split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        .unwrap_or(false)
}
