//! Degenerate-extraction check.
//!
//! A coarse document-level gate, not per-field validation: a reply passes as
//! long as one value carries something other than blank text or the missing
//! marker. Partial extractions always pass.

use crate::error::Pdf2FormError;
use crate::fields::{coerce_to_string, MISSING_MARKER};
use serde_json::{Map, Value};
use tracing::debug;

/// True when a value carries no usable information.
///
/// The value is coerced to a string, trimmed and lowercased; it is unusable
/// when empty or when it contains `missing` anywhere. Trimming and treating
/// `null` as empty are stricter than a plain string coercion would be.
pub fn is_unusable(value: &Value) -> bool {
    let s = coerce_to_string(value).trim().to_lowercase();
    s.is_empty() || s.contains(MISSING_MARKER)
}

/// Reject a parsed reply whose every value is unusable.
///
/// An empty object is degenerate as well.
pub fn validate_fields(object: &Map<String, Value>) -> Result<(), Pdf2FormError> {
    let usable = object.values().filter(|v| !is_unusable(v)).count();
    debug!("{}/{} reply values usable", usable, object.len());
    if usable == 0 {
        return Err(Pdf2FormError::DegenerateExtraction);
    }
    Ok(())
}
