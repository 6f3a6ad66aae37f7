//! Reply normalisation: turn free-form model output into candidate JSON text.
//!
//! Models asked for "only JSON" still answer with ` ```json ` fences, a
//! sentence of preamble, or both. Normalisation is a two-stage transform:
//!
//! 1. [`strip_fences`] removes code-fence markers at the start of any line
//!    (optionally tagged `json`), then trims backticks and whitespace from
//!    both ends.
//! 2. [`brace_span`] selects the largest brace-delimited span, from the first
//!    `{` to the last `}`, across newlines.
//!
//! If stage 2 finds no span the whole stage-1 output is the candidate.
//! Parsing happens once, in [`parse_candidate`]; there is no repair of
//! malformed JSON.

use crate::error::Pdf2FormError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

// ── Stage 1: Strip code fences ───────────────────────────────────────────────

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^```(?:json)?").unwrap());

/// Remove fence markers and surrounding backticks/whitespace.
pub fn strip_fences(raw: &str) -> String {
    let without_fences = RE_FENCE.replace_all(raw, "");
    without_fences
        .trim_matches(|c: char| c == '`' || c.is_whitespace())
        .to_string()
}

// ── Stage 2: Greedy brace span ───────────────────────────────────────────────

static RE_BRACE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// The substring from the first `{` to the last `}`, if both exist in that order.
pub fn brace_span(text: &str) -> Option<&str> {
    RE_BRACE_SPAN.find(text).map(|m| m.as_str())
}

/// Run both stages and return the candidate JSON text.
pub fn normalize_reply(raw: &str) -> String {
    let cleaned = strip_fences(raw);
    match brace_span(&cleaned) {
        Some(span) => span.to_string(),
        None => cleaned,
    }
}

/// Parse the candidate as a JSON object.
///
/// Any parse failure, or a valid JSON value that is not an object, is a
/// [`Pdf2FormError::MalformedResponse`] carrying the candidate text.
pub fn parse_candidate(candidate: &str) -> Result<Map<String, Value>, Pdf2FormError> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Pdf2FormError::MalformedResponse {
            candidate: candidate.to_string(),
            detail: format!("expected a JSON object, got {}", json_type_name(&other)),
        }),
        Err(e) => Err(Pdf2FormError::MalformedResponse {
            candidate: candidate.to_string(),
            detail: e.to_string(),
        }),
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
