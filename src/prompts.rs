//! The field-extraction prompt.
//!
//! The prompt is sent as a single user message with no system message. It
//! lists every field of [`crate::fields::FieldKey`] twice: once as a human
//! description for the model to look for, and once as the exact JSON key set
//! it must answer with.
//!
//! Callers can override the wording via
//! [`crate::config::ExtractionConfig::prompt_template`]; the override must
//! contain a `{text}` placeholder where the document text goes.

use crate::fields::FieldKey;

/// Default instruction prompt. `{fields}`, `{keys}` and `{text}` are filled
/// in by [`build_extraction_prompt`].
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"Extract the following information from the car sales document:
{fields}

Format the output as a single JSON object with exactly these keys:
{keys}.

Rules:
- Every value must be a string.
- If a field cannot be found in the document, use the value "missing".
- Output ONLY the JSON object. Do not add commentary or explanations.

Text:
{text}"#;

/// Build the prompt for one document.
///
/// `template` defaults to [`DEFAULT_EXTRACTION_PROMPT`]. The document text is
/// substituted last so that placeholder-like sequences inside the document
/// are left untouched.
pub fn build_extraction_prompt(text: &str, template: Option<&str>) -> String {
    let template = template.unwrap_or(DEFAULT_EXTRACTION_PROMPT);
    template
        .replace("{fields}", &field_list())
        .replace("{keys}", &key_list())
        .replace("{text}", text)
}

fn field_list() -> String {
    FieldKey::ALL
        .iter()
        .map(|k| format!("- {}", k.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn key_list() -> String {
    FieldKey::ALL
        .iter()
        .map(|k| k.json_key())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_key() {
        let prompt = build_extraction_prompt("BILL OF SALE", None);
        for key in FieldKey::ALL {
            assert!(prompt.contains(key.json_key()), "missing key {key}");
            assert!(prompt.contains(key.description()));
        }
        assert!(prompt.ends_with("BILL OF SALE"));
    }

    #[test]
    fn document_text_is_not_reinterpreted() {
        let prompt = build_extraction_prompt("literal {keys} in document", None);
        assert!(prompt.contains("literal {keys} in document"));
    }

    #[test]
    fn custom_template() {
        let prompt = build_extraction_prompt("doc", Some("Keys: {keys}\n---\n{text}"));
        assert!(prompt.starts_with("Keys: seller_name, seller_address"));
        assert!(prompt.ends_with("---\ndoc"));
    }
}
