//! Form rendering: substitute extracted fields into the HTML form.
//!
//! Field values come from a language model and are untrusted. askama escapes
//! every `{{ }}` expression in `.html` templates, so a value such as
//! `<script>` is rendered as text, never as markup.

use crate::error::Pdf2FormError;
use crate::fields::ExtractedFields;
use askama::Template;

/// One labelled line of the form.
#[derive(Debug)]
struct FormRow<'a> {
    key: &'static str,
    label: &'static str,
    value: &'a str,
}

#[derive(Template)]
#[template(path = "form.html")]
struct FormTemplate<'a> {
    rows: Vec<FormRow<'a>>,
}

/// Render the state authority form, one row per field in form order.
///
/// Values are written as given; the caller applies the sale date override.
pub fn render_form(fields: &ExtractedFields) -> Result<String, Pdf2FormError> {
    let rows = fields
        .iter()
        .map(|(key, value)| FormRow {
            key: key.json_key(),
            label: key.label(),
            value: value.as_str(),
        })
        .collect();

    FormTemplate { rows }
        .render()
        .map_err(|e| Pdf2FormError::RenderFailed(e.to_string()))
}

/// The upload page, optionally showing a rendered form or an error.
#[derive(Template, Default)]
#[template(path = "index.html")]
pub struct PageTemplate {
    /// Pre-rendered (already escaped) form HTML.
    pub form_html: Option<String>,
    pub error: Option<String>,
    /// Candidate JSON shown under a parse error.
    pub raw_candidate: Option<String>,
}

impl PageTemplate {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn success(form_html: String) -> Self {
        Self {
            form_html: Some(form_html),
            ..Self::default()
        }
    }

    pub fn failure(err: &Pdf2FormError) -> Self {
        Self {
            form_html: None,
            error: Some(err.user_message()),
            raw_candidate: err.raw_candidate().map(str::to_string),
        }
    }

    pub fn render_page(&self) -> Result<String, Pdf2FormError> {
        self.render()
            .map_err(|e| Pdf2FormError::RenderFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PLACEHOLDER: &str = "PENDING-DATE";

    fn fields(v: serde_json::Value) -> ExtractedFields {
        ExtractedFields::from_json_object(v.as_object().unwrap())
    }

    #[test]
    fn renders_every_label() {
        let html = render_form(&fields(json!({"buyer_name": "Jane Doe"}))).unwrap();
        assert!(html.contains("State Authority Form"));
        assert!(html.contains("Buyer&#39;s Name") || html.contains("Buyer's Name"));
        assert!(html.contains("Jane Doe"));
        assert!(html.contains("Odometer Reading"));
    }

    #[test]
    fn overridden_sale_date_is_rendered() {
        let mut f = fields(json!({"sale_date": "2024-03-01", "vin": "1HGCM"}));
        f.override_sale_date(PLACEHOLDER);
        let html = render_form(&f).unwrap();
        assert!(html.contains(PLACEHOLDER));
        assert!(!html.contains("2024-03-01"));
    }

    #[test]
    fn values_are_escaped() {
        let html = render_form(&fields(json!({"buyer_name": "<script>alert(1)</script>"}))).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn page_shows_error_and_escaped_candidate() {
        let err = Pdf2FormError::MalformedResponse {
            candidate: "<b>not json".into(),
            detail: "expected value".into(),
        };
        let html = PageTemplate::failure(&err).render_page().unwrap();
        assert!(html.contains("not valid JSON"));
        assert!(html.contains("&lt;b&gt;not json"));
        assert!(!html.contains("Form generated successfully!"));
    }

    #[test]
    fn page_embeds_form_unescaped() {
        let form = render_form(&fields(json!({"vin": "1HGCM"}))).unwrap();
        let html = PageTemplate::success(form).render_page().unwrap();
        assert!(html.contains("Form generated successfully!"));
        assert!(html.contains("<section class=\"state-form\">"));
    }

    #[test]
    fn empty_page_has_upload_control() {
        let html = PageTemplate::empty().render_page().unwrap();
        assert!(html.contains("Upload Sales Document (PDF)"));
        assert!(html.contains("accept=\".pdf,application/pdf\""));
    }
}
