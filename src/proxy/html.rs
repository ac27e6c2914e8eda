//! Extraction of a JSON document embedded as text inside an HTML response.
//!
//! The solver returns the upstream API body rendered by a real browser, so
//! the JSON the API produced ends up as a text node somewhere in an HTML
//! document (typically inside `<pre>` or `<body>`).

use scraper::{Html, Node};

use crate::error::MonitorError;

/// Returns the first text node, in document order, whose trimmed content
/// begins with `{` or `[`.
///
/// # Errors
///
/// Returns [`MonitorError::PayloadInvalid`] when no such node exists.
pub fn extract_embedded_json(html: &str) -> Result<String, MonitorError> {
    let document = Html::parse_document(html);

    for node in document.root_element().descendants() {
        if let Node::Text(text) = node.value() {
            let trimmed = text.trim();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                return Ok(trimmed.to_string());
            }
        }
    }

    Err(MonitorError::PayloadInvalid(
        "no embedded JSON document found in proxied response".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_pre_tag() {
        let html = r#"<html><head><title>t</title></head><body><pre>{"id": 75062, "slug": "x"}</pre></body></html>"#;
        let json = extract_embedded_json(html).expect("extract");
        assert_eq!(json, r#"{"id": 75062, "slug": "x"}"#);
    }

    #[test]
    fn extracts_array_payloads() {
        let html = "<body><div>  [1, 2, 3]  </div></body>";
        let json = extract_embedded_json(html).expect("extract");
        assert_eq!(json, "[1, 2, 3]");
    }

    #[test]
    fn returns_first_json_text_node_in_document_order() {
        let html = r#"<body><p>not json</p><span>{"first": true}</span><pre>{"second": true}</pre></body>"#;
        let json = extract_embedded_json(html).expect("extract");
        assert_eq!(json, r#"{"first": true}"#);
    }

    #[test]
    fn skips_non_json_text() {
        let html = "<body><h1>Access denied</h1><p>try again later</p></body>";
        assert!(matches!(
            extract_embedded_json(html),
            Err(MonitorError::PayloadInvalid(_))
        ));
    }

    #[test]
    fn tolerates_bare_json_without_markup() {
        // html5ever wraps stray text into a synthesised body
        let json = extract_embedded_json(r#"{"id": 1}"#).expect("extract");
        assert_eq!(json, r#"{"id": 1}"#);
    }
}
