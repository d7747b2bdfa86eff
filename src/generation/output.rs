use serde_json::{json, Value};

/// Provider output after an attempt to read it as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredOutput {
    Json(Value),
    /// The text did not parse; it is kept verbatim.
    Raw(String),
}

impl StructuredOutput {
    pub fn is_raw(&self) -> bool {
        matches!(self, StructuredOutput::Raw(_))
    }

    /// The stored form: parsed JSON as is, anything else as `{ "raw": text }`.
    pub fn into_value(self) -> Value {
        match self {
            StructuredOutput::Json(value) => value,
            StructuredOutput::Raw(text) => json!({ "raw": text }),
        }
    }
}

/// Parses provider output as JSON, falling back to the raw text so nothing
/// is lost when the model ignores the requested format.
pub fn parse_structured(text: &str) -> StructuredOutput {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => StructuredOutput::Json(value),
        Err(_) => StructuredOutput::Raw(text.to_string()),
    }
}

/// Removes Markdown code fence markers (```` ```html ```` and ```` ``` ````),
/// each with an optional trailing newline, then trims.
pub fn strip_code_fences(text: &str) -> String {
    let without_lang = remove_marker(text, "```html");
    remove_marker(&without_lang, "```").trim().to_string()
}

fn remove_marker(text: &str, marker: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(marker) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + marker.len()..];
        if let Some(stripped) = rest.strip_prefix('\n') {
            rest = stripped;
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_json_is_kept_as_structure() {
        let parsed = parse_structured(r#"{"description": "ok", "advantages": ["a"]}"#);
        assert!(!parsed.is_raw());
        let value = parsed.into_value();
        assert_eq!(value["advantages"][0], "a");
        assert!(value.get("raw").is_none());
    }

    #[test]
    fn json_with_a_raw_field_is_not_a_fallback() {
        let parsed = parse_structured(r#"{"raw": "spec sheet", "price": "99"}"#);
        assert!(!parsed.is_raw());
        assert_eq!(parsed.into_value(), json!({ "raw": "spec sheet", "price": "99" }));
    }

    #[test]
    fn prose_is_wrapped_as_raw() {
        let text = "Here is the research:\n{\"a\": 1}";
        let parsed = parse_structured(text);
        assert!(parsed.is_raw());
        assert_eq!(parsed.into_value(), json!({ "raw": text }));
    }

    #[test]
    fn empty_output_is_wrapped_as_raw() {
        let parsed = parse_structured("");
        assert_eq!(parsed, StructuredOutput::Raw(String::new()));
        assert_eq!(parsed.into_value(), json!({ "raw": "" }));
    }

    #[test]
    fn fences_are_removed() {
        let text = "```html\n<h1>Title</h1>\n<p>Body</p>\n```\n";
        assert_eq!(strip_code_fences(text), "<h1>Title</h1>\n<p>Body</p>");
    }

    #[test]
    fn unfenced_html_is_only_trimmed() {
        assert_eq!(strip_code_fences("  <h1>A</h1>  "), "<h1>A</h1>");
    }
}
