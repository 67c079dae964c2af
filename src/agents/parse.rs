//! Structured-output parsing for model completions.
//!
//! Completions are expected to be a single JSON object, but providers often
//! wrap it in prose ("Here is the JSON:") or markdown fences. Parsing is two
//! tiers: the trimmed text as a whole, then the first balanced object span.
//! The parsed value is then validated against the caller's schema.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{PipelineError, PipelineResult};

/// Parse a completion into `T`, tolerating text around the JSON object.
///
/// Fails with [`PipelineError::MalformedOutput`] carrying the full raw text.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> PipelineResult<T> {
    let value = locate_object(raw).ok_or_else(|| PipelineError::MalformedOutput {
        raw_output: raw.to_string(),
        reason: "No valid JSON object found in model output".to_string(),
    })?;

    serde_json::from_value(value).map_err(|e| PipelineError::MalformedOutput {
        raw_output: raw.to_string(),
        reason: format!("Output did not match expected shape: {}", e),
    })
}

/// Find the JSON object in `raw`, if any.
fn locate_object(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('{')?;

    if let Some(end) = balanced_object_end(trimmed, start) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str(&trimmed[start..=end]) {
            return Some(value);
        }
    }

    // Outermost span: first '{' to last '}'. Covers objects whose string
    // contents confuse the depth scan (e.g. unescaped quotes in prose).
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&trimmed[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Byte index of the brace closing the object opened at `start`.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Tagged {
        name: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    fn tagged(name: &str, tags: &[&str]) -> Tagged {
        Tagged {
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_parses_bare_object() {
        let parsed: Tagged = parse_structured(r#"{"name": "a", "tags": ["x"]}"#).unwrap();
        assert_eq!(parsed, tagged("a", &["x"]));
    }

    #[test]
    fn test_parses_object_with_whitespace() {
        let parsed: Tagged = parse_structured("  \n {\"name\": \"a\"} \n ").unwrap();
        assert_eq!(parsed, tagged("a", &[]));
    }

    #[test]
    fn test_wrapped_object_parses_identically() {
        let object = r#"{"name": "churn", "tags": ["sales", "q4"]}"#;
        let bare: Tagged = parse_structured(object).unwrap();
        let wrapped: Tagged =
            parse_structured(&format!("Here is the JSON:\n{object}\nLet me know!")).unwrap();
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn test_parses_markdown_fenced_object() {
        let raw = "```json\n{\"name\": \"fenced\"}\n```";
        let parsed: Tagged = parse_structured(raw).unwrap();
        assert_eq!(parsed.name, "fenced");
    }

    #[test]
    fn test_braces_inside_strings_do_not_end_span() {
        let raw = r#"Result: {"name": "a } tricky { value", "tags": []} trailing"#;
        let parsed: Tagged = parse_structured(raw).unwrap();
        assert_eq!(parsed.name, "a } tricky { value");
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let raw = r#"ok {"name": "say \"hi\" {now}"} done"#;
        let parsed: Tagged = parse_structured(raw).unwrap();
        assert_eq!(parsed.name, r#"say "hi" {now}"#);
    }

    #[test]
    fn test_first_object_wins_over_later_braces() {
        let raw = r#"{"name": "first"} and a note {see appendix}"#;
        let parsed: Tagged = parse_structured(raw).unwrap();
        assert_eq!(parsed.name, "first");
    }

    #[test]
    fn test_no_object_is_malformed_output() {
        let raw = "I could not find any factors in this report.";
        let err = parse_structured::<Tagged>(raw).unwrap_err();
        match err {
            PipelineError::MalformedOutput { raw_output, reason } => {
                assert_eq!(raw_output, raw);
                assert!(reason.contains("No valid JSON object"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_object_is_malformed_output() {
        let err = parse_structured::<Tagged>(r#"{"name": "a""#).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedOutput { .. }));
    }

    #[test]
    fn test_object_inside_top_level_array_is_found() {
        let parsed = parse_structured::<Tagged>(r#"[{"name": "a"}]"#).unwrap();
        assert_eq!(parsed.name, "a");
    }

    #[test]
    fn test_shape_mismatch_is_malformed_output() {
        let err = parse_structured::<Tagged>(r#"{"title": "x"}"#).unwrap_err();
        match err {
            PipelineError::MalformedOutput { reason, .. } => {
                assert!(reason.contains("expected shape"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_balanced_object_end_handles_nesting() {
        let text = r#"{"a": {"b": {}}} tail"#;
        assert_eq!(balanced_object_end(text, 0), Some(15));
    }
}
