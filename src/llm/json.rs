//! Structured-data extraction for LLM responses.
//!
//! LLM providers often return JSON wrapped in markdown code blocks or
//! surrounded by conversational text. Extraction never fails hard: when no
//! candidate parses, the caller gets a diagnostic value describing why, so a
//! degraded answer can still be shown to the reviewer.

use serde::Serialize;
use serde_json::{Value, json};

/// Error label carried by the diagnostic value.
pub const INVALID_STRUCTURED_DATA: &str = "Invalid structured data";

/// Outcome of [`extract_structured`]: the parsed value, or a diagnostic object
/// when `ok` is false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub value: Value,
    pub ok: bool,
}

impl Extraction {
    fn parsed(value: Value) -> Self {
        Self { value, ok: true }
    }

    fn failed(details: String) -> Self {
        Self {
            value: json!({ "error": INVALID_STRUCTURED_DATA, "details": details }),
            ok: false,
        }
    }

    /// Pretty JSON rendering of the value, as shown to the reviewer.
    pub fn as_text(&self) -> String {
        serde_json::to_string_pretty(&self.value).unwrap_or_else(|_| self.value.to_string())
    }
}

/// Extract a JSON array or object from free-form model text.
///
/// Tries, in order:
/// 1. The body of a ` ```json ` fenced block (or a bare fence whose body
///    starts with `[` or `{`); an unterminated fence runs to the end of text
/// 2. The greedy outer span from the first `[`/`{` to the last matching
///    closer, then the balanced span starting at that same opener
/// 3. The whole trimmed text
///
/// The first candidate that parses wins. If none does, the parse error of the
/// highest-priority candidate is reported in the diagnostic value.
pub fn extract_structured(raw: &str) -> Extraction {
    let trimmed = raw.trim();
    let mut first_error: Option<String> = None;

    for candidate in candidates(trimmed) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return Extraction::parsed(value),
            Err(e) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    Extraction::failed(first_error.unwrap_or_else(|| "no candidate found".to_string()))
}

/// Ordered, deduplicated list of spans worth parsing.
fn candidates(text: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();

    let fenced = fenced_block(text);
    if let Some(body) = fenced {
        out.push(body);
    }

    let scope = fenced.unwrap_or(text);
    if let Some(span) = greedy_outer_span(scope) {
        out.push(span);
    }
    if let Some(span) = balanced_span(scope) {
        out.push(span);
    }
    if fenced.is_some() {
        if let Some(span) = greedy_outer_span(text) {
            out.push(span);
        }
        if let Some(span) = balanced_span(text) {
            out.push(span);
        }
    }
    out.push(text);

    out.dedup();
    out
}

/// Body of the first fenced code block labelled `json`, or of a bare fence
/// whose body looks structured.
fn fenced_block(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let body = &text[start + 7..];
        let body = match body.find("```") {
            Some(end) => &body[..end],
            None => body,
        };
        return Some(body.trim());
    }

    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        // Skip an optional language tag on the fence line.
        let rest = match rest.find('\n') {
            Some(nl) if !rest[..nl].trim_start().starts_with(['[', '{']) => &rest[nl + 1..],
            _ => rest,
        };
        let body = match rest.find("```") {
            Some(end) => &rest[..end],
            None => rest,
        };
        let body = body.trim();
        if body.starts_with(['[', '{']) {
            return Some(body);
        }
    }

    None
}

/// Index and kind of the first opening bracket in `text`.
fn first_opener(text: &str) -> Option<(usize, char)> {
    text.char_indices().find(|(_, ch)| matches!(ch, '[' | '{'))
}

const fn closer_for(opener: char) -> char {
    if opener == '[' { ']' } else { '}' }
}

/// From the first `[`/`{` through the last closer of the same kind.
fn greedy_outer_span(text: &str) -> Option<&str> {
    let (start, opener) = first_opener(text)?;
    let end = text.rfind(closer_for(opener))?;
    (end > start).then(|| &text[start..=end])
}

/// Balanced span starting at the first `[`/`{`.
///
/// Tracks bracket depth while respecting JSON string literals (including
/// escaped characters), so `{"msg": "use { and ] carefully"}` is handled
/// correctly.
fn balanced_span(text: &str) -> Option<&str> {
    let (start, _) = first_opener(text)?;
    let candidate = &text[start..];

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in candidate.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '[' | '{' if !in_string => depth += 1,
            ']' | '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&candidate[..=idx]);
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

    #[test]
    fn test_extract_from_json_fence() {
        let response = "Here's the JSON:\n```json\n[\"a\", \"b\"]\n```";
        let extraction = extract_structured(response);
        assert!(extraction.ok);
        assert_eq!(extraction.value, json!(["a", "b"]));
    }

    #[test]
    fn test_extract_from_unterminated_fence() {
        let response = "```json\n{\"entries\": []}";
        let extraction = extract_structured(response);
        assert!(extraction.ok);
        assert_eq!(extraction.value, json!({"entries": []}));
    }

    #[test]
    fn test_extract_bare_code_block() {
        let response = "```\n{\"hotel_name\": \"Inn\"}\n```";
        let extraction = extract_structured(response);
        assert!(extraction.ok);
        assert_eq!(extraction.value["hotel_name"], "Inn");
    }

    #[test]
    fn test_extract_array_wrapped_in_prose() {
        let response = r#"Sure! The competitors are [{"hotel_name": "A"}, {"hotel_name": "B"}]. Hope this helps!"#;
        let extraction = extract_structured(response);
        assert!(extraction.ok);
        assert_eq!(extraction.value[1]["hotel_name"], "B");
    }

    #[test]
    fn test_extract_raw_json() {
        let extraction = extract_structured(r#"{"entries": []}"#);
        assert!(extraction.ok);
        assert!(extraction.value["entries"].is_array());
    }

    #[test]
    fn test_extract_deeply_nested_json() {
        let response = r#"Result: {"entries": [{"metadata": {"author": {"name": "John"}}}]} done"#;
        let extraction = extract_structured(response);
        assert_eq!(extraction.value["entries"][0]["metadata"]["author"]["name"], "John");
    }

    #[test]
    fn test_multiple_arrays_pick_first() {
        let response = "first [1, 2] then [3, 4]";
        let extraction = extract_structured(response);
        assert!(extraction.ok);
        assert_eq!(extraction.value, json!([1, 2]));
    }

    #[test]
    fn test_no_json_yields_diagnostic() {
        let extraction = extract_structured("no json here");
        assert!(!extraction.ok);
        assert_eq!(extraction.value["error"], INVALID_STRUCTURED_DATA);
        assert!(extraction.value["details"].as_str().unwrap().contains("expected"));
    }

    #[test]
    fn test_empty_and_truncated_input() {
        assert!(!extract_structured("").ok);
        assert!(!extract_structured("   ").ok);
        assert!(!extract_structured(r#"[{"hotel_name": "A""#).ok);
        assert!(!extract_structured("}}").ok);
        assert!(!extract_structured("```json\n```").ok);
    }

    #[test]
    fn test_multibyte_text_does_not_panic() {
        let extraction = extract_structured("価格は {\"price\": 120} です");
        assert!(extraction.ok);
        assert_eq!(extraction.value["price"], 120);
    }

    #[test]
    fn test_extraction_is_idempotent_on_clean_text() {
        let first = extract_structured(r#"prose [{"date": "2025-07-01", "n": 3}] prose"#);
        let second = extract_structured(&first.as_text());
        assert_eq!(first.value, second.value);
        assert!(second.ok);
    }

    #[test]
    fn test_balanced_span_ignores_brackets_in_strings() {
        let text = r#"x {"msg": "use { and ] carefully"} after }"#;
        assert_eq!(balanced_span(text), Some(r#"{"msg": "use { and ] carefully"}"#));
    }

    #[test]
    fn test_balanced_span_needs_opener() {
        assert_eq!(balanced_span("]] }}"), None);
        assert_eq!(greedy_outer_span("]] }}"), None);
    }
}
