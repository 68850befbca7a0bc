//! Response normalizer: isolate the JSON payload substring from noisy text.
//!
//! Purely textual. Resilient to prose before/after the payload and to the
//! backend wrapping its output in Markdown code fences.

use contentagent_shared::{ContentAgentError, PayloadKind, Result};
use tracing::debug;

/// Markdown code fence marker.
const FENCE: &str = "```";

/// Fence markers removed after segment selection, longest first.
const FENCE_MARKERS: [&str; 3] = ["```json", "```JSON", "```"];

/// Isolate the payload of `raw` for a task expecting `kind`.
///
/// 1. If fenced, prefer the first fence segment containing the opening delimiter
/// 2. Strip remaining fence markers
/// 3. Slice from the first opener to the last closer (or to end of text)
/// 4. Collapse whitespace runs to single spaces and trim
pub fn normalize(raw: &str, kind: PayloadKind) -> Result<String> {
    let (open, _) = kind.delimiters();

    let segment = select_fenced_segment(raw, open);
    let unfenced = strip_fences(segment);
    let span = delimited_span(&unfenced, kind).ok_or(ContentAgentError::NoStructuralDelimiter)?;
    let normalized = collapse_whitespace(span);

    debug!(
        raw_len = raw.len(),
        normalized_len = normalized.len(),
        "normalized response"
    );

    Ok(normalized)
}

/// Pick the fence segment holding the payload; the whole text when unfenced.
fn select_fenced_segment(raw: &str, open: char) -> &str {
    if !raw.contains(FENCE) {
        return raw;
    }

    raw.split(FENCE)
        .find(|part| part.contains(open))
        .or_else(|| raw.split(FENCE).find(|part| part.contains(['{', '['])))
        .unwrap_or(raw)
}

fn strip_fences(text: &str) -> String {
    FENCE_MARKERS
        .iter()
        .fold(text.to_string(), |acc, marker| acc.replace(marker, ""))
}

/// Outermost `open`…`close` span. A missing closer keeps the tail so the
/// decoder can report where the payload was cut off.
fn delimited_span(text: &str, kind: PayloadKind) -> Option<&str> {
    let (open, close) = kind.delimiters();
    let start = text.find(open)?;

    match text.rfind(close) {
        Some(end) if end > start => Some(&text[start..=end]),
        _ => Some(&text[start..]),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJECT: PayloadKind = PayloadKind::Object;
    const LIST: PayloadKind = PayloadKind::List { exact_len: None };

    #[test]
    fn plain_object_passes_through() {
        let out = normalize(r#"{"a": 1}"#, OBJECT).unwrap();
        assert_eq!(out, r#"{"a": 1}"#);
    }

    #[test]
    fn newlines_are_collapsed() {
        let raw = "{\n  \"a\": [\n    \"x\",\n    \"y\"\n  ]\n}";
        let out = normalize(raw, OBJECT).unwrap();
        assert_eq!(out, r#"{ "a": [ "x", "y" ] }"#);
    }

    #[test]
    fn fenced_json_block_is_extracted() {
        let raw = "Here is your analysis:\n\n```json\n{\"a\": 1}\n```\n\nLet me know!";
        let out = normalize(raw, OBJECT).unwrap();
        assert_eq!(out, r#"{"a": 1}"#);
    }

    #[test]
    fn bare_fence_without_language_tag() {
        let raw = "```\n[{\"month\": \"Month 1\"}]\n```";
        let out = normalize(raw, LIST).unwrap();
        assert_eq!(out, r#"[{"month": "Month 1"}]"#);
    }

    #[test]
    fn surrounding_prose_is_dropped() {
        let raw = "Sure! {\"a\": {\"b\": 2}} Hope this helps.";
        let out = normalize(raw, OBJECT).unwrap();
        assert_eq!(out, r#"{"a": {"b": 2}}"#);
    }

    #[test]
    fn list_payload_keeps_brackets() {
        let raw = "Themes:\n[\n {\"theme\": \"A\"},\n {\"theme\": \"B\"}\n]\nDone.";
        let out = normalize(raw, LIST).unwrap();
        assert_eq!(out, r#"[ {"theme": "A"}, {"theme": "B"} ]"#);
    }

    #[test]
    fn prose_brackets_before_fence_do_not_win() {
        let raw = "Result [draft]:\n```json\n{\"a\": 1}\n```";
        let out = normalize(raw, OBJECT).unwrap();
        assert_eq!(out, r#"{"a": 1}"#);
    }

    #[test]
    fn no_opening_delimiter_fails() {
        let err = normalize("Sorry, I cannot help with that.", OBJECT).unwrap_err();
        assert!(matches!(err, ContentAgentError::NoStructuralDelimiter));
    }

    #[test]
    fn object_task_ignores_brackets_only_text() {
        let err = normalize("[1, 2, 3]", OBJECT).unwrap_err();
        assert!(matches!(err, ContentAgentError::NoStructuralDelimiter));
    }

    #[test]
    fn truncated_payload_keeps_tail() {
        let out = normalize("{\"a\": [1, 2", OBJECT).unwrap();
        assert_eq!(out, r#"{"a": [1, 2"#);
        assert!(!out.is_empty());
    }
}
