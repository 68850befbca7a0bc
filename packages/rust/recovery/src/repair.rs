//! Textual repair passes for malformed JSON payloads.
//!
//! Each pass is a function `&str -> String` that is idempotent and linear in
//! the input length. Passes that only make sense outside string literals run
//! over a segmentation of the text into code and string runs, so quoted
//! content is never rewritten.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// One deterministic repair, applied in [`RepairPass::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairPass {
    /// `"key"":` → `"key":`
    EmptyKeyCollapse,
    /// `"a" "b"` → `"a", "b"`
    MissingComma,
    /// `[1, 2,]` → `[1, 2]`
    TrailingSeparator,
    /// `"a": ,` → `"a": "",`
    MissingValue,
}

impl RepairPass {
    /// The fixed order the recovery parser applies passes in.
    pub const ORDER: [RepairPass; 4] = [
        Self::EmptyKeyCollapse,
        Self::MissingComma,
        Self::TrailingSeparator,
        Self::MissingValue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyKeyCollapse => "empty_key_collapse",
            Self::MissingComma => "missing_comma",
            Self::TrailingSeparator => "trailing_separator",
            Self::MissingValue => "missing_value",
        }
    }

    /// Apply this pass to `text`.
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::EmptyKeyCollapse => collapse_empty_keys(text),
            Self::MissingComma => insert_missing_commas(text),
            Self::TrailingSeparator => remove_trailing_separators(text),
            Self::MissingValue => fill_missing_values(text),
        }
    }
}

impl fmt::Display for RepairPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Segmentation
// ---------------------------------------------------------------------------

/// A run of text inside a string literal (quotes included) or outside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Code(&'a str),
    Str(&'a str),
}

/// Split `text` into alternating code and string-literal runs.
///
/// Honors backslash escapes. An unterminated literal runs to end of text.
fn segments(text: &str) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'"' {
            i += 1;
            continue;
        }

        if start < i {
            out.push(Segment::Code(&text[start..i]));
        }

        let open = i;
        i += 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    i += 1;
                    break;
                }
                _ => i += 1,
            }
        }

        let end = i.min(bytes.len());
        out.push(Segment::Str(&text[open..end]));
        start = end;
        i = end;
    }

    if start < bytes.len() {
        out.push(Segment::Code(&text[start..]));
    }

    out
}

/// Rewrite only the code runs of `text`, copying string literals verbatim.
fn map_code(text: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Code(code) => out.push_str(&f(code)),
            Segment::Str(lit) => out.push_str(lit),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Pass 1: Empty-key collapse
// ---------------------------------------------------------------------------

/// Collapse a doubled key terminator (`""` artifact before a colon) into one.
///
/// The artifact itself breaks string boundaries, so this pass is textual. A
/// quote run opening a key position (after `{`, `,` or at the start) is a
/// genuine empty key and stays as is.
fn collapse_empty_keys(text: &str) -> String {
    static DOUBLED_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#""{2,}:"#).expect("valid regex"));

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in DOUBLED_RE.find_iter(text) {
        let opens_key = matches!(
            text[..m.start()].trim_end().chars().next_back(),
            None | Some('{') | Some(',')
        );
        if opens_key {
            continue;
        }
        out.push_str(&text[last..m.start()]);
        out.push_str("\":");
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

// ---------------------------------------------------------------------------
// Pass 2: Missing comma
// ---------------------------------------------------------------------------

/// Insert `, ` where a finished value is directly followed by a string or
/// object opener with only whitespace in between.
///
/// Valid JSON never has that adjacency, so the pass cannot break valid text.
fn insert_missing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut after_value = false;

    for segment in segments(text) {
        match segment {
            Segment::Str(lit) => {
                if after_value {
                    push_separator(&mut out);
                }
                out.push_str(lit);
                after_value = true;
            }
            Segment::Code(code) => {
                for c in code.chars() {
                    if c.is_whitespace() {
                        out.push(c);
                        continue;
                    }
                    if c == '{' && after_value {
                        push_separator(&mut out);
                    }
                    out.push(c);
                    after_value = matches!(c, '}' | ']') || c.is_ascii_alphanumeric();
                }
            }
        }
    }

    out
}

/// Replace trailing whitespace in `out` with a `, ` separator.
fn push_separator(out: &mut String) {
    out.truncate(out.trim_end().len());
    out.push_str(", ");
}

// ---------------------------------------------------------------------------
// Pass 3: Trailing separator
// ---------------------------------------------------------------------------

/// Drop dangling commas right before `}` or `]`.
fn remove_trailing_separators(text: &str) -> String {
    static TRAILING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?:,\s*)+([}\]])").expect("valid regex"));

    map_code(text, |code| TRAILING_RE.replace_all(code, "$1").to_string())
}

// ---------------------------------------------------------------------------
// Pass 4: Missing value
// ---------------------------------------------------------------------------

/// Give a colon followed directly by a separator an explicit empty string.
fn fill_missing_values(text: &str) -> String {
    static EMPTY_VALUE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r":\s*([,}\]])").expect("valid regex"));

    map_code(text, |code| {
        EMPTY_VALUE_RE.replace_all(code, r#": ""$1"#).to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_idempotent(pass: RepairPass, input: &str) {
        let once = pass.apply(input);
        let twice = pass.apply(&once);
        assert_eq!(once, twice, "{pass} is not idempotent on {input:?}");
    }

    // --- segmentation ---

    #[test]
    fn segments_split_code_and_strings() {
        let segs = segments(r#"{"a": "b, c"}"#);
        assert_eq!(
            segs,
            vec![
                Segment::Code("{"),
                Segment::Str(r#""a""#),
                Segment::Code(": "),
                Segment::Str(r#""b, c""#),
                Segment::Code("}"),
            ]
        );
    }

    #[test]
    fn segments_honor_escaped_quotes() {
        let segs = segments(r#"["say \"hi\", ok"]"#);
        assert_eq!(segs[1], Segment::Str(r#""say \"hi\", ok""#));
        assert_eq!(segs.len(), 3);
    }

    #[test]
    fn segments_unterminated_string_runs_to_end() {
        let segs = segments(r#"{"a": "open"#);
        assert_eq!(segs.last(), Some(&Segment::Str(r#""open"#)));
    }

    #[test]
    fn segments_handle_multibyte_text() {
        let segs = segments(r#"{"café": "naïve"}"#);
        assert_eq!(segs[1], Segment::Str(r#""café""#));
        assert_eq!(segs[3], Segment::Str(r#""naïve""#));
    }

    // --- pass 1 ---

    #[test]
    fn empty_key_collapse_keeps_genuine_empty_keys() {
        let text = r#"{"": "x", "b": {"" : 1}}"#;
        assert_eq!(RepairPass::EmptyKeyCollapse.apply(text), text);
        assert_eq!(
            RepairPass::EmptyKeyCollapse.apply(r#"{"": "x", "title"": 1}"#),
            r#"{"": "x", "title": 1}"#
        );
    }

    #[test]
    fn empty_key_collapse_fixes_doubled_terminator() {
        let out = RepairPass::EmptyKeyCollapse.apply(r#"{"title"": "x"}"#);
        assert_eq!(out, r#"{"title": "x"}"#);
        assert_idempotent(RepairPass::EmptyKeyCollapse, r#"{"title""": "x"}"#);
    }

    // --- pass 2 ---

    #[test]
    fn missing_comma_between_array_strings() {
        let out = RepairPass::MissingComma.apply(r#"["a" "b" "c"]"#);
        assert_eq!(out, r#"["a", "b", "c"]"#);
    }

    #[test]
    fn missing_comma_between_members() {
        let out = RepairPass::MissingComma.apply(r#"{"a": 1 "b": true "c": "d"}"#);
        assert_eq!(out, r#"{"a": 1, "b": true, "c": "d"}"#);
    }

    #[test]
    fn missing_comma_between_objects() {
        let out = RepairPass::MissingComma.apply(r#"[{"a": 1} {"a": 2}]"#);
        assert_eq!(out, r#"[{"a": 1}, {"a": 2}]"#);
    }

    #[test]
    fn missing_comma_leaves_valid_json_alone() {
        let valid = r#"{"a": "", "b": ["x", "y"], "c": {"d": null}}"#;
        assert_eq!(RepairPass::MissingComma.apply(valid), valid);
        assert_idempotent(RepairPass::MissingComma, r#"["a" "b"]"#);
    }

    #[test]
    fn missing_comma_ignores_quoted_braces() {
        let text = r#"{"a": "x } { y"}"#;
        assert_eq!(RepairPass::MissingComma.apply(text), text);
    }

    // --- pass 3 ---

    #[test]
    fn trailing_separator_removed_before_closers() {
        let out = RepairPass::TrailingSeparator.apply(r#"{"a": [1, 2, ], "b": 3,}"#);
        assert_eq!(out, r#"{"a": [1, 2], "b": 3}"#);
        assert_idempotent(RepairPass::TrailingSeparator, r#"[1,,]"#);
    }

    #[test]
    fn trailing_separator_keeps_string_content() {
        let text = r#"{"a": "x, }"}"#;
        assert_eq!(RepairPass::TrailingSeparator.apply(text), text);
    }

    // --- pass 4 ---

    #[test]
    fn missing_value_becomes_empty_string() {
        let out = RepairPass::MissingValue.apply(r#"{"a": , "b": }"#);
        assert_eq!(out, r#"{"a": "", "b": ""}"#);
        assert_idempotent(RepairPass::MissingValue, r#"{"a":,"b":]"#);
    }

    #[test]
    fn missing_value_keeps_string_content() {
        let text = r#"{"time": "10:,30"}"#;
        assert_eq!(RepairPass::MissingValue.apply(text), text);
    }

    #[test]
    fn order_is_fixed() {
        assert_eq!(
            RepairPass::ORDER,
            [
                RepairPass::EmptyKeyCollapse,
                RepairPass::MissingComma,
                RepairPass::TrailingSeparator,
                RepairPass::MissingValue,
            ]
        );
    }
}
