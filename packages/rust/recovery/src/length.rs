//! Content-length normalization for decoded calendar entries.

use serde_json::Value;
use tracing::debug;

/// Lower bound for any estimated content length.
pub const MIN_LENGTH: i64 = 500;

/// Upper bound for any estimated content length.
pub const MAX_LENGTH: i64 = 3000;

/// Category defaults, matched in order against the lowercased type label.
const CATEGORY_DEFAULTS: [(&str, i64); 3] = [("video", 800), ("guide", 2000), ("case study", 1500)];

/// Default for labels matching no category (blog posts and the like).
const FALLBACK_LENGTH: i64 = 1200;

/// Where to find the length field and the content-type label in each item.
///
/// Both are JSON pointers relative to one item; the policy is applied to
/// every element of an array, or to the value itself otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthPolicy {
    pub length_pointer: String,
    pub label_pointer: String,
}

impl Default for LengthPolicy {
    fn default() -> Self {
        Self {
            length_pointer: "/main_content/estimated_word_count".into(),
            label_pointer: "/main_content/type".into(),
        }
    }
}

impl LengthPolicy {
    /// Fill missing/non-integer lengths with a category default, then clamp.
    pub fn apply(&self, value: &mut Value) {
        match value {
            Value::Array(items) => items.iter_mut().for_each(|item| self.apply_one(item)),
            other => self.apply_one(other),
        }
    }

    fn apply_one(&self, item: &mut Value) {
        let label = item
            .pointer(&self.label_pointer)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let (parent, key) = split_pointer(&self.length_pointer);
        let Some(container) = item.pointer_mut(parent).and_then(Value::as_object_mut) else {
            debug!(pointer = %self.length_pointer, "no length container, skipping item");
            return;
        };

        // Integers beyond i64 only fit as u64, and clamp to the upper bound.
        let current = container
            .get(&key)
            .and_then(|v| v.as_i64().or_else(|| v.as_u64().map(|_| MAX_LENGTH)));
        let length = clamp_length(current.unwrap_or_else(|| default_length_for(&label)));

        if current != Some(length) {
            debug!(?current, length, %label, "normalized content length");
        }
        container.insert(key, Value::from(length));
    }
}

/// Category default for a free-text content-type label (case-insensitive).
pub fn default_length_for(label: &str) -> i64 {
    let label = label.to_lowercase();
    CATEGORY_DEFAULTS
        .iter()
        .find(|(needle, _)| label.contains(needle))
        .map(|(_, length)| *length)
        .unwrap_or(FALLBACK_LENGTH)
}

/// Clamp into the inclusive range [`MIN_LENGTH`, `MAX_LENGTH`].
pub fn clamp_length(length: i64) -> i64 {
    length.clamp(MIN_LENGTH, MAX_LENGTH)
}

/// Split a JSON pointer into its parent pointer and unescaped last token.
fn split_pointer(pointer: &str) -> (&str, String) {
    match pointer.rfind('/') {
        Some(i) => (
            &pointer[..i],
            pointer[i + 1..].replace("~1", "/").replace("~0", "~"),
        ),
        None => ("", pointer.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn week(kind: &str, count: Value) -> Value {
        json!({"week": "Week 1", "main_content": {"type": kind, "estimated_word_count": count}})
    }

    fn length_of(value: &Value) -> i64 {
        value["main_content"]["estimated_word_count"].as_i64().unwrap()
    }

    #[test]
    fn absent_length_on_guide_resolves_to_2000() {
        let mut value = json!({"main_content": {"type": "Ultimate Guide"}});
        LengthPolicy::default().apply(&mut value);
        assert_eq!(length_of(&value), 2000);
    }

    #[test]
    fn small_and_large_values_are_clamped() {
        let mut small = week("Blog", json!(10));
        let mut large = week("Blog", json!(50000));
        LengthPolicy::default().apply(&mut small);
        LengthPolicy::default().apply(&mut large);
        assert_eq!(length_of(&small), 500);
        assert_eq!(length_of(&large), 3000);
    }

    #[test]
    fn non_integer_lengths_get_category_defaults() {
        let mut items = json!([
            week("Video", json!("about 900")),
            week("Case Study", json!(null)),
            week("Blog Post", json!(1250.5)),
            week("YouTube VIDEO guide", json!(null)),
        ]);
        LengthPolicy::default().apply(&mut items);
        let lengths: Vec<i64> = items.as_array().unwrap().iter().map(length_of).collect();
        // "video" is matched before "guide".
        assert_eq!(lengths, vec![800, 1500, 1200, 800]);
    }

    #[test]
    fn integer_beyond_i64_is_clamped_not_defaulted() {
        let mut value = week("Blog", json!(u64::MAX));
        LengthPolicy::default().apply(&mut value);
        assert_eq!(length_of(&value), MAX_LENGTH);
    }

    #[test]
    fn in_range_value_is_kept() {
        let mut value = week("Guide", json!(1750));
        LengthPolicy::default().apply(&mut value);
        assert_eq!(length_of(&value), 1750);
    }

    #[test]
    fn missing_label_uses_fallback() {
        let mut value = json!({"main_content": {}});
        LengthPolicy::default().apply(&mut value);
        assert_eq!(length_of(&value), 1200);
    }

    #[test]
    fn items_without_container_are_left_alone() {
        let mut value = json!({"week": "Week 3"});
        LengthPolicy::default().apply(&mut value);
        assert_eq!(value, json!({"week": "Week 3"}));
    }

    #[test]
    fn default_lookup_is_case_insensitive() {
        assert_eq!(default_length_for("GUIDE"), 2000);
        assert_eq!(default_length_for("case STUDY"), 1500);
        assert_eq!(default_length_for(""), 1200);
    }

    #[test]
    fn split_pointer_unescapes_last_token() {
        assert_eq!(split_pointer("/a/b~1c"), ("/a", "b/c".to_string()));
        assert_eq!(split_pointer("/top"), ("", "top".to_string()));
    }
}
