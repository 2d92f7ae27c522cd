//! JSON extraction from free-form model output
//!
//! Models wrap JSON in prose or code fences. These helpers try a direct
//! parse, then the slice from the first `[` to the last `]`, and never
//! return an error: unusable output is simply empty.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// The JSON array in `text`, or `None` when there is no parseable array
pub fn parse_json_array(text: &str) -> Option<Vec<Value>> {
    let text = text.trim();
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
        return Some(items);
    }

    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if start >= end {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// The JSON array in `text`, or an empty list
pub fn extract_json_array(text: &str) -> Vec<Value> {
    parse_json_array(text).unwrap_or_default()
}

/// Deserialize each element, skipping the ones that do not fit `T`
pub fn parse_items<T: DeserializeOwned>(values: Vec<Value>) -> Vec<T> {
    let total = values.len();
    let items: Vec<T> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if items.len() < total {
        tracing::debug!(total, kept = items.len(), "Skipped malformed AI array entries");
    }
    items
}

/// Shorten model output for log lines
pub fn truncate_for_log(text: &str) -> String {
    const LIMIT: usize = 200;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::AiTransactionItem;

    #[test]
    fn test_direct_array() {
        assert_eq!(extract_json_array("[1, 2, 3]").len(), 3);
    }

    #[test]
    fn test_array_inside_prose_and_fences() {
        let text = "Here you go:\n```json\n[{\"description\": \"Kopi\", \"amount\": 18000}]\n```";
        let items = extract_json_array(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["amount"], 18000);
    }

    #[test]
    fn test_unusable_output_is_empty() {
        assert!(parse_json_array("no json here").is_none());
        assert!(parse_json_array("] backwards [").is_none());
        assert!(parse_json_array("[not, valid").is_none());
        assert!(parse_json_array("{\"a\": 1}").is_none());
        assert!(extract_json_array("").is_empty());
    }

    #[test]
    fn test_parse_items_skips_bad_entries() {
        let values = extract_json_array(
            r#"[{"description": "Kopi", "amount": 18000}, {"amount": 5}, "junk"]"#,
        );
        let items: Vec<AiTransactionItem> = parse_items(values);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Kopi");
    }

    #[test]
    fn test_truncate_for_log() {
        let long = "x".repeat(300);
        assert_eq!(truncate_for_log(&long).len(), 203);
        assert_eq!(truncate_for_log("short"), "short");
    }
}
