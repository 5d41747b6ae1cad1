//! JSON object extraction from free-form model text.
//!
//! Model responses wrap the requested JSON in prose, code fences, or
//! multiple candidate objects. The extraction rule is deterministic:
//!
//! 1. Strict-parse the whole response; accept it if it is an object
//!    containing every required key.
//! 2. Otherwise scan left-to-right for balanced-brace substrings (string
//!    and escape aware) and attempt each candidate in order, keeping the
//!    first that parses to an object with all required keys.

use serde_json::Value;

/// Extract the first JSON object from `text` that contains all of
/// `required_keys` at the top level.
pub fn extract_object(text: &str, required_keys: &[&str]) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if has_keys(&value, required_keys) {
            return Some(value);
        }
    }

    for candidate in candidates(text) {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            if has_keys(&value, required_keys) {
                return Some(value);
            }
        }
    }

    None
}

fn has_keys(value: &Value, required_keys: &[&str]) -> bool {
    match value.as_object() {
        Some(obj) => required_keys.iter().all(|key| obj.contains_key(*key)),
        None => false,
    }
}

/// All balanced-brace substrings of `text`, ordered by start position.
/// Candidates starting inside string literals of an enclosing candidate are
/// still produced; invalid ones simply fail to parse later.
fn candidates(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    for (start, ch) in text.char_indices() {
        if ch == '{' {
            if let Some(end) = matching_brace(text, start) {
                found.push(&text[start..=end]);
            }
        }
    }
    found
}

/// Byte offset of the brace closing the one at `start`, skipping braces
/// inside string literals.
fn matching_brace(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + idx);
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
    use serde_json::json;

    #[test]
    fn test_whole_response_is_json() {
        let text = r#"{"classification": "Scotch Whisky", "region": "Islay"}"#;
        let value = extract_object(text, &["classification", "region"]).unwrap();
        assert_eq!(value["region"], json!("Islay"));
    }

    #[test]
    fn test_embedded_in_prose() {
        let text = "Here is the analysis:\n{\"region\": \"Speyside\"}\nHope that helps!";
        let value = extract_object(text, &["region"]).unwrap();
        assert_eq!(value["region"], json!("Speyside"));
    }

    #[test]
    fn test_nested_object() {
        let text = r#"Result: {"taste_profile": {"fruity": 4, "spicy": 2}} done"#;
        let value = extract_object(text, &["taste_profile"]).unwrap();
        assert_eq!(value["taste_profile"]["fruity"], json!(4));
    }

    #[test]
    fn test_first_qualifying_candidate_wins() {
        let text = r#"{"other": 1} and then {"region": "Kyoto", "extra": 2}"#;
        let value = extract_object(text, &["region"]).unwrap();
        assert_eq!(value["region"], json!("Kyoto"));
        assert_eq!(value["extra"], json!(2));
    }

    #[test]
    fn test_braces_inside_strings() {
        let text = r#"{"note": "smoky {peat} finish", "region": "Islay"}"#;
        let value = extract_object(text, &["note", "region"]).unwrap();
        assert_eq!(value["note"], json!("smoky {peat} finish"));
    }

    #[test]
    fn test_missing_required_key() {
        let text = r#"{"classification": "Other Whiskey"}"#;
        assert!(extract_object(text, &["classification", "region"]).is_none());
    }

    #[test]
    fn test_no_json_at_all() {
        assert!(extract_object("the model refused to answer", &["region"]).is_none());
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(extract_object(r#"{"region": "Islay""#, &["region"]).is_none());
    }

    #[test]
    fn test_inner_object_when_outer_lacks_keys() {
        // The outer object parses but lacks the key; the nested candidate has it.
        let text = r#"{"wrapper": {"taste_profile": {"fruity": 5}}}"#;
        let value = extract_object(text, &["taste_profile"]).unwrap();
        assert_eq!(value["taste_profile"]["fruity"], json!(5));
    }
}
