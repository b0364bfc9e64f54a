use serde_json::{Map, Value};

use crate::{RenderError, Result};

/// Turns flat `a.b.c=value` pairs into a nested JSON object with string leaves.
///
/// A repeated key keeps its last value. A key that is used both as a leaf and
/// as a parent (`pdf=x` next to `pdf.format=A4`) is rejected.
pub fn unflatten<I, K, V>(pairs: I) -> Result<Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut root = Map::new();

    for (key, value) in pairs {
        let key = key.as_ref();
        let segments: Vec<&str> = key.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(RenderError::validation(format!(
                "Invalid option key '{key}'"
            )));
        }

        let (leaf, parents) = match segments.split_last() {
            Some(split) => split,
            None => continue,
        };

        let mut node = &mut root;
        for segment in parents {
            let child = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            node = match child {
                Value::Object(map) => map,
                _ => return Err(conflict(key)),
            };
        }

        if matches!(node.get(*leaf), Some(Value::Object(_))) {
            return Err(conflict(key));
        }
        node.insert(leaf.to_string(), Value::String(value.into()));
    }

    Ok(Value::Object(root))
}

fn conflict(key: &str) -> RenderError {
    RenderError::validation(format!(
        "Option key '{key}' conflicts with another key using the same prefix"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nests_dotted_keys() {
        let value = unflatten([
            ("url", "https://example.com"),
            ("viewport.width", "800"),
            ("pdf.margin.top", "1cm"),
            ("pdf.margin.left", "2cm"),
            ("pdf.format", "Letter"),
        ])
        .unwrap();

        assert_eq!(
            value,
            json!({
                "url": "https://example.com",
                "viewport": { "width": "800" },
                "pdf": {
                    "format": "Letter",
                    "margin": { "top": "1cm", "left": "2cm" }
                }
            })
        );
    }

    #[test]
    fn last_value_wins_for_repeated_keys() {
        let value = unflatten([("viewport.width", "800"), ("viewport.width", "1024")]).unwrap();
        assert_eq!(value, json!({ "viewport": { "width": "1024" } }));
    }

    #[test]
    fn leaf_then_parent_conflicts() {
        let err = unflatten([("pdf", "yes"), ("pdf.format", "A4")]).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn parent_then_leaf_conflicts() {
        let err = unflatten([("pdf.format", "A4"), ("pdf", "yes")]).unwrap_err();
        assert!(err.to_string().contains("conflicts"));
    }

    #[test]
    fn empty_segments_are_rejected() {
        assert!(unflatten([("viewport..width", "1")]).is_err());
        assert!(unflatten([(".url", "x")]).is_err());
        assert!(unflatten([("", "x")]).is_err());
    }

    #[test]
    fn no_pairs_yield_empty_object() {
        let pairs: Vec<(String, String)> = Vec::new();
        assert_eq!(unflatten(pairs).unwrap(), json!({}));
    }
}
