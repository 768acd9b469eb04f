//! Decoding of raw generation responses
//!
//! The service is asked for a JSON list but does not always return one. A
//! response is tried against a fixed sequence of shapes, and the shape that
//! matched is kept so callers can tell a correct empty answer apart from an
//! answer that could not be read at all.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Object fields that may wrap the item list
const LIST_FIELDS: &[&str] = &["faqs", "questions"];

/// The outcome of decoding one raw response
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedResponse {
    /// The whole response was a JSON list
    DirectList(Vec<Value>),

    /// A JSON list was found between the first `[` and the last `]`
    BracketedList(Vec<Value>),

    /// The response was an object carrying the list under a known field
    NamedField { field: &'static str, items: Vec<Value> },

    /// No known shape matched
    Unparseable { reason: String },
}

impl DecodedResponse {
    /// Returns the decoded items, or `None` for an unparseable response
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Self::DirectList(items)
            | Self::BracketedList(items)
            | Self::NamedField { items, .. } => Some(items.as_slice()),
            Self::Unparseable { .. } => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.items().is_some()
    }

    /// Short name of the matched shape, for logging
    pub fn shape(&self) -> &'static str {
        match self {
            Self::DirectList(_) => "direct list",
            Self::BracketedList(_) => "bracketed list",
            Self::NamedField { .. } => "named field",
            Self::Unparseable { .. } => "unparseable",
        }
    }
}

/// One question/answer pair proposed by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedFaq {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Decodes a raw response
///
/// # Fallback Order
///
/// 1. The whole text parses as a JSON list
/// 2. The substring from the first `[` to the last `]` parses as a JSON list
/// 3. The whole text parses as an object with a `faqs` or `questions` list
/// 4. Otherwise the response is unparseable
pub fn decode_response(raw: &str) -> DecodedResponse {
    let raw = raw.trim();
    if raw.is_empty() {
        return DecodedResponse::Unparseable {
            reason: "empty response".to_string(),
        };
    }

    let whole = serde_json::from_str::<Value>(raw);
    if let Ok(Value::Array(items)) = whole {
        return DecodedResponse::DirectList(items);
    }

    if let Some(items) = bracketed_list(raw) {
        return DecodedResponse::BracketedList(items);
    }

    match whole {
        Ok(Value::Object(mut map)) => {
            for field in LIST_FIELDS {
                if let Some(Value::Array(items)) = map.remove(*field) {
                    return DecodedResponse::NamedField {
                        field: *field,
                        items,
                    };
                }
            }
            DecodedResponse::Unparseable {
                reason: "object has no faqs or questions list".to_string(),
            }
        }
        Ok(other) => DecodedResponse::Unparseable {
            reason: format!("unexpected JSON value: {}", json_kind(&other)),
        },
        Err(e) => DecodedResponse::Unparseable {
            reason: format!("invalid JSON: {}", e),
        },
    }
}

fn bracketed_list(raw: &str) -> Option<Vec<Value>> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Converts decoded items into FAQs
///
/// Items without a non-empty question and answer are dropped. A blank source
/// is treated as missing.
pub fn to_faqs(items: &[Value]) -> Vec<GeneratedFaq> {
    items
        .iter()
        .filter_map(|item| {
            let field = |name: &str| {
                item.get(name)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            };

            Some(GeneratedFaq {
                question: field("question")?.to_string(),
                answer: field("answer")?.to_string(),
                source: field("source").map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_list() {
        let decoded = decode_response(r#"[{"question": "Q?", "answer": "A."}]"#);
        assert_eq!(decoded.shape(), "direct list");
        assert_eq!(decoded.items().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_list_is_parsed() {
        let decoded = decode_response("[]");
        assert_eq!(decoded, DecodedResponse::DirectList(vec![]));
        assert!(decoded.is_parsed());
    }

    #[test]
    fn test_list_inside_prose() {
        let raw = "Here are your FAQs:\n```json\n[{\"question\": \"Q?\", \"answer\": \"A.\"}]\n```";
        let decoded = decode_response(raw);
        assert!(matches!(decoded, DecodedResponse::BracketedList(ref items) if items.len() == 1));
    }

    #[test]
    fn test_wrapped_object_prefers_bracketed_list() {
        let decoded = decode_response(r#"{"faqs": [{"question": "Q?", "answer": "A."}]}"#);
        assert_eq!(decoded.shape(), "bracketed list");
        assert_eq!(decoded.items().unwrap().len(), 1);
    }

    #[test]
    fn test_named_field() {
        // Two lists make the bracketed slice invalid JSON
        let raw = r#"{"questions": [{"question": "Q?", "answer": "A."}], "tags": ["x"]}"#;
        let decoded = decode_response(raw);
        match decoded {
            DecodedResponse::NamedField { field, items } => {
                assert_eq!(field, "questions");
                assert_eq!(items.len(), 1);
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_unparseable() {
        for raw in ["", "no json here", r#"{"answer": 42}"#, "\"just a string\""] {
            let decoded = decode_response(raw);
            assert!(!decoded.is_parsed(), "expected unparseable for {:?}", raw);
        }
    }

    #[test]
    fn test_to_faqs_skips_incomplete_items() {
        let items = vec![
            json!({"question": " How do I reset my password? ", "answer": "Use the reset link.", "source": "https://a.test/help"}),
            json!({"question": "Missing answer?"}),
            json!({"question": "", "answer": "Empty question"}),
            json!({"question": "Default source?", "answer": "Yes."}),
            json!("not an object"),
        ];

        let faqs = to_faqs(&items);
        assert_eq!(faqs.len(), 2);
        assert_eq!(faqs[0].question, "How do I reset my password?");
        assert_eq!(faqs[0].source.as_deref(), Some("https://a.test/help"));
        assert_eq!(faqs[1].source, None);
    }
}
