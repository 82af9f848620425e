//! Typed lookups over store replies.
//!
//! Replies come in three shapes: a query reply (array of
//! `{document?, readTime}`), a list reply (`{documents?: [...]}`) and a single
//! document. Every lookup tolerates any of them, a missing field or a
//! malformed body, and answers `None` rather than failing.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::document::{Document, FieldValue};

/// Parsed reply payload.
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    payload: Value,
}

impl ResponseParser {
    /// Parse reply text. A body that is not JSON becomes an empty payload.
    pub fn parse(text: &str) -> Self {
        let payload = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                debug!("Reply is not JSON ({}), treating as empty", e);
                Value::Null
            }
        };
        Self { payload }
    }

    /// Wrap an already parsed payload.
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// The raw payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consume into the raw payload.
    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Every document in the reply, in reply order.
    pub fn documents(&self) -> Vec<Document> {
        document_values(&self.payload)
            .into_iter()
            .filter_map(Document::from_json)
            .collect()
    }

    /// Full resource name of the first document.
    pub fn first_document_name(&self) -> Option<String> {
        self.documents().into_iter().next().map(|doc| doc.name)
    }

    /// Integer value of `field` in the first `fields` object that has it,
    /// wherever that object sits in the payload.
    pub fn integer_field(&self, field: &str) -> Option<i64> {
        find_integer(&self.payload, field)
    }

    /// Highest numeric id directly under `subcollection` across all
    /// documents. Non-numeric ids are skipped.
    pub fn max_trailing_id(&self, subcollection: &str) -> Option<u64> {
        let pattern = format!(r"(?:^|/){}/(\d+)$", regex::escape(subcollection));
        let re = Regex::new(&pattern).ok()?;

        self.documents()
            .iter()
            .filter_map(|doc| re.captures(&doc.name))
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
            .max()
    }
}

fn document_values(payload: &Value) -> Vec<&Value> {
    match payload {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item.get("document") {
                Some(doc) => Some(doc),
                None if item.get("name").is_some() => Some(item),
                None => None,
            })
            .collect(),
        Value::Object(map) => match map.get("documents") {
            Some(Value::Array(docs)) => docs.iter().collect(),
            _ if map.contains_key("name") => vec![payload],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn find_integer(value: &Value, field: &str) -> Option<i64> {
    match value {
        Value::Object(map) => {
            let direct = map
                .get("fields")
                .and_then(|fields| fields.get(field))
                .and_then(FieldValue::from_json)
                .and_then(|v| v.as_integer());
            direct.or_else(|| map.values().find_map(|v| find_integer(v, field)))
        }
        Value::Array(items) => items.iter().find_map(|v| find_integer(v, field)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "projects/p/databases/(default)/documents";

    fn query_reply() -> String {
        format!(
            r#"[{{
                "document": {{
                    "name": "{ROOT}/childaccounts/abc",
                    "fields": {{
                        "username": {{"stringValue": "lizzy"}},
                        "renzolvl": {{"integerValue": "4"}}
                    }}
                }},
                "readTime": "2025-01-01T00:00:00Z"
            }}]"#
        )
    }

    #[test]
    fn test_query_reply() {
        let parser = ResponseParser::parse(&query_reply());
        assert_eq!(
            parser.first_document_name().as_deref(),
            Some("projects/p/databases/(default)/documents/childaccounts/abc")
        );
        assert_eq!(parser.integer_field("renzolvl"), Some(4));
        assert_eq!(parser.integer_field("missing"), None);
    }

    #[test]
    fn test_empty_query_reply() {
        let parser = ResponseParser::parse(r#"[{"readTime": "2025-01-01T00:00:00Z"}]"#);
        assert!(parser.documents().is_empty());
        assert_eq!(parser.first_document_name(), None);
        assert_eq!(parser.integer_field("renzolvl"), None);
    }

    #[test]
    fn test_malformed_reply_is_empty() {
        let parser = ResponseParser::parse("<html>502 Bad Gateway</html>");
        assert!(parser.payload().is_null());
        assert_eq!(parser.first_document_name(), None);
        assert_eq!(parser.max_trailing_id("lizzyprogress"), None);
    }

    #[test]
    fn test_max_trailing_id() {
        let parent = format!("{ROOT}/childaccounts/abc/lizzyprogress");
        let reply = serde_json::json!({
            "documents": [
                {"name": format!("{parent}/0"), "fields": {}},
                {"name": format!("{parent}/2"), "fields": {}},
                {"name": format!("{parent}/1"), "fields": {}},
                {"name": format!("{parent}/notes"), "fields": {}},
            ]
        });
        let parser = ResponseParser::new(reply);
        assert_eq!(parser.max_trailing_id("lizzyprogress"), Some(2));
        assert_eq!(parser.max_trailing_id("progress"), None);
    }

    #[test]
    fn test_max_trailing_id_empty_list() {
        let parser = ResponseParser::parse("{}");
        assert_eq!(parser.max_trailing_id("lizzyprogress"), None);
    }

    #[test]
    fn test_integer_field_any_position() {
        // Field order and nesting should not matter.
        let parser = ResponseParser::parse(
            r#"{"updateTime": "x", "fields": {"a": {"stringValue": "b"}, "lprogress": {"integerValue": 93}}, "name": "n"}"#,
        );
        assert_eq!(parser.integer_field("lprogress"), Some(93));
    }

    #[test]
    fn test_single_document_reply() {
        let parser = ResponseParser::parse(&format!(
            r#"{{"name": "{ROOT}/childaccounts/abc/lizzyprogress/7", "fields": {{}}}}"#
        ));
        assert_eq!(parser.documents().len(), 1);
        assert_eq!(parser.max_trailing_id("lizzyprogress"), Some(7));
    }
}
