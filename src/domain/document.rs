//! Document model for transfers.
//!
//! A document is an arbitrary JSON object. The engine never interprets the
//! payload beyond its identifier field (`_id`): identity drives conflict
//! detection and the id-regeneration policy, everything else is opaque and
//! copied verbatim.

use serde_json::Value;

/// Name of the identifier field inside a document body.
pub const ID_FIELD: &str = "_id";

/// A single document flowing from source to target.
///
/// Wraps the raw JSON body together with the identifier extracted from it
/// (if any). Documents without an identifier are legal: stores assign one
/// on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    id: Option<Value>,
    body: Value,
}

impl DocumentRecord {
    /// Wraps a raw JSON value, extracting the `_id` field if present.
    ///
    /// Non-object values are accepted; they simply have no identifier.
    pub fn new(body: Value) -> Self {
        let id = body.get(ID_FIELD).cloned();
        Self { id, body }
    }

    /// The document identifier, if the body carries one.
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// Renders the identifier for log and error messages.
    ///
    /// String identifiers render without quotes; other JSON values render
    /// in their JSON form. Documents without an identifier render as
    /// `<no id>`.
    pub fn id_display(&self) -> String {
        display_id(self.id.as_ref())
    }

    /// Borrows the raw JSON body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consumes the record, returning the raw JSON body.
    pub fn into_body(self) -> Value {
        self.body
    }
}

impl From<Value> for DocumentRecord {
    fn from(body: Value) -> Self {
        Self::new(body)
    }
}

/// Renders an optional identifier value for messages.
pub fn display_id(id: Option<&Value>) -> String {
    match id {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "<no id>".to_string(),
    }
}

/// Canonical map key for an identifier value.
///
/// Distinct JSON values must map to distinct keys: the string `"1"` and the
/// number `1` are different identifiers.
pub fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => format!("s:{s}"),
        other => format!("j:{other}"),
    }
}

/// Returns the document's identifier, assigning a fresh UUID when an
/// object lacks one. Non-object values have no identity.
pub fn ensure_id(doc: &mut Value) -> Option<Value> {
    match doc {
        Value::Object(map) => {
            if let Some(id) = map.get(ID_FIELD) {
                return Some(id.clone());
            }
            let id = Value::String(uuid::Uuid::new_v4().to_string());
            map.insert(ID_FIELD.to_string(), id.clone());
            Some(id)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_extracts_id() {
        let record = DocumentRecord::new(json!({"_id": "doc-1", "name": "a"}));
        assert_eq!(record.id(), Some(&json!("doc-1")));
        assert_eq!(record.id_display(), "doc-1");
    }

    #[test]
    fn test_record_without_id() {
        let record = DocumentRecord::new(json!({"name": "a"}));
        assert!(record.id().is_none());
        assert_eq!(record.id_display(), "<no id>");
    }

    #[test]
    fn test_record_numeric_id_display() {
        let record = DocumentRecord::new(json!({"_id": 42}));
        assert_eq!(record.id_display(), "42");
    }

    #[test]
    fn test_id_key_distinguishes_types() {
        assert_ne!(id_key(&json!("1")), id_key(&json!(1)));
        assert_eq!(id_key(&json!("a")), id_key(&json!("a")));
    }

    #[test]
    fn test_into_body_round_trip() {
        let body = json!({"_id": 7, "payload": [1, 2, 3]});
        let record = DocumentRecord::new(body.clone());
        assert_eq!(record.into_body(), body);
    }

    #[test]
    fn test_ensure_id_keeps_existing() {
        let mut doc = json!({"_id": "a"});
        assert_eq!(ensure_id(&mut doc), Some(json!("a")));
        assert_eq!(doc, json!({"_id": "a"}));
    }

    #[test]
    fn test_ensure_id_assigns_uuid() {
        let mut doc = json!({"value": 1});
        let id = ensure_id(&mut doc).unwrap();
        assert_eq!(doc.get("_id"), Some(&id));
        assert!(id.as_str().unwrap().len() >= 32);
    }

    #[test]
    fn test_ensure_id_skips_non_objects() {
        let mut doc = json!([1, 2, 3]);
        assert!(ensure_id(&mut doc).is_none());
        assert_eq!(doc, json!([1, 2, 3]));
    }
}
