//! Change event types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured record as delivered by the document store.
///
/// Native store types are expected in their extended-JSON form, so an
/// ObjectId arrives as `{"$oid": "<hex>"}`.
pub type Document = Map<String, Value>;

/// Kind of mutation reported by a change feed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Insert,
    Update,
    Replace,
    Delete,
    /// Collection-level notifications (drop, rename, invalidate, ...).
    Other,
}

impl OperationType {
    /// Maps a driver's operation name onto the normalized set.
    pub fn from_name(name: &str) -> Self {
        match name {
            "insert" => Self::Insert,
            "update" => Self::Update,
            "replace" => Self::Replace,
            "delete" => Self::Delete,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::Other => "other",
        }
    }
}

/// One normalized change notification.
///
/// Produced by a change feed and consumed once by the pipeline. For updates
/// the document carries the complete current state, not the delta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub source_collection: String,
    pub operation_type: OperationType,
    pub document: Option<Document>,
}

impl ChangeEvent {
    pub fn new(
        source_collection: impl Into<String>,
        operation_type: OperationType,
        document: Option<Document>,
    ) -> Self {
        Self {
            source_collection: source_collection.into(),
            operation_type,
            document,
        }
    }

    /// Convenience constructor for an insert carrying a JSON object.
    ///
    /// Non-object values produce an event without a document.
    pub fn inserted(source_collection: impl Into<String>, document: Value) -> Self {
        let document = match document {
            Value::Object(map) => Some(map),
            _ => None,
        };
        Self::new(source_collection, OperationType::Insert, document)
    }
}
