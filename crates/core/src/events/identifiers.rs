//! Identifier types shared across the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extended-JSON key under which stores encode native object identifiers.
pub const OBJECT_ID_KEY: &str = "$oid";

/// Opaque key grouping all activity and broadcasts of one election.
///
/// Used both as the debounce bucket and as the broadcast room name.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElectionId(String);

impl ElectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads an election identifier from a document field value.
    ///
    /// Accepts a non-empty string, a number or a native object id. Numbers
    /// become their decimal text. Anything else is treated as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            Value::Object(map) => match map.get(OBJECT_ID_KEY) {
                Some(Value::String(hex)) if !hex.is_empty() => Some(Self(hex.clone())),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ElectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ElectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Reference to another document, as found in a referencing field.
///
/// Producers store references either as raw strings or as native object
/// ids; lookups must accept both.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum DocumentId {
    Raw(String),
    ObjectId(String),
}

impl DocumentId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::Raw(s.clone())),
            Value::Object(map) => match map.get(OBJECT_ID_KEY) {
                Some(Value::String(hex)) if !hex.is_empty() => Some(Self::ObjectId(hex.clone())),
                _ => None,
            },
            _ => None,
        }
    }

    /// The textual form of the identifier, regardless of how it was stored.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Raw(s) | Self::ObjectId(s) => s,
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
