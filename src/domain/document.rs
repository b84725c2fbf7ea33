//! Raw documents as handed over by a document source, and the
//! non-fatal warnings produced while reading them.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::recipe::Provenance;

/// What a raw document defines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Recipe,
    Tag,
}

/// A parsed JSON document plus where it came from
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub kind: DocumentKind,
    /// `namespace:path` derived from the document location
    pub id: String,
    pub provenance: Provenance,
    pub body: serde_json::Value,
}

impl RawDocument {
    pub fn recipe(id: impl Into<String>, provenance: Provenance, body: serde_json::Value) -> Self {
        Self {
            kind: DocumentKind::Recipe,
            id: id.into(),
            provenance,
            body,
        }
    }

    pub fn tag(id: impl Into<String>, provenance: Provenance, body: serde_json::Value) -> Self {
        Self {
            kind: DocumentKind::Tag,
            id: id.into(),
            provenance,
            body,
        }
    }
}

/// Why a record was skipped
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ParseWarningKind {
    #[error("record has no 'type' field")]
    MissingType,

    #[error("unknown recipe type '{0}'")]
    UnknownType(String),

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("record has no result")]
    MissingResult,

    #[error("output count must be positive, got {0}")]
    InvalidOutputCount(i64),

    #[error("ingredient count must be positive, got {0}")]
    InvalidIngredientCount(i64),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("unreadable: {0}")]
    Io(String),
}

/// A skipped record; collected, never raised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub source: String,
    #[serde(flatten)]
    pub kind: ParseWarningKind,
}

impl ParseWarning {
    pub fn new(source: impl Into<String>, kind: ParseWarningKind) -> Self {
        Self {
            source: source.into(),
            kind,
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.kind)
    }
}

impl std::error::Error for ParseWarning {}
