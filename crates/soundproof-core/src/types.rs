//! Domain types shared by the corpus loader, the index and its consumers.

use serde::{Deserialize, Serialize};

pub type DocumentId = String;

/// The full source record of a document, carried untouched.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One entry of the remediation catalog.
///
/// - `id`: stable identifier, unique within a corpus
/// - `fields`: the whole source record; the searchable text lives under
///   one of its keys and everything else (solutions, costs) is opaque payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Payload,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, fields: Payload) -> Self {
        Self { id: id.into(), fields }
    }

    /// Convenience constructor for a document holding a single text field.
    pub fn with_text(id: impl Into<DocumentId>, field: &str, text: impl Into<String>) -> Self {
        let mut fields = Payload::new();
        fields.insert(field.to_string(), serde_json::Value::String(text.into()));
        Self::new(id, fields)
    }

    /// Returns the string stored under `field`, or `None` when it is absent,
    /// `null` or not a string.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(serde_json::Value::as_str)
    }
}

/// A scored association between a query and a corpus document.
///
/// `position` is the document's zero-based position in the corpus and is the
/// tie-break key when scores are equal. `score` lies in `[0, 1]`, higher is
/// better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Match<'a> {
    pub document: &'a Document,
    pub position: usize,
    pub score: f32,
}

impl Match<'_> {
    pub fn id(&self) -> &str {
        &self.document.id
    }
}
