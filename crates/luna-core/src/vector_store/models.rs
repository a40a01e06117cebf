//! Data models for vector storage.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default number of documents returned per query.
pub const TOP_K_DEFAULT: usize = 3;

/// Store-local record identifier. Ids grow with insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// An embedded document. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: RecordId,

    pub text: String,

    pub embedding: Vec<f32>,

    /// SHA256 hash of the text, for change detection by callers.
    pub text_hash: String,

    pub embedded_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub(crate) fn new(id: RecordId, text: String, embedding: Vec<f32>) -> Self {
        let text_hash = hash_text(&text);
        Self {
            id,
            text,
            embedding,
            text_hash,
            embedded_at: Utc::now(),
        }
    }
}

/// Hex-encoded SHA256 of a document text.
pub fn hash_text(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// One ranked hit from a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: RecordId,

    pub text: String,

    /// Cosine distance to the query (0.0 = same direction, 2.0 = opposite).
    pub distance: f32,
}

/// Statistics about the vector store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreStats {
    pub document_count: usize,

    /// Established embedding dimensionality, `None` while the store is empty.
    pub dimensions: Option<usize>,

    pub model_name: String,
}
