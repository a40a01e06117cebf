//! Vector store module for embedding-based document retrieval.
//!
//! Documents are embedded through an injected [`crate::embedding::Embedder`]
//! and ranked by exact cosine distance with a bounded top-K heap.

mod distance;
mod models;
mod store;

pub use distance::cosine_distance;
pub use models::{
    hash_text, DocumentRecord, RecordId, SearchResult, VectorStoreStats, TOP_K_DEFAULT,
};
pub use store::VectorStore;
