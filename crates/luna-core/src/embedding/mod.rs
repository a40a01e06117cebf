//! Embedding generation.
//!
//! The vector store only sees the [`Embedder`] trait. [`HashingEmbedder`]
//! works offline everywhere; [`FastEmbedEmbedder`] runs a local sentence
//! model and needs the `semantic-search` feature.

mod hashing;
mod models;
#[cfg(feature = "semantic-search")]
mod service;
mod traits;

pub use hashing::{HashingEmbedder, HASHING_DIMENSIONS_DEFAULT};
pub use models::{EmbeddingConfig, EmbeddingModel};
#[cfg(feature = "semantic-search")]
pub use service::FastEmbedEmbedder;
pub use traits::Embedder;
