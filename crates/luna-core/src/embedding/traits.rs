//! Embedding function seam.

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into a fixed-length vector.
///
/// Implementations must be deterministic for identical input: the vector
/// store embeds documents and queries through the same instance and
/// compares the results directly.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    ///
    /// # Returns
    /// * `Ok(Vec<f32>)` - The embedding vector
    /// * `Err(LunaError::Embedding)` - The model or its transport failed
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Name of the model producing the vectors, for logging and stats
    fn model_name(&self) -> &str;

    /// Output dimensionality, when known ahead of the first call
    fn dimensions(&self) -> Option<usize> {
        None
    }
}
