//! FastEmbed-backed local embedder.

use async_trait::async_trait;
use fastembed::{EmbeddingModel as FastEmbedModel, InitOptions, TextEmbedding};

use super::models::{EmbeddingConfig, EmbeddingModel};
use super::traits::Embedder;
use crate::error::{LunaError, Result};

/// Embedder running a sentence-embedding model on the local CPU.
///
/// Models are downloaded on first use and cached under the configured
/// directory.
pub struct FastEmbedEmbedder {
    model: TextEmbedding,
    variant: EmbeddingModel,
    name: String,
}

impl FastEmbedEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let init_options = InitOptions::new(Self::to_fastembed_model(&config.model))
            .with_cache_dir(config.get_cache_dir())
            .with_show_download_progress(config.show_download_progress);

        let model = TextEmbedding::try_new(init_options).map_err(|e| {
            LunaError::embedding(format!("Failed to initialize embedding model: {e}"))
        })?;

        tracing::info!(model = %config.model, "Loaded embedding model");

        Ok(Self {
            model,
            variant: config.model,
            name: config.model.to_string(),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(EmbeddingConfig::default())
    }

    pub fn variant(&self) -> EmbeddingModel {
        self.variant
    }

    fn to_fastembed_model(model: &EmbeddingModel) -> FastEmbedModel {
        match model {
            EmbeddingModel::BGESmallENV15 => FastEmbedModel::BGESmallENV15,
            EmbeddingModel::AllMiniLML6V2 => FastEmbedModel::AllMiniLML6V2,
            EmbeddingModel::BGEBaseENV15 => FastEmbedModel::BGEBaseENV15,
            EmbeddingModel::MultilingualE5Small => FastEmbedModel::MultilingualE5Small,
        }
    }
}

#[async_trait]
impl Embedder for FastEmbedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self
            .model
            .embed(vec![text], None)
            .map_err(|e| LunaError::embedding(format!("Failed to generate embedding: {e}")))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| LunaError::embedding("No embedding returned"))
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.variant.dimensions())
    }
}
