//! Offline feature-hashing embedder.

use async_trait::async_trait;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::traits::Embedder;
use crate::error::{LunaError, Result};

/// Default number of hash buckets.
pub const HASHING_DIMENSIONS_DEFAULT: usize = 256;

lazy_static::lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid token regex");
}

/// Deterministic bag-of-words embedder.
///
/// Each lower-cased token is hashed with SHA-256; the first eight bytes pick
/// a bucket and the ninth picks a sign. The result is L2-normalised, so
/// texts sharing vocabulary land close under cosine distance. No model
/// download or network access is needed, which makes it the default when
/// the `semantic-search` feature is off.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(LunaError::invalid_config(
                "hashing embedder needs at least one dimension",
            ));
        }
        Ok(Self { dimensions })
    }

    /// Synchronous form of [`Embedder::embed`].
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in TOKEN_RE.find_iter(&text.to_lowercase()) {
            let digest = Sha256::digest(token.as_str().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimensions: HASHING_DIMENSIONS_DEFAULT,
        }
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn model_name(&self) -> &str {
        "feature-hashing"
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}
