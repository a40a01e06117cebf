//! Local sentence-embedding models and their metadata.

use std::fmt;
use std::path::PathBuf;

/// Supported local embedding models.
///
/// These map to FastEmbed model variants and are downloaded on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingModel {
    /// BGE Small English v1.5, 384 dimensions.
    #[default]
    BGESmallENV15,

    /// All MiniLM L6 v2, 384 dimensions. Fastest option.
    AllMiniLML6V2,

    /// BGE Base English v1.5, 768 dimensions.
    BGEBaseENV15,

    /// Multilingual E5 Small, 384 dimensions. For non-English corpora.
    MultilingualE5Small,
}

impl EmbeddingModel {
    /// Number of dimensions in this model's embeddings.
    pub fn dimensions(&self) -> usize {
        match self {
            Self::BGESmallENV15 | Self::AllMiniLML6V2 | Self::MultilingualE5Small => 384,
            Self::BGEBaseENV15 => 768,
        }
    }

    /// Hugging Face repository the weights come from.
    pub fn repository(&self) -> &'static str {
        match self {
            Self::BGESmallENV15 => "BAAI/bge-small-en-v1.5",
            Self::AllMiniLML6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            Self::BGEBaseENV15 => "BAAI/bge-base-en-v1.5",
            Self::MultilingualE5Small => "intfloat/multilingual-e5-small",
        }
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BGESmallENV15 => write!(f, "bge-small-en-v1.5"),
            Self::AllMiniLML6V2 => write!(f, "all-minilm-l6-v2"),
            Self::BGEBaseENV15 => write!(f, "bge-base-en-v1.5"),
            Self::MultilingualE5Small => write!(f, "multilingual-e5-small"),
        }
    }
}

impl std::str::FromStr for EmbeddingModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bgesmallenv15" | "bge-small-en-v1.5" => Ok(Self::BGESmallENV15),
            "allminilml6v2" | "all-minilm-l6-v2" => Ok(Self::AllMiniLML6V2),
            "bgebaseenv15" | "bge-base-en-v1.5" => Ok(Self::BGEBaseENV15),
            "multilinguale5small" | "multilingual-e5-small" => Ok(Self::MultilingualE5Small),
            _ => Err(format!("Unknown embedding model: {s}")),
        }
    }
}

/// Configuration for the local embedding model.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub model: EmbeddingModel,

    /// Directory to cache downloaded models.
    /// Defaults to `~/.luna/models/` if not specified.
    pub cache_dir: Option<PathBuf>,

    pub show_download_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: EmbeddingModel::default(),
            cache_dir: None,
            show_download_progress: true,
        }
    }
}

impl EmbeddingConfig {
    pub fn new(model: EmbeddingModel) -> Self {
        Self {
            model,
            ..Default::default()
        }
    }

    pub fn with_cache_dir(mut self, path: PathBuf) -> Self {
        self.cache_dir = Some(path);
        self
    }

    pub fn with_show_download_progress(mut self, show: bool) -> Self {
        self.show_download_progress = show;
        self
    }

    /// Get the cache directory, using default if not specified.
    pub fn get_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".luna")
                .join("models")
        })
    }
}
