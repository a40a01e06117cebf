use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use luna_core::config::Config;
use luna_core::embedding::Embedder;
use luna_core::logging::log_performance;
use luna_core::VectorStore;

/// Split a document file into paragraphs separated by blank lines.
pub fn split_paragraphs(contents: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}

fn create_embedder() -> Result<Arc<dyn Embedder>> {
    #[cfg(feature = "semantic-search")]
    {
        let embedder = luna_core::embedding::FastEmbedEmbedder::with_defaults()
            .context("Failed to load the local embedding model")?;
        Ok(Arc::new(embedder))
    }

    #[cfg(not(feature = "semantic-search"))]
    {
        Ok(Arc::new(luna_core::embedding::HashingEmbedder::default()))
    }
}

/// Build a vector store holding every paragraph of `path`.
pub async fn load_store(path: &Path) -> Result<Arc<VectorStore>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read documents: {}", path.display()))?;
    let paragraphs = split_paragraphs(&contents);
    if paragraphs.is_empty() {
        anyhow::bail!("No documents found in {}", path.display());
    }

    let store = VectorStore::new(create_embedder()?);
    let started = Instant::now();
    let indexed = store.insert_batch(&paragraphs).await;
    log_performance(
        "index_documents",
        started.elapsed().as_millis() as u64,
        indexed.is_ok(),
    );
    indexed.with_context(|| format!("Failed to index documents from {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        documents = store.len(),
        model = store.embedder().model_name(),
        "Loaded documents"
    );
    Ok(Arc::new(store))
}

/// Handle search command
pub async fn handle_search(
    query: String,
    docs: PathBuf,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let config = Config::load()?.with_env_overrides()?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k);

    let store = load_store(&docs).await?;
    let results = store.search(&query, top_k).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{}", style("No matching documents.").dim());
        return Ok(());
    }

    println!(
        "{} {} of {} documents for {}",
        style("🔍").bold(),
        results.len(),
        store.len(),
        style(format!("\"{query}\"")).cyan()
    );
    println!();
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{} {} {}",
            style(format!("{:>2}.", rank + 1)).bold(),
            style(format!("[{:.4}]", result.distance)).yellow(),
            style(&result.id).dim()
        );
        for line in result.text.lines() {
            println!("    {line}");
        }
        println!();
    }

    Ok(())
}
