//! In-memory vector store with exact top-K retrieval.

use std::sync::{Arc, PoisonError, RwLock};

use super::distance::{cosine_distance, select_top_k, Candidate};
use super::models::{DocumentRecord, RecordId, SearchResult, VectorStoreStats};
use crate::embedding::Embedder;
use crate::error::{LunaError, Result};

#[derive(Debug, Default)]
struct StoreState {
    /// Shared with in-flight queries; writers copy on write.
    records: Arc<Vec<Arc<DocumentRecord>>>,
    dimensions: Option<usize>,
    next_id: u64,
}

impl StoreState {
    /// Validate and append one record. Nothing changes on error.
    ///
    /// While a query holds a snapshot the first push under a lock copies the
    /// record list; later pushes under the same lock reuse that copy.
    fn push(&mut self, text: &str, embedding: Vec<f32>) -> Result<RecordId> {
        check_embedding(&embedding)?;
        if let Some(expected) = self.dimensions {
            if embedding.len() != expected {
                tracing::warn!(
                    expected = expected,
                    actual = embedding.len(),
                    "Rejected document with mismatched embedding"
                );
                return Err(LunaError::dimension_mismatch(expected, embedding.len()));
            }
        }

        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.dimensions = Some(embedding.len());
        Arc::make_mut(&mut self.records).push(Arc::new(DocumentRecord::new(
            id,
            text.to_string(),
            embedding,
        )));
        Ok(id)
    }
}

fn check_embedding(embedding: &[f32]) -> Result<()> {
    if embedding.is_empty() {
        return Err(LunaError::embedding("embedder returned an empty vector"));
    }
    if embedding.iter().any(|value| !value.is_finite()) {
        return Err(LunaError::embedding(
            "embedding contains NaN or infinite components",
        ));
    }
    Ok(())
}

/// Vector store ranking documents by cosine distance to a query.
///
/// Embeddings come from the injected [`Embedder`], used for both inserts and
/// queries. Records are published whole under the write lock, and a query
/// ranks the snapshot it took when it started, so it may miss a concurrent
/// insert but never sees a partial one.
pub struct VectorStore {
    embedder: Arc<dyn Embedder>,
    state: RwLock<StoreState>,
}

impl VectorStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            state: RwLock::new(StoreState::default()),
        }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    fn snapshot(&self) -> (Arc<Vec<Arc<DocumentRecord>>>, Option<usize>) {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        (Arc::clone(&state.records), state.dimensions)
    }

    /// Embed `text` and store it.
    ///
    /// The first record fixes the store's dimensionality; later embeddings
    /// of another length fail with `DimensionMismatch` and change nothing.
    pub async fn insert(&self, text: &str) -> Result<RecordId> {
        let embedding = self.embedder.embed(text).await?;
        self.insert_embedded(text, embedding)
    }

    /// Store a document whose embedding was computed elsewhere.
    ///
    /// The embedding must come from the same model as the store's embedder,
    /// otherwise distances are meaningless.
    pub fn insert_embedded(&self, text: &str, embedding: Vec<f32>) -> Result<RecordId> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let id = state.push(text, embedding)?;
        let count = state.records.len();
        drop(state);

        tracing::debug!(id = %id, count = count, "Inserted document");
        Ok(id)
    }

    /// Insert texts in order, stopping at the first failure.
    ///
    /// All texts are embedded first and the successful prefix is published
    /// under a single write lock. Documents inserted before the failure stay
    /// committed and are listed in the returned `BatchInsert` error along
    /// with the failing index.
    pub async fn insert_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<RecordId>> {
        let mut embedded = Vec::with_capacity(texts.len());
        let mut failure = None;

        for (index, text) in texts.iter().enumerate() {
            match self.embedder.embed(text.as_ref()).await {
                Ok(embedding) => embedded.push((text.as_ref(), embedding)),
                Err(source) => {
                    failure = Some((index, source));
                    break;
                }
            }
        }

        let mut inserted = Vec::with_capacity(embedded.len());
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            for (index, (text, embedding)) in embedded.into_iter().enumerate() {
                match state.push(text, embedding) {
                    Ok(id) => inserted.push(id),
                    Err(source) => {
                        failure = Some((index, source));
                        break;
                    }
                }
            }
        }

        if let Some((failed_index, source)) = failure {
            tracing::warn!(
                failed_index = failed_index,
                inserted = inserted.len(),
                error = %source,
                "Batch insert stopped"
            );
            return Err(LunaError::BatchInsert {
                inserted,
                failed_index,
                source: Box::new(source),
            });
        }

        tracing::debug!(inserted = inserted.len(), "Inserted document batch");
        Ok(inserted)
    }

    /// Rank stored documents against `text`, nearest first.
    ///
    /// Returns at most `top_k` results; ties keep insertion order.
    pub async fn search(&self, text: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            tracing::warn!("Rejected query with top_k = 0");
            return Err(LunaError::invalid_config("top_k must be at least 1"));
        }

        let query = self.embedder.embed(text).await?;
        self.search_embedding(&query, top_k)
    }

    /// Rank stored documents against a precomputed query embedding.
    pub fn search_embedding(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(LunaError::invalid_config("top_k must be at least 1"));
        }

        let (records, dimensions) = self.snapshot();
        if records.is_empty() {
            return Ok(Vec::new());
        }
        check_embedding(query)?;
        if let Some(expected) = dimensions {
            if query.len() != expected {
                return Err(LunaError::dimension_mismatch(expected, query.len()));
            }
        }

        let mut candidates = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            candidates.push(Candidate {
                distance: cosine_distance(query, &record.embedding)?,
                id: record.id,
                index,
            });
        }

        let results: Vec<SearchResult> = select_top_k(candidates, top_k)
            .into_iter()
            .map(|candidate| {
                let record = &records[candidate.index];
                SearchResult {
                    id: record.id,
                    text: record.text.clone(),
                    distance: candidate.distance,
                }
            })
            .collect();

        tracing::debug!(
            scanned = records.len(),
            top_k = top_k,
            returned = results.len(),
            "Vector query completed"
        );
        Ok(results)
    }

    /// Texts of the `top_k` nearest documents, nearest first.
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<String>> {
        Ok(self
            .search(text, top_k)
            .await?
            .into_iter()
            .map(|result| result.text)
            .collect())
    }

    /// Look up a record by id.
    pub fn get(&self, id: RecordId) -> Option<DocumentRecord> {
        let (records, _) = self.snapshot();
        // Ids are assigned in order, so the vector is sorted by id.
        records
            .binary_search_by_key(&id, |record| record.id)
            .ok()
            .map(|index| records[index].as_ref().clone())
    }

    /// Remove every record. The next insert may choose a new dimensionality.
    pub fn clear(&self) {
        let removed = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let removed = state.records.len();
            state.records = Arc::new(Vec::new());
            state.dimensions = None;
            removed
        };
        tracing::info!(removed = removed, "Cleared vector store");
    }

    pub fn len(&self) -> usize {
        self.snapshot().0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Established dimensionality, `None` while empty.
    pub fn dimensions(&self) -> Option<usize> {
        self.snapshot().1
    }

    pub fn stats(&self) -> VectorStoreStats {
        let (records, dimensions) = self.snapshot();
        VectorStoreStats {
            document_count: records.len(),
            dimensions,
            model_name: self.embedder.model_name().to_string(),
        }
    }
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("model", &self.embedder.model_name())
            .field("documents", &self.len())
            .finish()
    }
}
