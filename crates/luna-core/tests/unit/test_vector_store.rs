use std::sync::Arc;

use async_trait::async_trait;
use luna_core::embedding::{Embedder, HashingEmbedder};
use luna_core::vector_store::{cosine_distance, RecordId, VectorStore};
use luna_core::{LunaError, Result};

/// Embedder that reads the vector straight out of the text, e.g. "0.9,0.1".
/// Texts starting with "fail" make the embedder error.
struct LiteralEmbedder;

#[async_trait]
impl Embedder for LiteralEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.starts_with("fail") {
            return Err(LunaError::embedding("embedder unavailable"));
        }
        text.split(',')
            .map(|part| {
                part.trim()
                    .parse::<f32>()
                    .map_err(|e| LunaError::embedding(e.to_string()))
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        "literal"
    }
}

fn create_store() -> VectorStore {
    VectorStore::new(Arc::new(LiteralEmbedder))
}

fn literal(vector: &[f32]) -> String {
    vector
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Deterministic pseudo-random vectors.
fn generate_vectors(count: usize, dimensions: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            (0..dimensions)
                .map(|_| {
                    state = state
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    ((state >> 33) % 2001) as f32 / 1000.0 - 1.0
                })
                .collect()
        })
        .collect()
}

#[tokio::test]
async fn test_nearest_two_of_three() {
    let store = create_store();
    store.insert_batch(&["1,0", "0,1", "0.9,0.1"]).await.unwrap();

    let results = store.query("1,0", 2).await.unwrap();
    assert_eq!(results, vec!["1,0", "0.9,0.1"]);
}

#[tokio::test]
async fn test_search_matches_brute_force() {
    let store = create_store();
    let vectors = generate_vectors(60, 6, 7);
    let texts: Vec<String> = vectors.iter().map(|v| literal(v)).collect();
    let ids = store.insert_batch(&texts).await.unwrap();

    for query in generate_vectors(10, 6, 99) {
        // Literal round trip through text may differ slightly; use the parsed value
        let query_vector = LiteralEmbedder.embed(&literal(&query)).await.unwrap();

        let mut expected: Vec<(f32, RecordId)> = Vec::new();
        for (text, id) in texts.iter().zip(&ids) {
            let stored = LiteralEmbedder.embed(text).await.unwrap();
            expected.push((cosine_distance(&query_vector, &stored).unwrap(), *id));
        }
        expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for top_k in [1, 3, 10, 60, 100] {
            let results = store.search_embedding(&query_vector, top_k).unwrap();
            let got: Vec<RecordId> = results.iter().map(|r| r.id).collect();
            let want: Vec<RecordId> = expected.iter().take(top_k).map(|(_, id)| *id).collect();
            assert_eq!(got, want, "top_k {top_k}");
            assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }
}

#[tokio::test]
async fn test_ties_break_by_insertion_order() {
    let store = create_store();
    let first = store.insert("2,0").await.unwrap();
    let second = store.insert("1,0").await.unwrap();
    let third = store.insert("3,0").await.unwrap();

    let results = store.search("1,0", 3).await.unwrap();
    let ids: Vec<RecordId> = results.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![first, second, third]);
}

#[tokio::test]
async fn test_query_is_idempotent() {
    let store = create_store();
    for vector in generate_vectors(20, 4, 3) {
        store.insert(&literal(&vector)).await.unwrap();
    }

    let first = store.query("0.5,-0.2,0.1,0.7", 5).await.unwrap();
    let second = store.query("0.5,-0.2,0.1,0.7", 5).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[tokio::test]
async fn test_query_returns_fewer_than_k_when_store_is_small() {
    let store = create_store();
    assert!(store.query("1,0", 3).await.unwrap().is_empty());

    store.insert("1,0").await.unwrap();
    assert_eq!(store.query("0,1", 3).await.unwrap(), vec!["1,0"]);
}

#[tokio::test]
async fn test_zero_top_k_is_rejected() {
    let store = create_store();
    store.insert("1,0").await.unwrap();
    assert!(matches!(
        store.query("1,0", 0).await,
        Err(LunaError::InvalidConfiguration { .. })
    ));
}

#[tokio::test]
async fn test_mismatched_insert_leaves_store_unchanged() {
    let store = create_store();
    store.insert("1,0").await.unwrap();
    let before = store.query("1,0", 5).await.unwrap();

    let err = store.insert("1,0,0").await.unwrap_err();
    assert!(matches!(
        err,
        LunaError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
    assert!(!err.is_retryable());

    assert_eq!(store.len(), 1);
    assert_eq!(store.query("1,0", 5).await.unwrap(), before);
    assert!(store.query("1,0,0", 1).await.is_err());
}

#[tokio::test]
async fn test_batch_failure_reports_progress() {
    let store = create_store();
    let err = store
        .insert_batch(&["1,0", "0,1", "fail", "1,1"])
        .await
        .unwrap_err();

    match err {
        LunaError::BatchInsert {
            inserted,
            failed_index,
            source,
        } => {
            assert_eq!(inserted.len(), 2);
            assert_eq!(failed_index, 2);
            assert!(matches!(*source, LunaError::Embedding { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_clear_resets_dimensions_but_not_ids() {
    let store = create_store();
    let first = store.insert("1,0").await.unwrap();
    store.clear();

    assert!(store.is_empty());
    assert_eq!(store.dimensions(), None);

    let next = store.insert("1,0,0").await.unwrap();
    assert!(next > first);
    assert_eq!(store.dimensions(), Some(3));
}

#[tokio::test]
async fn test_hashing_embedder_retrieves_related_text() {
    let store = VectorStore::new(Arc::new(HashingEmbedder::default()));
    store
        .insert_batch(&[
            "Tech Stack - Python, JavaScript, React, Node.js",
            "Favorite dish - spicy tteokbokki with cheese",
            "Hobbies - hiking, photography and reading novels",
        ])
        .await
        .unwrap();

    let results = store.query("which python and react stack", 1).await.unwrap();
    assert_eq!(results, vec!["Tech Stack - Python, JavaScript, React, Node.js"]);
    assert_eq!(store.stats().model_name, "feature-hashing");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_and_queries() {
    let store = Arc::new(create_store());
    store.insert("1,0").await.unwrap();

    let mut tasks = Vec::new();
    for writer in 0..4 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            for vector in generate_vectors(25, 2, writer) {
                store.insert(&literal(&vector)).await.unwrap();
            }
        }));
    }
    for _ in 0..4 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            for _ in 0..25 {
                let results = store.search("1,0", 5).await.unwrap();
                assert!(!results.is_empty() && results.len() <= 5);
                assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(store.len(), 101);
}

#[tokio::test]
async fn test_top_k_beyond_store_size() {
    let store = create_store();
    store.insert_batch(&["1,0", "0,1", "0.9,0.1"]).await.unwrap();

    let results = store.query("1,0", usize::MAX).await.unwrap();
    assert_eq!(results, vec!["1,0", "0.9,0.1", "0,1"]);
}

#[tokio::test]
async fn test_non_finite_vectors_are_rejected() {
    let store = create_store();
    store.insert("1,0").await.unwrap();

    for text in ["NaN,0", "0,inf", "-inf,1"] {
        let err = store.insert(text).await.unwrap_err();
        assert!(matches!(err, LunaError::Embedding { .. }), "{text}: {err}");
    }
    assert_eq!(store.len(), 1);

    let err = store.query("NaN,1", 1).await.unwrap_err();
    assert!(matches!(err, LunaError::Embedding { .. }));

    let err = store.insert_batch(&["0,1", "NaN,NaN", "1,1"]).await.unwrap_err();
    match err {
        LunaError::BatchInsert {
            inserted,
            failed_index,
            source,
        } => {
            assert_eq!(inserted.len(), 1);
            assert_eq!(failed_index, 1);
            assert!(matches!(*source, LunaError::Embedding { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.len(), 2);
}
