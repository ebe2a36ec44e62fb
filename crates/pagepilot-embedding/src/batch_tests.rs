use super::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Records every call; embeds text as `[len, 1.0]`.
struct ScriptedProvider {
    batch_calls: Mutex<Vec<Vec<String>>>,
    single_calls: AtomicU32,
    fail_batch: bool,
    fail_texts: Vec<String>,
    declared_dimension: usize,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            batch_calls: Mutex::new(Vec::new()),
            single_calls: AtomicU32::new(0),
            fail_batch: false,
            fail_texts: Vec::new(),
            declared_dimension: 2,
        }
    }

    fn failing_batch(fail_texts: &[&str]) -> Self {
        Self {
            fail_batch: true,
            fail_texts: fail_texts.iter().map(|s| s.to_string()).collect(),
            ..Self::new()
        }
    }

    fn vector_for(text: &str) -> Embedding {
        Embedding::new(vec![text.len() as f32, 1.0])
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_texts.iter().any(|t| t == text) {
            return Err(EmbeddingError::Failed("unembeddable".to_string()));
        }
        Ok(Self::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        self.batch_calls
            .lock()
            .push(texts.iter().map(|t| t.to_string()).collect());
        if self.fail_batch {
            return Err(EmbeddingError::Failed("batch down".to_string()));
        }
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.declared_dimension
    }
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_duplicates_embedded_once() {
    let provider = Arc::new(ScriptedProvider::new());
    let embedder = BatchEmbedder::new(provider.clone(), Arc::new(EmbeddingCache::default()));

    let out = embedder.embed_all(&texts(&["a", "bb", "a"])).await;

    assert_eq!(out.len(), 3);
    assert_eq!(out[0], out[2]);
    assert_ne!(out[0], out[1]);

    let calls = provider.batch_calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], vec!["a".to_string(), "bb".to_string()]);
}

#[tokio::test]
async fn test_cache_hits_skip_remote() {
    let provider = Arc::new(ScriptedProvider::new());
    let cache = Arc::new(EmbeddingCache::default());
    let embedder = BatchEmbedder::new(provider.clone(), cache.clone());

    embedder.embed_all(&texts(&["a", "b"])).await;
    let out = embedder.embed_all(&texts(&["b", "c", "a"])).await;

    assert_eq!(out.len(), 3);
    let calls = provider.batch_calls.lock();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1], vec!["c".to_string()]);
    assert_eq!(cache.len(), 3);
}

#[tokio::test]
async fn test_all_cached_makes_no_call() {
    let provider = Arc::new(ScriptedProvider::new());
    let embedder = BatchEmbedder::new(provider.clone(), Arc::new(EmbeddingCache::default()));

    embedder.embed_all(&texts(&["x"])).await;
    embedder.embed_all(&texts(&["x", "x"])).await;

    assert_eq!(provider.batch_calls.lock().len(), 1);
}

#[tokio::test]
async fn test_batch_failure_falls_back_per_item() {
    let provider = Arc::new(ScriptedProvider::failing_batch(&[]));
    let embedder = BatchEmbedder::new(provider.clone(), Arc::new(EmbeddingCache::default()));

    let out = embedder.embed_all(&texts(&["one", "two", "one"])).await;

    assert_eq!(out.len(), 3);
    assert_eq!(out[0].vector, vec![3.0, 1.0]);
    assert_eq!(out[2].vector, vec![3.0, 1.0]);
    assert_eq!(provider.single_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unembeddable_text_gets_neutral_vector() {
    let provider = Arc::new(ScriptedProvider::failing_batch(&["bad"]));
    let cache = Arc::new(EmbeddingCache::default());
    let embedder = BatchEmbedder::new(provider, cache.clone());

    let out = embedder.embed_all(&texts(&["good", "bad"])).await;

    assert_eq!(out[0].vector, vec![4.0, 1.0]);
    assert_eq!(out[1].vector, vec![0.0, 0.0]);
    assert!(cache.get("bad").is_none());
    assert!(cache.get("good").is_some());
}

#[tokio::test]
async fn test_empty_input() {
    let provider = Arc::new(ScriptedProvider::new());
    let embedder = BatchEmbedder::new(provider.clone(), Arc::new(EmbeddingCache::default()));

    assert!(embedder.embed_all(&[]).await.is_empty());
    assert!(provider.batch_calls.lock().is_empty());
}

struct ShortBatchProvider;

#[async_trait]
impl EmbeddingProvider for ShortBatchProvider {
    async fn embed(&self, _: &str) -> Result<Embedding, EmbeddingError> {
        Ok(Embedding::new(vec![1.0, 1.0]))
    }

    async fn embed_batch(&self, _: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(vec![Embedding::new(vec![9.0, 9.0])])
    }

    fn dimension(&self) -> usize {
        2
    }
}

#[tokio::test]
async fn test_count_mismatch_treated_as_batch_failure() {
    let embedder = BatchEmbedder::new(
        Arc::new(ShortBatchProvider),
        Arc::new(EmbeddingCache::default()),
    );

    let out = embedder.embed_all(&texts(&["a", "b"])).await;

    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|e| e.vector == vec![1.0, 1.0]));
}

#[tokio::test]
async fn test_neutral_vector_matches_returned_dimension() {
    let provider = Arc::new(ScriptedProvider {
        declared_dimension: 4,
        ..ScriptedProvider::failing_batch(&["bad"])
    });
    let embedder = BatchEmbedder::new(provider, Arc::new(EmbeddingCache::default()));

    let out = embedder.embed_all(&texts(&["ok", "bad", "fine"])).await;

    assert!(out.iter().all(|e| e.dimension == 2));
    assert_eq!(out[1], Embedding::zeros(2));
}

#[tokio::test]
async fn test_neutral_vector_uses_declared_dimension_when_nothing_embeds() {
    let provider = Arc::new(ScriptedProvider {
        declared_dimension: 4,
        ..ScriptedProvider::failing_batch(&["a", "b"])
    });
    let embedder = BatchEmbedder::new(provider, Arc::new(EmbeddingCache::default()));

    let out = embedder.embed_all(&texts(&["a", "b"])).await;

    assert_eq!(out, vec![Embedding::zeros(4), Embedding::zeros(4)]);
}
