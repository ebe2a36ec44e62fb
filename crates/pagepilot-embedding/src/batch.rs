//! Batch embedding with cache lookup and per-item fallback.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use pagepilot_protocols::{Embedding, EmbeddingError, EmbeddingProvider};

use crate::cache::EmbeddingCache;

/// Embeds ordered text lists, one vector per input position.
///
/// Cache hits are served locally; the unique misses go out in a single
/// batched call. If the batch call fails each miss is retried on its own,
/// and a text that still cannot be embedded gets a zero vector. This never
/// fails as a whole.
pub struct BatchEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Arc<EmbeddingCache>,
}

impl BatchEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, cache: Arc<EmbeddingCache>) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    /// Declared by the provider; used for neutral vectors only when no
    /// text in a batch could be embedded.
    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    pub async fn embed_all(&self, texts: &[String]) -> Vec<Embedding> {
        let mut results: Vec<Option<Embedding>> = vec![None; texts.len()];
        let mut misses: Vec<&str> = Vec::new();
        let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();

        for (i, text) in texts.iter().enumerate() {
            if let Some(hit) = self.cache.get(text) {
                results[i] = Some(hit);
                continue;
            }
            positions
                .entry(text.as_str())
                .or_insert_with(|| {
                    misses.push(text.as_str());
                    Vec::new()
                })
                .push(i);
        }

        if !misses.is_empty() {
            let fetched = match self.fetch_batch(&misses).await {
                Ok(embeddings) => {
                    info!(
                        "Batch embedded {} texts, {} from cache",
                        misses.len(),
                        texts.len() - positions.values().map(Vec::len).sum::<usize>()
                    );
                    embeddings.into_iter().map(Some).collect()
                }
                Err(e) => {
                    error!("Batch embedding failed: {}", e);
                    self.fetch_individually(&misses).await
                }
            };

            for (text, embedding) in misses.iter().zip(fetched) {
                let Some(embedding) = embedding else {
                    continue;
                };
                self.cache.put(text, embedding.clone());
                if let Some(slots) = positions.get(text) {
                    for &slot in slots {
                        results[slot] = Some(embedding.clone());
                    }
                }
            }
        }

        // Neutral vectors follow what the provider actually returned
        let dimension = results
            .iter()
            .flatten()
            .map(|e| e.dimension)
            .next()
            .unwrap_or_else(|| self.dimension());
        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| Embedding::zeros(dimension)))
            .collect()
    }

    async fn fetch_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        let embeddings = self.provider.embed_batch(texts).await?;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }
        Ok(embeddings)
    }

    /// `None` marks a text that should fall back to the neutral vector.
    async fn fetch_individually(&self, texts: &[&str]) -> Vec<Option<Embedding>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            match self.provider.embed(text).await {
                Ok(embedding) => out.push(Some(embedding)),
                Err(e) => {
                    warn!("Embedding failed, using neutral vector: {}", e);
                    debug!("Unembeddable text: {:?}", text);
                    out.push(None);
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
