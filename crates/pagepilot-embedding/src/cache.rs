//! Content-addressed embedding cache.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use pagepilot_protocols::Embedding;

pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Stable key for a text. Case-sensitive, no normalisation.
pub fn cache_key(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Bounded map from text hash to embedding with oldest-first eviction.
///
/// Concurrent writers of the same key are harmless: the value for a given
/// text is deterministic, so the last write wins with the same vector.
pub struct EmbeddingCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, Embedding>,
    order: VecDeque<String>,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn get(&self, text: &str) -> Option<Embedding> {
        let key = cache_key(text);
        self.inner.lock().entries.get(&key).cloned()
    }

    pub fn put(&self, text: &str, embedding: Embedding) {
        let key = cache_key(text);
        let mut inner = self.inner.lock();

        if inner.entries.insert(key.clone(), embedding).is_none() {
            inner.order.push_back(key);
        }

        while inner.entries.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
