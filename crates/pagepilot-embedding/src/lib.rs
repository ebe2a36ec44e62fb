//! Embedding layer for PagePilot.
//!
//! Turns element texts into vectors for relevance ranking. Remote calls are
//! batched and memoised in a process-wide, bounded cache.

mod batch;
mod cache;
mod hash;
mod remote;

pub use batch::BatchEmbedder;
pub use cache::{cache_key, EmbeddingCache, DEFAULT_CACHE_CAPACITY};
pub use hash::HashEmbedding;
pub use remote::{HttpEmbedding, HttpEmbeddingConfig, VOYAGE_DIMENSION};
