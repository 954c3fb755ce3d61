//! LRU cache for query embeddings.
//!
//! Batch runs often ask the same question more than once (re-runs, A/B of
//! prompts), so repeated queries skip the embeddings API entirely.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Thread-safe LRU map from query text to its embedding vector.
pub struct QueryEmbeddingCache {
    entries: Mutex<LruCache<String, Vec<f32>>>,
}

impl QueryEmbeddingCache {
    /// Create a cache holding at most `capacity` queries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, Vec<f32>>> {
        // a panic while holding the lock cannot leave the LRU half-updated
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached embedding for `query`, marking it most recently used.
    pub fn get(&self, query: &str) -> Option<Vec<f32>> {
        self.entries().get(query).cloned()
    }

    pub fn put(&self, query: String, embedding: Vec<f32>) {
        self.entries().put(query, embedding);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
