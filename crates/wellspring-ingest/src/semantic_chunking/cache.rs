//! In-memory content-hash cache so re-chunking identical source text is a
//! cache hit instead of a re-run through segmentation and embedding.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};

use super::types::SemanticChunk;

fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Clone, Default)]
pub struct ChunkCache {
    entries: Arc<RwLock<FxHashMap<String, Vec<SemanticChunk>>>>,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns previously-chunked output for this exact source text, if any.
    pub fn get(&self, text: &str) -> Option<Vec<SemanticChunk>> {
        self.entries.read().get(&content_hash(text)).cloned()
    }

    pub fn put(&self, text: &str, chunks: Vec<SemanticChunk>) {
        self.entries.write().insert(content_hash(text), chunks);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic_chunking::types::ChunkMetadata;

    #[test]
    fn cache_hit_returns_prior_chunks() {
        let cache = ChunkCache::new();
        let chunks = vec![SemanticChunk::new("hello", 1, ChunkMetadata::default())];
        cache.put("hello world", chunks.clone());
        let hit = cache.get("hello world").unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].content, "hello");
    }

    #[test]
    fn cache_miss_on_different_text() {
        let cache = ChunkCache::new();
        cache.put("hello world", vec![]);
        assert!(cache.get("something else").is_none());
    }
}
