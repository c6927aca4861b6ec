//! Short-TTL key/value cache for verified bearer tokens and prompt
//! embeddings. Connection-failure tolerant: a cache that can't be reached
//! degrades to a transparent miss on read and a no-op on write, so callers
//! never fail a request because of the cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

const DEFAULT_TTL_SECS: u64 = 1_800;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// In-process TTL cache. Stands in for a networked cache (e.g. Redis); the
/// "unreachable" case it's built to tolerate is modeled by [`TtlCache::poisoned`]
/// rather than an actual connection, since there's no external service here.
#[derive(Clone)]
pub struct TtlCache<V: Clone + Send + Sync + 'static> {
    entries: Arc<RwLock<FxHashMap<String, Entry<V>>>>,
    ttl: Duration,
    poisoned: Arc<std::sync::atomic::AtomicBool>,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(FxHashMap::default())),
            ttl,
            poisoned: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }

    /// Simulates the backend going unreachable: reads become misses and
    /// writes become no-ops until `set_available` is called again.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.poisoned
            .store(unavailable, std::sync::atomic::Ordering::SeqCst);
    }

    fn available(&self) -> bool {
        !self.poisoned.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn get(&self, key: &str) -> Option<V> {
        if !self.available() {
            return None;
        }
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.expires_at < Instant::now() {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, key: impl Into<String>, value: V) {
        if !self.available() {
            return;
        }
        self.entries.write().insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.write().remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache key for a verified bearer token.
pub fn token_key(raw_token: &str) -> String {
    format!("token:{raw_token}")
}

/// Cache key for a prompt's embedding, scoped by model so switching models
/// never serves a stale vector of the wrong dimension.
pub fn embedding_key(model: &str, prompt: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let digest = hasher.finalize();
    format!("emb:{model}:{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_retrieves_a_value() {
        let cache: TtlCache<String> = TtlCache::with_default_ttl();
        cache.put("k", "v".to_string());
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn expired_entries_are_treated_as_a_miss() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_millis(1));
        cache.put("k", "v".to_string());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn unavailable_cache_degrades_to_pass_through() {
        let cache: TtlCache<String> = TtlCache::with_default_ttl();
        cache.put("k", "v".to_string());
        cache.set_unavailable(true);
        assert_eq!(cache.get("k"), None);
        cache.put("k2", "v2".to_string());
        cache.set_unavailable(false);
        assert_eq!(cache.get("k2"), None);
    }

    #[test]
    fn embedding_key_differs_by_model() {
        assert_ne!(
            embedding_key("model-a", "hello"),
            embedding_key("model-b", "hello")
        );
    }
}
