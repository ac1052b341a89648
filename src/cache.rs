/// Memoization of workbook analyses keyed by upload content
///
/// Uploading the same bytes again returns the cached analysis. A different
/// upload gets its own key; the least recently used entry is evicted once
/// the cache is full.
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Hex SHA-256 of the uploaded bytes, used as the workbook id
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub struct AnalysisCache<V> {
    entries: Mutex<LruCache<String, Arc<V>>>,
}

impl<V> AnalysisCache<V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<V>>> {
        // Entries are only ever inserted whole, so a poisoned lock still holds valid data
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached analysis for a workbook id, marking it recently used
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let hit = self.lock().get(key).cloned();
        debug!("Analysis cache {} for {}", if hit.is_some() { "hit" } else { "miss" }, key);
        hit
    }

    /// Store an analysis, returning the shared handle
    pub fn insert(&self, key: String, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if let Some(evicted) = self.store(key, Arc::clone(&value)) {
            debug!("Analysis cache evicted {}", evicted);
        }
        value
    }

    /// Push an entry, returning the key pushed out to make room
    ///
    /// Replacing the value of an existing key evicts nothing.
    fn store(&self, key: String, value: Arc<V>) -> Option<String> {
        let (old_key, _) = self.lock().push(key.clone(), value)?;
        (old_key != key).then_some(old_key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
