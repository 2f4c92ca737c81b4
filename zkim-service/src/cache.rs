//! Content-key cache (§5 resource note: "derived content keys are cached
//! per `fileId` for the lifetime of an in-flight request batch and
//! zeroized on cleanup"). A single `RwLock`-guarded map, the same
//! single-writer-many-readers shape `zkim_core::engine::ContentKey` already
//! implies by being a `Zeroizing<[u8; 32]>`.

use std::collections::HashMap;
use std::sync::RwLock;

use zkim_core::engine::ContentKey;

#[derive(Default)]
pub struct ContentKeyCache {
    keys: RwLock<HashMap<String, ContentKey>>,
}

impl ContentKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_id: &str) -> Option<ContentKey> {
        self.keys.read().unwrap().get(file_id).cloned()
    }

    pub fn insert(&self, file_id: String, key: ContentKey) {
        self.keys.write().unwrap().insert(file_id, key);
    }

    pub fn remove(&self, file_id: &str) {
        // Dropping the Zeroizing value wipes the bytes on its way out.
        self.keys.write().unwrap().remove(file_id);
    }

    pub fn len(&self) -> usize {
        self.keys.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry, zeroizing as each `ContentKey` is dropped.
    pub fn clear(&self) {
        self.keys.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroize::Zeroizing;

    #[test]
    fn insert_get_remove() {
        let cache = ContentKeyCache::new();
        let key: ContentKey = Zeroizing::new([7u8; 32]);
        cache.insert("file-1".to_string(), key);
        assert!(cache.get("file-1").is_some());
        assert_eq!(cache.len(), 1);
        cache.remove("file-1");
        assert!(cache.get("file-1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = ContentKeyCache::new();
        cache.insert("a".to_string(), Zeroizing::new([1u8; 32]));
        cache.insert("b".to_string(), Zeroizing::new([2u8; 32]));
        cache.clear();
        assert!(cache.is_empty());
    }
}
