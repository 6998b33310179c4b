//! Lookup cache for plain tokens.

use std::sync::{Mutex, MutexGuard};

use ahash::AHashMap;

/// Posting location of a token, as remembered by a [`TokenCache`].
///
/// A `size` of 0 records a token that is not in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedTerm {
    pub size: u32,
    pub pointer: u64,
}

/// Cache of exact-token lookups, shared by all queries of an index.
///
/// Only consulted for plain tokens; wildcard and fuzzy queries always walk the trie.
pub trait TokenCache: Send + Sync {
    fn lookup(&self, token: &[u8]) -> Option<CachedTerm>;

    fn insert(&self, token: &[u8], term: CachedTerm);

    fn clear(&self);
}

/// Default [`TokenCache`]: a hash map holding up to `capacity` tokens.
///
/// When full, the map is emptied before the next insertion. A capacity of 0 disables
/// caching.
pub struct BoundedTokenCache {
    capacity: usize,
    entries: Mutex<AHashMap<Vec<u8>, CachedTerm>>,
}

impl BoundedTokenCache {
    pub fn new(capacity: usize) -> BoundedTokenCache {
        BoundedTokenCache {
            capacity,
            entries: Default::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, AHashMap<Vec<u8>, CachedTerm>> {
        // entries are plain values, a panic elsewhere cannot leave them half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenCache for BoundedTokenCache {
    fn lookup(&self, token: &[u8]) -> Option<CachedTerm> {
        self.entries().get(token).copied()
    }

    fn insert(&self, token: &[u8], term: CachedTerm) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries();
        if entries.len() >= self.capacity && !entries.contains_key(token) {
            log::trace!("token cache full ({} entries), clearing", entries.len());
            entries.clear();
        }
        entries.insert(token.to_vec(), term);
    }

    fn clear(&self) {
        self.entries().clear();
    }
}

impl std::fmt::Debug for BoundedTokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedTokenCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIT: CachedTerm = CachedTerm {
        size: 3,
        pointer: 40,
    };

    #[test]
    fn test_lookup_and_insert() {
        let cache = BoundedTokenCache::new(4);
        assert!(cache.lookup(b"cat").is_none());
        cache.insert(b"cat", HIT);
        cache.insert(b"dog", CachedTerm { size: 0, pointer: 0 });
        assert_eq!(cache.lookup(b"cat"), Some(HIT));
        assert_eq!(cache.lookup(b"dog").map(|t| t.size), Some(0));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bounded() {
        let cache = BoundedTokenCache::new(2);
        cache.insert(b"a", HIT);
        cache.insert(b"b", HIT);
        cache.insert(b"b", HIT);
        assert_eq!(cache.len(), 2);
        cache.insert(b"c", HIT);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(b"c"), Some(HIT));
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = BoundedTokenCache::new(0);
        cache.insert(b"a", HIT);
        assert!(cache.lookup(b"a").is_none());
    }
}
