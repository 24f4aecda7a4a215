//! Concurrent book cache
//!
//! The lock lives inside [`BookCache`]; callers never see it. `get` takes
//! shared access and `put` exclusive access, each only for the map operation
//! itself.

use std::collections::HashMap;

use ahash::RandomState;
use bookstore::Book;
use parking_lot::RwLock;

use crate::stats::CacheStats;

/// Id to book map safe to share across threads
///
/// Entries are only ever copies of store records and are never evicted.
#[derive(Debug, Default)]
pub struct BookCache {
    entries: RwLock<HashMap<u64, Book, RandomState>>,
    stats: CacheStats,
}

impl BookCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache sized for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity_and_hasher(
                capacity,
                RandomState::new(),
            )),
            stats: CacheStats::new(),
        }
    }

    /// Get a copy of the cached book
    ///
    /// # Returns
    /// * `None` on a miss
    pub fn get(&self, id: u64) -> Option<Book> {
        let book = self.entries.read().get(&id).cloned();

        match book {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        book
    }

    /// Insert or overwrite the entry for `id`
    pub fn put(&self, id: u64, book: Book) {
        debug_assert_eq!(id, book.id, "cache key must match the book id");

        self.entries.write().insert(id, book);
        self.stats.record_insert();
    }

    /// Check for an entry without touching statistics
    pub fn contains(&self, id: u64) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Get the number of cached books
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
