//! Slow path behind the cache
//!
//! [`BackingLookup`] simulates a slow database: it sleeps, scans the store,
//! and copies any hit into the cache before returning it. The sleep happens
//! before any lock is taken. Concurrent lookups of the same id are not
//! collapsed; the duplicate `put`s write equal values.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bookstore::{Book, BookStore};
use rand::Rng;
use tracing::debug;

use crate::cache::BookCache;

/// Simulated latency of the backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupConfig {
    /// Fixed delay applied to every lookup
    pub latency: Duration,
    /// Extra random delay, drawn uniformly from `0..=jitter`
    pub jitter: Duration,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(100),
            jitter: Duration::ZERO,
        }
    }
}

impl LookupConfig {
    /// No simulated latency at all
    pub fn immediate() -> Self {
        Self {
            latency: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Delay for one lookup
    pub fn delay(&self) -> Duration {
        if self.jitter.is_zero() {
            self.latency
        } else {
            self.latency + rand::rng().random_range(Duration::ZERO..=self.jitter)
        }
    }
}

/// Read-through path from the store into the cache
#[derive(Debug)]
pub struct BackingLookup {
    store: Arc<BookStore>,
    cache: Arc<BookCache>,
    config: LookupConfig,
    scans: AtomicU64,
}

impl BackingLookup {
    /// Create a lookup that fills `cache` from `store`
    pub fn new(store: Arc<BookStore>, cache: Arc<BookCache>, config: LookupConfig) -> Self {
        Self {
            store,
            cache,
            config,
            scans: AtomicU64::new(0),
        }
    }

    /// Look up a book in the store, caching it on a hit
    ///
    /// # Returns
    /// * `None` if the store has no such id; the cache is left untouched
    pub fn lookup(&self, id: u64) -> Option<Book> {
        let delay = self.config.delay();
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        self.scans.fetch_add(1, Ordering::Relaxed);
        let book = self.store.scan(id).cloned();

        match &book {
            Some(book) => {
                self.cache.put(id, book.clone());
                debug!(id, ?delay, "backing store hit, cached");
            }
            None => debug!(id, ?delay, "backing store miss"),
        }
        book
    }

    /// Number of store scans performed so far
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// The store being scanned
    pub fn store(&self) -> &BookStore {
        &self.store
    }

    /// The cache being filled
    pub fn cache(&self) -> &BookCache {
        &self.cache
    }

    /// Latency settings
    pub fn config(&self) -> LookupConfig {
        self.config
    }
}
