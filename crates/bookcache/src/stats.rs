//! Lookup counters for [`crate::BookCache`]
//!
//! Relaxed atomics: the counters are informational and never used for
//! synchronization.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hit, miss and insert counters shared by all cache users
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
}

impl CacheStats {
    /// All counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a `get` that found its book
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a `get` that came back empty
    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a `put`; overwriting an existing id counts again
    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Hits so far
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Misses so far
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Puts so far, overwrites included
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// `get` calls so far, hits and misses together
    pub fn lookups(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Fraction of `get` calls that hit; `0.0` before any lookup
    pub fn hit_ratio(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits() as f64 / lookups as f64,
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.inserts.store(0, Ordering::Relaxed);
    }
}
