//! # bookcache
//!
//! Read-through cache in front of a [`bookstore::BookStore`].
//!
//! ## Architecture
//! - **BookCache**: `RwLock`-guarded AHash map; shared reads, exclusive writes
//! - **BackingLookup**: slow store scan that fills the cache on a hit
//! - **Supervisor**: per id, races a cache probe against a backing lookup,
//!   joins them with a [`booksync::Coordinator`] and collects results over a
//!   [`booksync::Channel`]
//!
//! Entries are never evicted; a miss is `None`, not an error.

#![warn(missing_docs)]

mod cache;
mod lookup;
mod stats;
mod supervisor;

pub use cache::BookCache;
pub use lookup::{BackingLookup, LookupConfig};
pub use stats::CacheStats;
pub use supervisor::{Outcome, Source, Supervisor, SupervisorConfig};
