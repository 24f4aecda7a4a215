//! Fan-out driver
//!
//! For every requested id the [`Supervisor`] starts two racing tasks: a cache
//! probe and a backing-store lookup. Both are registered with one shared
//! [`Coordinator`] before they are spawned and report through a channel, so a
//! single collector sees every outcome without interleaving.

use std::fmt;
use std::sync::Arc;
use std::thread;

use bookstore::{Book, BookStore};
use booksync::{bounded, Coordinator, DoneGuard, Sender};
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::BookCache;
use crate::lookup::{BackingLookup, LookupConfig};

/// Where an answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// The in-memory cache
    Cache,
    /// The slow backing store
    Database,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Cache => write!(f, "cache"),
            Source::Database => write!(f, "database"),
        }
    }
}

/// Result of one probe task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Requested id
    pub id: u64,
    /// Which task produced this
    pub source: Source,
    /// The book, if that source had it
    pub book: Option<Book>,
}

impl Outcome {
    /// Check if the probe found the book
    pub fn is_hit(&self) -> bool {
        self.book.is_some()
    }
}

/// Supervisor settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Backing store latency
    pub lookup: LookupConfig,
    /// Buffer size of the outcome channel used by [`Supervisor::run`]
    pub channel_capacity: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            lookup: LookupConfig::default(),
            channel_capacity: 16,
        }
    }
}

/// Owns the cache, the lookup path and the coordinator for a run
#[derive(Debug)]
pub struct Supervisor {
    cache: Arc<BookCache>,
    lookup: Arc<BackingLookup>,
    coordinator: Arc<Coordinator>,
    config: SupervisorConfig,
}

impl Supervisor {
    /// Create a supervisor with an empty cache in front of `store`
    pub fn new(store: Arc<BookStore>, config: SupervisorConfig) -> Self {
        let cache = Arc::new(BookCache::with_capacity(store.len()));
        let lookup = Arc::new(BackingLookup::new(
            store,
            Arc::clone(&cache),
            config.lookup,
        ));

        Self {
            cache,
            lookup,
            coordinator: Arc::new(Coordinator::new()),
            config,
        }
    }

    /// Start the cache probe and the backing lookup for `id`
    ///
    /// Both tasks are registered with the coordinator before either is
    /// spawned. Each sends exactly one [`Outcome`] to `outcomes`, so the
    /// channel must stay open until [`Supervisor::wait`] returns.
    pub fn dispatch(&self, id: u64, outcomes: &Sender<Outcome>) {
        self.coordinator.register(2);

        let cache = Arc::clone(&self.cache);
        let sender = outcomes.clone();
        let guard = DoneGuard::new(Arc::clone(&self.coordinator));
        thread::spawn(move || {
            let _guard = guard;
            let book = cache.get(id);
            debug!(id, hit = book.is_some(), "cache probe finished");
            sender.send(Outcome {
                id,
                source: Source::Cache,
                book,
            });
        });

        let lookup = Arc::clone(&self.lookup);
        let sender = outcomes.clone();
        let guard = DoneGuard::new(Arc::clone(&self.coordinator));
        thread::spawn(move || {
            let _guard = guard;
            let book = lookup.lookup(id);
            sender.send(Outcome {
                id,
                source: Source::Database,
                book,
            });
        });
    }

    /// Block until every dispatched task has finished
    pub fn wait(&self) {
        self.coordinator.wait();
    }

    /// Dispatch every id, wait once, and collect all outcomes
    ///
    /// Outcomes arrive in completion order, two per id.
    pub fn run<I>(&self, ids: I) -> Vec<Outcome>
    where
        I: IntoIterator<Item = u64>,
    {
        let (sender, receiver) = bounded(self.config.channel_capacity).split();
        let collector = thread::spawn(move || receiver.into_iter().collect::<Vec<Outcome>>());

        let mut requests = 0usize;
        for id in ids {
            self.dispatch(id, &sender);
            requests += 1;
        }

        self.wait();
        sender.close();

        let outcomes = match collector.join() {
            Ok(outcomes) => outcomes,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        let hits = outcomes.iter().filter(|outcome| outcome.is_hit()).count();
        info!(
            requests,
            outcomes = outcomes.len(),
            hits,
            cached = self.cache.len(),
            "batch complete"
        );
        outcomes
    }

    /// The shared cache
    pub fn cache(&self) -> &BookCache {
        &self.cache
    }

    /// The backing lookup path
    pub fn lookup(&self) -> &BackingLookup {
        &self.lookup
    }

    /// The coordinator joining dispatched tasks
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Settings this supervisor was built with
    pub fn config(&self) -> SupervisorConfig {
        self.config
    }
}
