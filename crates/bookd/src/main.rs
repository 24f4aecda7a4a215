//! BookCache demo - races cache probes against a slow backing store

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bookcache::{LookupConfig, Outcome, Supervisor, SupervisorConfig};
use bookstore::BookStore;
use clap::Parser;
use rand::Rng;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of lookups to issue
    #[arg(short = 'n', long, default_value_t = 10)]
    requests: usize,

    /// Ids are drawn uniformly from 1..=MAX_ID
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    max_id: u64,

    /// Backing store latency in milliseconds
    #[arg(short, long, default_value_t = 100)]
    latency_ms: u64,

    /// Extra random latency in milliseconds
    #[arg(short, long, default_value_t = 0)]
    jitter_ms: u64,

    /// Outcome channel capacity (0 = rendezvous)
    #[arg(long, default_value_t = 16)]
    channel_capacity: usize,

    /// Catalog file (defaults to the built-in sample)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print every outcome as a JSON line instead of the hits as text
    #[arg(long)]
    json: bool,
}

impl Args {
    fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            lookup: LookupConfig {
                latency: Duration::from_millis(self.latency_ms),
                jitter: Duration::from_millis(self.jitter_ms),
            },
            channel_capacity: self.channel_capacity,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting bookd v{}", env!("CARGO_PKG_VERSION"));

    let store = match &args.catalog {
        Some(path) => BookStore::open(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => BookStore::sample(),
    };
    info!("Catalog loaded: {} books", store.len());

    let supervisor = Supervisor::new(Arc::new(store), args.supervisor_config());
    let ids = request_ids(&mut rand::rng(), args.requests, args.max_id);
    info!("Dispatching {} requests", ids.len());

    let started = Instant::now();
    let outcomes = supervisor.run(ids);

    for outcome in &outcomes {
        print_outcome(outcome, args.json)?;
    }

    let stats = supervisor.cache().stats();
    info!(
        elapsed = ?started.elapsed(),
        hits = stats.hits(),
        misses = stats.misses(),
        hit_ratio = stats.hit_ratio(),
        cached = supervisor.cache().len(),
        "Run finished"
    );

    Ok(())
}

fn request_ids<R: Rng>(rng: &mut R, count: usize, max_id: u64) -> Vec<u64> {
    (0..count).map(|_| rng.random_range(1..=max_id)).collect()
}

fn print_outcome(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(outcome)?);
    } else if let Some(book) = &outcome.book {
        println!("from {}", outcome.source);
        println!("{}\n", book);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["bookd"]).unwrap();
        let config = args.supervisor_config();

        assert_eq!(args.requests, 10);
        assert_eq!(config.lookup.latency, Duration::from_millis(100));
        assert_eq!(config.lookup.jitter, Duration::ZERO);
        assert_eq!(config.channel_capacity, 16);
        assert!(args.catalog.is_none());
    }

    #[test]
    fn test_rejects_zero_max_id() {
        assert!(Args::try_parse_from(["bookd", "--max-id", "0"]).is_err());
    }

    #[test]
    fn test_request_ids_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let ids = request_ids(&mut rng, 500, 10);

        assert_eq!(ids.len(), 500);
        assert!(ids.iter().all(|id| (1..=10).contains(id)));
    }

    #[test]
    fn test_json_outcome() {
        let outcome = Outcome {
            id: 2,
            source: bookcache::Source::Database,
            book: BookStore::sample().find(2).cloned(),
        };
        let line = serde_json::to_string(&outcome).unwrap();

        assert!(line.starts_with(r#"{"id":2,"source":"database","book":{"id":2,"title":"The Hobbit""#));
    }
}
