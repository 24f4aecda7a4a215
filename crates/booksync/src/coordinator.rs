//! Counting barrier

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Blocks a supervisor until every registered task has signalled completion
///
/// `register(n)` must happen before any of those `n` tasks can call
/// [`Coordinator::signal_done`]; otherwise a waiter may observe zero early.
/// The counter may accumulate across several `register` calls and be
/// drained by a single [`Coordinator::wait`], after which the coordinator
/// can be reused.
#[derive(Debug, Default)]
pub struct Coordinator {
    pending: Mutex<usize>,
    drained: Condvar,
}

impl Coordinator {
    /// Create a coordinator with nothing pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` tasks to the pending count
    pub fn register(&self, n: usize) {
        let mut pending = self.pending.lock();
        *pending = pending
            .checked_add(n)
            .expect("coordinator counter overflow");
    }

    /// Mark one registered task as finished
    ///
    /// # Panics
    /// If called more times than tasks were registered.
    pub fn signal_done(&self) {
        let mut pending = self.pending.lock();
        if *pending == 0 {
            drop(pending);
            panic!("coordinator: signal_done called with no pending tasks");
        }
        *pending -= 1;
        if *pending == 0 {
            self.drained.notify_all();
        }
    }

    /// Block until the pending count reaches zero
    pub fn wait(&self) {
        let mut pending = self.pending.lock();
        while *pending > 0 {
            self.drained.wait(&mut pending);
        }
    }

    /// Block until the pending count reaches zero or `timeout` elapses
    ///
    /// # Returns
    /// * `true` if drained, `false` on timeout
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut pending = self.pending.lock();
        while *pending > 0 {
            if self.drained.wait_until(&mut pending, deadline).timed_out() {
                return *pending == 0;
            }
        }
        true
    }

    /// Current pending count
    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }
}

/// Owns one registered unit and signals it on drop
///
/// Created after the matching `register` call. A task that panics still
/// releases its unit while unwinding.
#[derive(Debug)]
#[must_use = "dropping the guard signals completion immediately"]
pub struct DoneGuard {
    coordinator: Arc<Coordinator>,
}

impl DoneGuard {
    /// Wrap one already-registered unit of `coordinator`
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }
}

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.coordinator.signal_done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_wait_with_nothing_pending() {
        let coordinator = Coordinator::new();
        coordinator.wait();
        assert!(coordinator.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_register_and_signal() {
        let coordinator = Coordinator::new();
        coordinator.register(2);
        assert_eq!(coordinator.pending(), 2);

        coordinator.signal_done();
        assert!(!coordinator.wait_timeout(Duration::from_millis(10)));

        coordinator.signal_done();
        assert_eq!(coordinator.pending(), 0);
        coordinator.wait();
    }

    #[test]
    #[should_panic(expected = "no pending tasks")]
    fn test_signal_without_register_panics() {
        Coordinator::new().signal_done();
    }

    #[test]
    #[should_panic(expected = "no pending tasks")]
    fn test_over_signal_panics() {
        let coordinator = Coordinator::new();
        coordinator.register(1);
        coordinator.signal_done();
        coordinator.signal_done();
    }

    #[test]
    fn test_wait_blocks_until_all_done() {
        let coordinator = Arc::new(Coordinator::new());
        let finished = Arc::new(AtomicUsize::new(0));
        let tasks = 32;

        for _ in 0..tasks {
            coordinator.register(1);
            let coordinator = Arc::clone(&coordinator);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                let delay = rand::rng().random_range(0..5);
                thread::sleep(Duration::from_millis(delay));
                finished.fetch_add(1, Ordering::SeqCst);
                coordinator.signal_done();
            });
        }

        coordinator.wait();
        assert_eq!(finished.load(Ordering::SeqCst), tasks);
        assert_eq!(coordinator.pending(), 0);
    }

    #[test]
    fn test_accumulate_then_wait_once() {
        let coordinator = Arc::new(Coordinator::new());
        let finished = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            coordinator.register(2);
            for _ in 0..2 {
                let guard = DoneGuard::new(Arc::clone(&coordinator));
                let finished = Arc::clone(&finished);
                thread::spawn(move || {
                    let _guard = guard;
                    thread::sleep(Duration::from_millis(rand::rng().random_range(0..3)));
                    finished.fetch_add(1, Ordering::SeqCst);
                });
            }
        }

        coordinator.wait();
        assert_eq!(finished.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_reuse_after_drain() {
        let coordinator = Arc::new(Coordinator::new());

        for round in 1..=3 {
            coordinator.register(round);
            for _ in 0..round {
                let coordinator = Arc::clone(&coordinator);
                thread::spawn(move || coordinator.signal_done());
            }
            coordinator.wait();
            assert_eq!(coordinator.pending(), 0);
        }
    }

    #[test]
    fn test_concurrent_register() {
        let coordinator = Arc::new(Coordinator::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                thread::spawn(move || {
                    for _ in 0..100 {
                        coordinator.register(3);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(coordinator.pending(), 2400);
    }

    #[test]
    fn test_guard_signals_on_panic() {
        let coordinator = Arc::new(Coordinator::new());
        coordinator.register(1);
        let guard = DoneGuard::new(Arc::clone(&coordinator));

        let result = thread::spawn(move || {
            let _guard = guard;
            panic!("task failed");
        })
        .join();

        assert!(result.is_err());
        assert!(coordinator.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn test_multiple_waiters() {
        let coordinator = Arc::new(Coordinator::new());
        coordinator.register(1);

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                thread::spawn(move || coordinator.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(10));
        coordinator.signal_done();
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }
}
