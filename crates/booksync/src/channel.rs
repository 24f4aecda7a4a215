//! Bounded blocking channel
//!
//! A fixed-capacity FIFO shared by any number of producer and consumer
//! threads. [`bounded`] returns a full-capability [`Channel`]; hand a
//! [`Sender`] to producers and a [`Receiver`] to consumers to restrict each
//! side to its direction.
//!
//! ## Semantics
//! - `send` blocks while the buffer holds `capacity` values. With capacity 0
//!   it blocks until a receiver has taken the value.
//! - `recv` returns buffered values even after close, then `None` forever.
//! - Closing is explicit and happens once; dropping handles never closes.
//!
//! Sending on a closed channel and closing twice both panic. A sender that is
//! blocked when the channel closes panics too; for capacity 0 its value is
//! withdrawn first unless a receiver already took it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Error returned by `try_send`, carrying the rejected value
#[derive(PartialEq, Eq, Clone, Copy)]
pub enum TrySendError<T> {
    /// No room without blocking
    Full(T),
    /// The channel is closed
    Closed(T),
}

impl<T> TrySendError<T> {
    /// Take back the value that was not sent
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(value) | TrySendError::Closed(value) => value,
        }
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => f.write_str("Full(..)"),
            TrySendError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => write!(f, "sending on a full channel"),
            TrySendError::Closed(_) => write!(f, "sending on a closed channel"),
        }
    }
}

impl<T> std::error::Error for TrySendError<T> {}

/// Error returned by `try_recv`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// Open but nothing buffered
    Empty,
    /// Closed and drained
    Closed,
}

impl fmt::Display for TryRecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryRecvError::Empty => write!(f, "receiving on an empty channel"),
            TryRecvError::Closed => write!(f, "receiving on a closed channel"),
        }
    }
}

impl std::error::Error for TryRecvError {}

/// Error returned by `recv_timeout`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvTimeoutError {
    /// Nothing arrived before the deadline
    Timeout,
    /// Closed and drained
    Closed,
}

impl fmt::Display for RecvTimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecvTimeoutError::Timeout => write!(f, "timed out waiting on channel"),
            RecvTimeoutError::Closed => write!(f, "receiving on a closed channel"),
        }
    }
}

impl std::error::Error for RecvTimeoutError {}

struct State<T> {
    /// Buffered values tagged with their send ticket
    queue: VecDeque<(u64, T)>,
    closed: bool,
    /// Receivers parked in `recv`/`recv_timeout`
    waiting_receivers: usize,
    /// Next ticket to hand out
    sent: u64,
}

impl<T> State<T> {
    fn push(&mut self, value: T) -> u64 {
        let ticket = self.sent;
        self.sent += 1;
        self.queue.push_back((ticket, value));
        ticket
    }
}

struct Shared<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> Shared<T> {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
                waiting_receivers: 0,
                sent: 0,
            }),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Buffer slots a blocking sender may occupy; a rendezvous channel
    /// parks one in-flight value until a receiver takes it.
    fn slots(&self) -> usize {
        self.capacity.max(1)
    }

    fn send(&self, value: T) {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                drop(state);
                panic!("send on closed channel");
            }
            if state.queue.len() < self.slots() {
                break;
            }
            self.not_full.wait(&mut state);
        }

        let ticket = state.push(value);
        self.not_empty.notify_one();

        if self.capacity == 0 {
            loop {
                let pending = state.queue.iter().position(|(t, _)| *t == ticket);
                let Some(pos) = pending else {
                    return;
                };
                if state.closed {
                    let withdrawn = state.queue.remove(pos);
                    drop(state);
                    drop(withdrawn);
                    panic!("send on closed channel");
                }
                self.not_full.wait(&mut state);
            }
        }
    }

    fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TrySendError::Closed(value));
        }

        // A rendezvous channel carries at most one in-flight value.
        let has_room = if self.capacity == 0 {
            state.queue.is_empty() && state.waiting_receivers > 0
        } else {
            state.queue.len() < self.capacity
        };
        if !has_room {
            return Err(TrySendError::Full(value));
        }

        state.push(value);
        self.not_empty.notify_one();
        Ok(())
    }

    fn take(&self, state: &mut State<T>) -> Option<T> {
        let (_, value) = state.queue.pop_front()?;
        // Wakes both room waiters and rendezvous senders watching their ticket.
        self.not_full.notify_all();
        Some(value)
    }

    fn recv(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(value) = self.take(&mut state) {
                return Some(value);
            }
            if state.closed {
                return None;
            }
            state.waiting_receivers += 1;
            self.not_empty.wait(&mut state);
            state.waiting_receivers -= 1;
        }
    }

    fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut state = self.state.lock();
        match self.take(&mut state) {
            Some(value) => Ok(value),
            None if state.closed => Err(TryRecvError::Closed),
            None => Err(TryRecvError::Empty),
        }
    }

    fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(value) = self.take(&mut state) {
                return Ok(value);
            }
            if state.closed {
                return Err(RecvTimeoutError::Closed);
            }
            if Instant::now() >= deadline {
                return Err(RecvTimeoutError::Timeout);
            }
            state.waiting_receivers += 1;
            self.not_empty.wait_until(&mut state, deadline);
            state.waiting_receivers -= 1;
        }
    }

    fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            drop(state);
            panic!("close of closed channel");
        }
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// Create a channel buffering up to `capacity` values
///
/// Capacity 0 makes every send a rendezvous with a receiver.
pub fn bounded<T>(capacity: usize) -> Channel<T> {
    Channel {
        shared: Arc::new(Shared::new(capacity)),
    }
}

/// Full-capability handle to a channel
pub struct Channel<T> {
    shared: Arc<Shared<T>>,
}

/// Send-only view of a channel
pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

/// Receive-only view of a channel
pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

macro_rules! handle_common {
    ($handle:ident) => {
        impl<T> Clone for $handle<T> {
            fn clone(&self) -> Self {
                Self {
                    shared: Arc::clone(&self.shared),
                }
            }
        }

        impl<T> fmt::Debug for $handle<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let state = self.shared.state.lock();
                f.debug_struct(stringify!($handle))
                    .field("capacity", &self.shared.capacity)
                    .field("len", &state.queue.len())
                    .field("closed", &state.closed)
                    .finish()
            }
        }

        impl<T> $handle<T> {
            /// Number of buffered values
            pub fn len(&self) -> usize {
                self.shared.len()
            }

            /// Check if nothing is buffered
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Maximum number of buffered values
            pub fn capacity(&self) -> usize {
                self.shared.capacity
            }

            /// Check if the channel has been closed
            pub fn is_closed(&self) -> bool {
                self.shared.is_closed()
            }
        }
    };
}

handle_common!(Channel);
handle_common!(Sender);
handle_common!(Receiver);

impl<T> Channel<T> {
    /// Send a value, blocking while the buffer is full
    ///
    /// # Panics
    /// If the channel is closed before the value is accepted.
    pub fn send(&self, value: T) {
        self.shared.send(value)
    }

    /// Send without blocking
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.shared.try_send(value)
    }

    /// Receive the oldest value, blocking while open and empty
    ///
    /// # Returns
    /// * `None` once the channel is closed and drained
    pub fn recv(&self) -> Option<T> {
        self.shared.recv()
    }

    /// Receive without blocking
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.shared.try_recv()
    }

    /// Receive, giving up after `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.shared.recv_timeout(timeout)
    }

    /// Close the channel
    ///
    /// # Panics
    /// If the channel is already closed.
    pub fn close(&self) {
        self.shared.close()
    }

    /// Iterate over received values until closed and drained
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            shared: &self.shared,
        }
    }

    /// Send-only view sharing this channel
    pub fn sender(&self) -> Sender<T> {
        Sender {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Receive-only view sharing this channel
    pub fn receiver(&self) -> Receiver<T> {
        Receiver {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Split into one send-only and one receive-only view
    pub fn split(self) -> (Sender<T>, Receiver<T>) {
        let receiver = self.receiver();
        (Sender { shared: self.shared }, receiver)
    }
}

impl<T> Sender<T> {
    /// Send a value, blocking while the buffer is full
    ///
    /// # Panics
    /// If the channel is closed before the value is accepted.
    pub fn send(&self, value: T) {
        self.shared.send(value)
    }

    /// Send without blocking
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.shared.try_send(value)
    }

    /// Close the channel; receivers drain what is buffered, then stop
    ///
    /// # Panics
    /// If the channel is already closed.
    pub fn close(&self) {
        self.shared.close()
    }
}

impl<T> Receiver<T> {
    /// Receive the oldest value, blocking while open and empty
    ///
    /// # Returns
    /// * `None` once the channel is closed and drained
    pub fn recv(&self) -> Option<T> {
        self.shared.recv()
    }

    /// Receive without blocking
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.shared.try_recv()
    }

    /// Receive, giving up after `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.shared.recv_timeout(timeout)
    }

    /// Iterate over received values until closed and drained
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            shared: &self.shared,
        }
    }
}

/// Borrowing iterator returned by `iter`
pub struct Iter<'a, T> {
    shared: &'a Shared<T>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.shared.recv()
    }
}

/// Owning iterator over a [`Receiver`]
pub struct IntoIter<T> {
    receiver: Receiver<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.receiver.recv()
    }
}

impl<T> IntoIterator for Receiver<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter { receiver: self }
    }
}

impl<'a, T> IntoIterator for &'a Receiver<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
