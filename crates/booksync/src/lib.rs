//! # booksync
//!
//! Blocking coordination primitives for thread fan-out.
//!
//! ## Architecture
//! - **Coordinator**: counting barrier; register work, signal completions, wait for zero
//! - **Channel**: bounded FIFO with blocking send/receive, explicit close and
//!   send-only / receive-only views
//!
//! Misuse (over-signalling, double close, send after close) panics.

#![warn(missing_docs)]

pub mod channel;
mod coordinator;

pub use channel::{bounded, Channel, Receiver, Sender};
pub use coordinator::{Coordinator, DoneGuard};
