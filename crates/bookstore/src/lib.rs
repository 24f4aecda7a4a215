//! # bookstore
//!
//! Immutable book catalog that sits behind the lookup cache.
//!
//! ## Contents
//! - [`Book`]: the record type
//! - [`BookStore`]: ordered, read-only collection with an id index
//! - [`parser`]: TOON-style catalog text loader

#![warn(missing_docs)]

mod book;
mod error;
pub mod parser;
mod store;

pub use book::Book;
pub use error::{Error, Result};
pub use store::BookStore;
