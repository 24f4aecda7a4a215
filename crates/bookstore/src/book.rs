//! Book record

use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable catalog entry keyed by `id`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Book {
    /// Unique key within a catalog
    pub id: u64,
    /// Book title
    pub title: String,
    /// Author name
    pub author: String,
    /// Year of first publication
    pub published_year: u16,
}

impl Book {
    /// Create a book record
    pub fn new(
        id: u64,
        title: impl Into<String>,
        author: impl Into<String>,
        published_year: u16,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            published_year,
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title:     {:?}", self.title)?;
        writeln!(f, "Author:    {:?}", self.author)?;
        write!(f, "Published: {}", self.published_year)
    }
}
