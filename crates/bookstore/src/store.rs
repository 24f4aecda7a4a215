//! Read-only record store
//!
//! The store is built once and never mutated. Books keep their catalog order
//! for [`BookStore::all`], and an id index backs [`BookStore::find`].

use std::collections::HashMap;
use std::path::Path;

use ahash::RandomState;

use crate::book::Book;
use crate::error::{Error, Result};
use crate::parser::parse_catalog;

const SAMPLE: [(u64, &str, &str, u16); 10] = [
    (1, "The Hitchhiker's Guide to the Galaxy", "Douglas Adams", 1979),
    (2, "The Hobbit", "J.R.R. Tolkien", 1937),
    (3, "A Tale of Two Cities", "Charles Dickens", 1859),
    (4, "Harry Potter and the Philosopher's Stone", "J.K. Rowling", 1997),
    (5, "Les Misérables", "Victor Hugo", 1862),
    (6, "I, Robot", "Isaac Asimov", 1950),
    (7, "The Gods Themselves", "Isaac Asimov", 1972),
    (8, "The Moon Is a Harsh Mistress", "Robert A. Heinlein", 1966),
    (9, "On Basilisk Station", "David Weber", 1993),
    (10, "The Android's Dream", "John Scalzi", 2006),
];

/// Immutable, ordered collection of books
#[derive(Debug, Clone)]
pub struct BookStore {
    books: Vec<Book>,
    index: HashMap<u64, usize, RandomState>,
}

impl BookStore {
    /// Build a store from books in catalog order
    ///
    /// # Returns
    /// * `Result<BookStore>` - `Error::DuplicateId` if two books share an id
    pub fn new(books: Vec<Book>) -> Result<Self> {
        let mut index = HashMap::with_capacity_and_hasher(books.len(), RandomState::new());
        for (pos, book) in books.iter().enumerate() {
            if index.insert(book.id, pos).is_some() {
                return Err(Error::DuplicateId(book.id));
            }
        }

        Ok(Self { books, index })
    }

    /// The fixed ten-book catalog with ids `1..=10`
    pub fn sample() -> Self {
        let books: Vec<Book> = SAMPLE
            .iter()
            .map(|&(id, title, author, year)| Book::new(id, title, author, year))
            .collect();
        let index = books
            .iter()
            .enumerate()
            .map(|(pos, book)| (book.id, pos))
            .collect();

        Self { books, index }
    }

    /// Build a store from catalog text
    pub fn parse(text: &str) -> Result<Self> {
        Self::new(parse_catalog(text)?)
    }

    /// Load a catalog file
    ///
    /// # Arguments
    /// * `path` - Path to a catalog in the format described in [`crate::parser`]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Every book, in catalog order
    pub fn all(&self) -> &[Book] {
        &self.books
    }

    /// Find a book by id through the index
    pub fn find(&self, id: u64) -> Option<&Book> {
        self.index.get(&id).map(|&pos| &self.books[pos])
    }

    /// Find a book by id with a linear scan
    ///
    /// Same answer as [`BookStore::find`]; kept for callers that model a
    /// table scan.
    pub fn scan(&self, id: u64) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    /// Ids in catalog order
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.books.iter().map(|book| book.id)
    }

    /// Get the number of books
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sample() {
        let store = BookStore::sample();

        assert_eq!(store.len(), 10);
        assert_eq!(store.ids().collect::<Vec<_>>(), (1..=10).collect::<Vec<_>>());
        assert_eq!(store.find(2).unwrap().title, "The Hobbit");
        assert!(store.find(11).is_none());
    }

    #[test]
    fn test_find_matches_scan() {
        let store = BookStore::sample();

        for id in 0..=12 {
            assert_eq!(store.find(id), store.scan(id));
        }
    }

    #[test]
    fn test_keeps_order() {
        let books = vec![
            Book::new(9, "B", "Y", 2001),
            Book::new(3, "A", "X", 2000),
        ];
        let store = BookStore::new(books.clone()).unwrap();

        assert_eq!(store.all(), books.as_slice());
    }

    #[test]
    fn test_duplicate_id() {
        let books = vec![
            Book::new(1, "A", "X", 2000),
            Book::new(1, "B", "Y", 2001),
        ];

        assert!(matches!(BookStore::new(books), Err(Error::DuplicateId(1))));
    }

    #[test]
    fn test_empty() {
        let store = BookStore::new(Vec::new()).unwrap();

        assert!(store.is_empty());
        assert!(store.find(1).is_none());
    }

    #[test]
    fn test_open() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "books[2]{{id,title,author,published_year}}:").unwrap();
        writeln!(file, "  1,\"I, Robot\",Isaac Asimov,1950").unwrap();
        writeln!(file, "  2,The Hobbit,J.R.R. Tolkien,1937").unwrap();
        file.flush().unwrap();

        let store = BookStore::open(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.find(1).unwrap().title, "I, Robot");
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = BookStore::open(dir.path().join("missing.toon"));

        assert!(matches!(result, Err(Error::Io(_))));
    }
}
