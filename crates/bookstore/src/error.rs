//! Error types for bookstore

use std::fmt;
use std::io;

/// Result type alias for bookstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or loading a catalog
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(io::Error),

    /// Malformed catalog text, with the 1-based line it was found on
    Parse {
        /// Line number in the catalog text
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Header declared a different number of rows than the body holds
    CountMismatch {
        /// Count from the `name[count]` header
        declared: usize,
        /// Rows actually present
        actual: usize,
    },

    /// Two books share an id
    DuplicateId(u64),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Attach the catalog line a parse error came from
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            Error::Parse { message, .. } => Error::Parse { line, message },
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Parse { line, message } => {
                write!(f, "Parse error on line {}: {}", line, message)
            }
            Error::CountMismatch { declared, actual } => write!(
                f,
                "Catalog declares {} books but contains {}",
                declared, actual
            ),
            Error::DuplicateId(id) => write!(f, "Duplicate book id: {}", id),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        let message = match err {
            nom::Err::Incomplete(_) => "incomplete input".to_string(),
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                format!("{:?} failed at {:?}", e.code, e.input)
            }
        };
        Error::Parse { line: 0, message }
    }
}
