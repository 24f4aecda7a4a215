//! Catalog parser using nom
//!
//! Catalogs use a TOON-style layout: one header naming the collection, the
//! row count and the field order, then one comma-separated row per book.
//!
//! ```text
//! books[2]{id,title,author,published_year}:
//!   1,"I, Robot",Isaac Asimov,1950
//!   2,The Hobbit,J.R.R. Tolkien,1937
//! ```
//!
//! Values containing commas must be double-quoted. Blank lines and lines
//! starting with `#` are skipped.

use nom::{
    branch::alt,
    bytes::complete::{take_until, take_while, take_while1},
    character::complete::{char, digit1, space0},
    combinator::{all_consuming, map, map_res},
    multi::separated_list1,
    sequence::{delimited, tuple},
    IResult,
};

use tracing::warn;

use crate::book::Book;
use crate::error::{Error, Result};

/// Field order every catalog header must declare
pub const BOOK_FIELDS: [&str; 4] = ["id", "title", "author", "published_year"];

/// Parsed `collection[count]{fields}:` header
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogHeader<'a> {
    /// Collection name, informational only
    pub collection: &'a str,
    /// Declared number of rows
    pub count: usize,
    /// Declared field order
    pub fields: Vec<&'a str>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

/// Parse a catalog header line
pub fn parse_header(input: &str) -> IResult<&str, CatalogHeader<'_>> {
    let (rest, (collection, count, fields, _)) = tuple((
        identifier,
        delimited(
            char('['),
            map_res(digit1, |digits: &str| digits.parse::<usize>()),
            char(']'),
        ),
        delimited(char('{'), separated_list1(char(','), identifier), char('}')),
        char(':'),
    ))(input)?;

    Ok((
        rest,
        CatalogHeader {
            collection,
            count,
            fields,
        },
    ))
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_until("\""), char('"'))(input)
}

fn bare(input: &str) -> IResult<&str, &str> {
    map(take_while(|c: char| c != ',' && c != '"'), str::trim)(input)
}

/// Parse one row into its raw field values
pub fn parse_row(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(char(','), delimited(space0, alt((quoted, bare)), space0))(input)
}

fn book_from_values(line: usize, values: &[&str]) -> Result<Book> {
    let [id, title, author, year] = values else {
        return Err(Error::parse(
            line,
            format!(
                "expected {} fields, found {}",
                BOOK_FIELDS.len(),
                values.len()
            ),
        ));
    };

    if let Some(pos) = values.iter().position(|value| value.is_empty()) {
        return Err(Error::parse(
            line,
            format!("empty field {} ({})", pos + 1, BOOK_FIELDS[pos]),
        ));
    }

    let id = id
        .parse::<u64>()
        .map_err(|e| Error::parse(line, format!("invalid id {:?}: {}", id, e)))?;
    let published_year = year
        .parse::<u16>()
        .map_err(|e| Error::parse(line, format!("invalid year {:?}: {}", year, e)))?;

    Ok(Book::new(id, *title, *author, published_year))
}

/// Parse a whole catalog into books, in file order
pub fn parse_catalog(text: &str) -> Result<Vec<Book>> {
    parse_books(text).inspect_err(|err| warn!(error = %err, "catalog rejected"))
}

fn parse_books(text: &str) -> Result<Vec<Book>> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let (header_line, header_text) = lines
        .next()
        .ok_or_else(|| Error::parse(1, "missing catalog header"))?;

    let (_, header) = all_consuming(parse_header)(header_text)
        .map_err(|e| Error::from(e).at_line(header_line))?;

    if header.fields != BOOK_FIELDS {
        return Err(Error::parse(
            header_line,
            format!(
                "expected fields {{{}}}, found {{{}}}",
                BOOK_FIELDS.join(","),
                header.fields.join(",")
            ),
        ));
    }

    let mut books = Vec::with_capacity(header.count);
    for (line, row) in lines {
        let (_, values) =
            all_consuming(parse_row)(row).map_err(|e| Error::from(e).at_line(line))?;
        books.push(book_from_values(line, &values)?);
    }

    if books.len() != header.count {
        return Err(Error::CountMismatch {
            declared: header.count,
            actual: books.len(),
        });
    }

    Ok(books)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let (rest, header) = parse_header("books[10]{id,title,author,published_year}:").unwrap();

        assert!(rest.is_empty());
        assert_eq!(header.collection, "books");
        assert_eq!(header.count, 10);
        assert_eq!(header.fields, BOOK_FIELDS);
    }

    #[test]
    fn test_parse_header_missing_colon() {
        assert!(all_consuming(parse_header)("books[1]{id}").is_err());
    }

    #[test]
    fn test_parse_row_quoted() {
        let (rest, values) = parse_row(r#"6, "I, Robot" ,Isaac Asimov,1950"#).unwrap();

        assert!(rest.is_empty());
        assert_eq!(values, vec!["6", "I, Robot", "Isaac Asimov", "1950"]);
    }

    #[test]
    fn test_parse_catalog() {
        let text = "\
# sample
books[2]{id,title,author,published_year}:
  1,\"I, Robot\",Isaac Asimov,1950

  2,The Hobbit,J.R.R. Tolkien,1937
";
        let books = parse_catalog(text).unwrap();

        assert_eq!(books.len(), 2);
        assert_eq!(books[0], Book::new(1, "I, Robot", "Isaac Asimov", 1950));
        assert_eq!(books[1], Book::new(2, "The Hobbit", "J.R.R. Tolkien", 1937));
    }

    #[test]
    fn test_parse_catalog_count_mismatch() {
        let text = "books[3]{id,title,author,published_year}:\n  1,A,B,2000\n";
        let result = parse_catalog(text);

        assert!(matches!(
            result,
            Err(Error::CountMismatch {
                declared: 3,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_parse_catalog_wrong_fields() {
        let text = "books[1]{id,author,title,published_year}:\n  1,A,B,2000\n";
        assert!(matches!(parse_catalog(text), Err(Error::Parse { line: 1, .. })));
    }

    #[test]
    fn test_parse_catalog_bad_row() {
        let text = "books[2]{id,title,author,published_year}:\n  1,A,B,2000\n  x,C,D,1999\n";
        assert!(matches!(parse_catalog(text), Err(Error::Parse { line: 3, .. })));

        let text = "books[1]{id,title,author,published_year}:\n  1,A,2000\n";
        assert!(matches!(parse_catalog(text), Err(Error::Parse { line: 2, .. })));
    }

    #[test]
    fn test_parse_catalog_empty_field() {
        let text = "books[1]{id,title,author,published_year}:\n  1,,Anon,2000\n";
        let err = parse_catalog(text).unwrap_err();

        assert!(matches!(err, Error::Parse { line: 2, .. }));
        assert!(err.to_string().ends_with("empty field 2 (title)"));

        let text = "books[1]{id,title,author,published_year}:\n  1,\"\",Anon,\n";
        let err = parse_catalog(text).unwrap_err();
        assert!(err.to_string().ends_with("empty field 2 (title)"));
    }

    #[test]
    fn test_parse_row_keeps_empty_values() {
        let (rest, values) = parse_row("1, ,Anon,").unwrap();

        assert!(rest.is_empty());
        assert_eq!(values, vec!["1", "", "Anon", ""]);
    }

    #[test]
    fn test_parse_catalog_empty() {
        assert!(matches!(parse_catalog("\n\n"), Err(Error::Parse { .. })));
    }
}
