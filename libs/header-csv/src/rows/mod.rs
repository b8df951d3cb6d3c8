//! Row-level collaborators: the tokenizer that yields text cells and the
//! writer that accepts them.

mod parser;
mod serializer;

use std::io;

pub use parser::CsvReader;
pub use serializer::CsvWriter;

/// 1-based location of a cell in the input. `column` is a byte index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Yields rows of text cells.
pub trait RowSource {
    /// Next row, or `None` at end of input.
    fn read_row(&mut self) -> io::Result<Option<Vec<String>>>;

    /// Where cell `index` of the most recently read row starts.
    fn position(&self, index: usize) -> Position;
}

/// Accepts rows of text cells; may buffer until flushed.
pub trait RowSink {
    fn write_row(&mut self, cells: &[String]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    /// First error raised by a previous write or flush, if any.
    fn error(&self) -> Option<&io::Error>;
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn read_row(&mut self) -> io::Result<Option<Vec<String>>> {
        (**self).read_row()
    }

    fn position(&self, index: usize) -> Position {
        (**self).position(index)
    }
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    fn write_row(&mut self, cells: &[String]) -> io::Result<()> {
        (**self).write_row(cells)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn error(&self) -> Option<&io::Error> {
        (**self).error()
    }
}

/// Accepts `","`-style single characters plus the `\t` escape.
pub(crate) fn parse_delimiter(s: &str) -> Result<char, String> {
    let mut chars = s.chars();
    match (s, chars.next(), chars.next()) {
        ("\\t", _, _) => Ok('\t'),
        (_, Some(c), None) if !matches!(c, '"' | '\r' | '\n') => Ok(c),
        (other, _, _) => Err(format!(
            "delimiter must be a single character other than quote or newline, got {other:?}"
        )),
    }
}
