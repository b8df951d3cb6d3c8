use std::io::{self, BufRead, BufReader, Read};

use super::{Position, RowSource};

fn trim_eol(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

// ═══════════════════════════════════════════════════════════════
//  CsvReader
// ═══════════════════════════════════════════════════════════════

/// RFC 4180 row reader.
///
/// Quoted cells may span physical lines. Empty lines are skipped. Rows may
/// have any number of cells. Characters between a closing quote and the next
/// delimiter are dropped, and a quote left open at end of input closes the
/// cell there.
pub struct CsvReader<R> {
    input: BufReader<R>,
    delimiter: char,
    quoting: bool,
    /// Physical lines consumed so far.
    line: usize,
    positions: Vec<Position>,
}

impl<R: Read> CsvReader<R> {
    pub fn new(input: R) -> Self {
        Self::with_dialect(input, ',', true)
    }

    pub fn with_dialect(input: R, delimiter: char, quoting: bool) -> Self {
        Self {
            input: BufReader::new(input),
            delimiter,
            quoting,
            line: 0,
            positions: Vec::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }

    /// Reads one physical line without its terminator; `None` at end of input.
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        let len = trim_eol(&buf).len();
        buf.truncate(len);
        Ok(Some(buf))
    }

    /// Reads a quoted cell starting at the opening quote at `*offset`.
    /// Leaves `*offset` at the delimiter (or end of line) that follows.
    fn quoted_cell(&mut self, current: &mut String, offset: &mut usize) -> io::Result<String> {
        let mut cell = String::new();
        *offset += 1;
        loop {
            let rest = &current[*offset..];
            if let Some(i) = rest.find('"') {
                cell.push_str(&rest[..i]);
                *offset += i + 1;
                if current[*offset..].starts_with('"') {
                    // Escaped quote: "" → "
                    cell.push('"');
                    *offset += 1;
                    continue;
                }
                break;
            }
            cell.push_str(rest);
            match self.next_line()? {
                Some(next) => {
                    cell.push('\n');
                    *current = next;
                    *offset = 0;
                }
                None => {
                    *offset = current.len();
                    return Ok(cell);
                }
            }
        }

        let rest = &current[*offset..];
        *offset += rest.find(self.delimiter).unwrap_or(rest.len());
        Ok(cell)
    }
}

impl<R: Read> RowSource for CsvReader<R> {
    fn read_row(&mut self) -> io::Result<Option<Vec<String>>> {
        let mut current = loop {
            match self.next_line()? {
                None => return Ok(None),
                Some(line) if line.is_empty() => continue,
                Some(line) => break line,
            }
        };

        self.positions.clear();
        let mut cells = Vec::new();
        let mut offset = 0;
        loop {
            let start = Position { line: self.line, column: offset + 1 };
            let cell = if self.quoting && current[offset..].starts_with('"') {
                self.quoted_cell(&mut current, &mut offset)?
            } else {
                let rest = &current[offset..];
                let len = rest.find(self.delimiter).unwrap_or(rest.len());
                let cell = rest[..len].to_owned();
                offset += len;
                cell
            };
            self.positions.push(start);
            cells.push(cell);

            // Trailing delimiter → one more (empty) cell.
            match current[offset..].chars().next() {
                Some(c) if c == self.delimiter => offset += c.len_utf8(),
                _ => break,
            }
        }
        Ok(Some(cells))
    }

    fn position(&self, index: usize) -> Position {
        self.positions.get(index).copied().unwrap_or_default()
    }
}
