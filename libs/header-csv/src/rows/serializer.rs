use std::io::{self, BufWriter, Write};

use super::RowSink;

// ═══════════════════════════════════════════════════════════════
//  CsvWriter
// ═══════════════════════════════════════════════════════════════

/// RFC 4180 row writer.
///
/// Output is buffered. The first I/O failure is kept and every later write
/// or flush returns a copy of it without touching the underlying writer.
pub struct CsvWriter<W: Write> {
    output: BufWriter<W>,
    delimiter: char,
    quoting: bool,
    crlf: bool,
    error: Option<io::Error>,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(output: W) -> Self {
        Self::with_dialect(output, ',', true, false)
    }

    pub fn with_dialect(output: W, delimiter: char, quoting: bool, crlf: bool) -> Self {
        Self {
            output: BufWriter::new(output),
            delimiter,
            quoting,
            crlf,
            error: None,
        }
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.output.into_inner().map_err(|e| e.into_error())
    }

    fn needs_quotes(&self, cell: &str) -> bool {
        cell.contains([self.delimiter, '"', '\r', '\n']) || cell.starts_with([' ', '\t'])
    }

    fn render(&self, cells: &[String]) -> String {
        // A row made of one empty cell would read back as a blank line.
        if self.quoting && cells.len() == 1 && cells[0].is_empty() {
            return "\"\"".to_owned();
        }
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                line.push(self.delimiter);
            }
            if self.quoting && self.needs_quotes(cell) {
                line.push('"');
                line.push_str(&cell.replace('"', "\"\""));
                line.push('"');
            } else {
                line.push_str(cell);
            }
        }
        line
    }

    fn sticky(&self) -> io::Result<()> {
        match &self.error {
            Some(e) => Err(io::Error::new(e.kind(), e.to_string())),
            None => Ok(()),
        }
    }

    fn record(&mut self, result: io::Result<()>) -> io::Result<()> {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "csv sink failed, further writes are rejected");
            self.error = Some(io::Error::new(e.kind(), e.to_string()));
        }
        result
    }
}

impl<W: Write> RowSink for CsvWriter<W> {
    fn write_row(&mut self, cells: &[String]) -> io::Result<()> {
        self.sticky()?;
        let mut line = self.render(cells);
        line.push_str(if self.crlf { "\r\n" } else { "\n" });
        let result = self.output.write_all(line.as_bytes());
        self.record(result)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sticky()?;
        let result = self.output.flush();
        self.record(result)
    }

    fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }
}
