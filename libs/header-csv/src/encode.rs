use std::any::type_name;
use std::io::{self, Write};
use std::sync::Arc;

use crate::config::CsvConfig;
use crate::error::{Error, Result};
use crate::payload::{JsonCodec, PayloadCodec};
use crate::record::Record;
use crate::rows::{CsvWriter, RowSink};
use crate::shape::ShapeCache;

/// Values accepted by the polymorphic [`Encoder::encode`].
pub enum Source<'a, T> {
    Record(&'a T),
    Sequence(&'a [T]),
}

// ═══════════════════════════════════════════════════════════════
//  Encoder
// ═══════════════════════════════════════════════════════════════

/// Renders [`Record`] values as rows of a [`RowSink`].
///
/// Without [`set_header`](Self::set_header) the header is taken from the
/// first record encoded.
pub struct Encoder<W> {
    sink: W,
    header: Option<Vec<String>>,
    payload: Arc<dyn PayloadCodec>,
    shapes: Arc<ShapeCache>,
}

impl<W: Write> Encoder<CsvWriter<W>> {
    /// Comma-delimited, quoted CSV with `\n` line endings.
    pub fn new(writer: W) -> Self {
        Self::from_sink(CsvWriter::new(writer))
    }

    /// Writes the configured header, if any, straight away.
    pub fn from_config(writer: W, config: &CsvConfig) -> Result<Self> {
        let sink =
            CsvWriter::with_dialect(writer, config.delimiter_char()?, config.quoting, config.crlf);
        let mut encoder = Self::from_sink(sink);
        if let Some(header) = config.explicit_header() {
            encoder.set_header(header)?;
        }
        Ok(encoder)
    }
}

impl<S: RowSink> Encoder<S> {
    pub fn from_sink(sink: S) -> Self {
        Self {
            sink,
            header: None,
            payload: Arc::new(JsonCodec),
            shapes: ShapeCache::shared(),
        }
    }

    pub fn with_payload_codec(mut self, codec: impl PayloadCodec + 'static) -> Self {
        self.payload = Arc::new(codec);
        self
    }

    pub fn with_shape_cache(mut self, shapes: Arc<ShapeCache>) -> Self {
        self.shapes = shapes;
        self
    }

    /// Fixes the header and writes it as the first row.
    pub fn set_header<I>(&mut self, header: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        if self.header.is_some() {
            return Err(Error::HeaderAlreadySet);
        }
        let header: Vec<String> = header.into_iter().map(Into::into).collect();
        tracing::debug!(header = ?header, "encoder header set");
        self.sink.write_row(&header)?;
        self.header = Some(header);
        Ok(())
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Writes one row for `value`, one cell per header name.
    ///
    /// Names the value does not have render as empty cells, as do zero
    /// values of `omitempty` fields.
    pub fn encode_record<T: Record>(&mut self, value: &T) -> Result<()> {
        let shape = self.shapes.resolve::<T>();
        if shape.is_unsupported() {
            return Err(Error::UnsupportedShape(type_name::<T>()));
        }
        if self.header.is_none() {
            let header = value
                .header_names(&shape)
                .ok_or(Error::CannotDecideHeader(type_name::<T>()))?;
            self.set_header(header)?;
        }
        let header = self.header.as_deref().unwrap_or_default();

        let mut row = Vec::with_capacity(header.len());
        for (index, name) in header.iter().enumerate() {
            let cell = match value.field(&shape, index, name) {
                None => String::new(),
                Some(field) if field.omit_empty() && field.cell.is_empty_value() => String::new(),
                Some(field) => field
                    .cell
                    .encode_cell(&*self.payload)
                    .map_err(|source| Error::Encode { field: name.clone(), source })?,
            };
            row.push(cell);
        }
        self.sink.write_row(&row)?;
        Ok(())
    }

    /// Encodes every value in order, stopping at the first error.
    pub fn encode_all<T: Record>(&mut self, values: &[T]) -> Result<()> {
        values.iter().try_for_each(|value| self.encode_record(value))
    }

    #[deprecated(note = "use encode_record or encode_all")]
    pub fn encode<T: Record>(&mut self, source: Source<'_, T>) -> Result<()> {
        match source {
            Source::Record(value) => self.encode_record(value),
            Source::Sequence(values) => self.encode_all(values),
        }
    }

    /// Writes buffered rows through to the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        Ok(self.sink.flush()?)
    }

    /// First error raised by a previous write or flush.
    pub fn error(&self) -> Option<&io::Error> {
        self.sink.error()
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}
