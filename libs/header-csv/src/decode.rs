use std::any::type_name;
use std::io::Read;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::CsvConfig;
use crate::error::{DecodeError, Error, Result};
use crate::payload::{JsonCodec, PayloadCodec};
use crate::record::Record;
use crate::rows::{CsvReader, RowSource};
use crate::shape::ShapeCache;

/// Destination accepted by the polymorphic [`Decoder::decode`].
pub enum Target<'a, T> {
    Record(&'a mut T),
    Sequence(&'a mut Vec<T>),
    Array(&'a mut [T]),
}

// ═══════════════════════════════════════════════════════════════
//  Decoder
// ═══════════════════════════════════════════════════════════════

/// Reads rows from a [`RowSource`] and binds them to [`Record`] values by
/// header name.
///
/// Without [`set_header`](Self::set_header) the first row read becomes the
/// header.
pub struct Decoder<S> {
    source: S,
    header: Option<Vec<String>>,
    payload: Arc<dyn PayloadCodec>,
    shapes: Arc<ShapeCache>,
}

impl<R: Read> Decoder<CsvReader<R>> {
    /// Comma-delimited, quoted CSV.
    pub fn new(reader: R) -> Self {
        Self::from_source(CsvReader::new(reader))
    }

    pub fn from_config(reader: R, config: &CsvConfig) -> Result<Self> {
        let source = CsvReader::with_dialect(reader, config.delimiter_char()?, config.quoting);
        let mut decoder = Self::from_source(source);
        if let Some(header) = config.explicit_header() {
            decoder.set_header(header)?;
        }
        Ok(decoder)
    }
}

impl<S: RowSource> Decoder<S> {
    pub fn from_source(source: S) -> Self {
        Self {
            source,
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

    /// Fixes the header before any row is read.
    pub fn set_header<I>(&mut self, header: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        if self.header.is_some() {
            return Err(Error::HeaderAlreadySet);
        }
        let header: Vec<String> = header.into_iter().map(Into::into).collect();
        tracing::debug!(columns = header.len(), "decoder header set");
        self.header = Some(header);
        Ok(())
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Adopts the first row as header if none is set. `false` at end of input.
    fn init_header(&mut self) -> Result<bool> {
        if self.header.is_some() {
            return Ok(true);
        }
        match self.source.read_row()? {
            Some(row) => {
                tracing::debug!(header = ?row, "decoder header adopted from first row");
                self.header = Some(row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Decodes the next row into `out`.
    ///
    /// Returns `Ok(false)` once the input is exhausted. Cells past the end of
    /// the header are ignored; header positions past the end of the row leave
    /// the corresponding fields untouched.
    pub fn decode_record<T: Record>(&mut self, out: &mut T) -> Result<bool> {
        let shape = self.shapes.resolve::<T>();
        if shape.is_unsupported() {
            return Err(Error::UnsupportedShape(type_name::<T>()));
        }
        if !self.init_header()? {
            return Ok(false);
        }
        let Some(row) = self.source.read_row()? else {
            return Ok(false);
        };
        let Some(header) = self.header.as_deref() else {
            return Ok(false);
        };

        out.begin_row(&shape, header.len());
        for (index, (name, cell)) in header.iter().zip(&row).enumerate() {
            if let Err(source) = out.decode_field(&shape, index, name, cell, &*self.payload) {
                let start = self.source.position(0);
                let at = self.source.position(index);
                return Err(DecodeError {
                    start_line: start.line,
                    line: at.line,
                    column: at.column,
                    field: name.clone(),
                    source,
                }
                .into());
            }
        }
        Ok(true)
    }

    /// Replaces `out` with every remaining record.
    ///
    /// On error `out` keeps the records decoded before the failing row.
    pub fn decode_all<T: Record + Default>(&mut self, out: &mut Vec<T>) -> Result<()> {
        out.clear();
        loop {
            let mut record = T::default();
            if !self.decode_record(&mut record)? {
                return Ok(());
            }
            out.push(record);
        }
    }

    /// Fills `out` slot by slot and returns how many slots were decoded.
    ///
    /// The slot that fails, or the first slot left once input runs out, is
    /// reset to its default.
    pub fn decode_array<T: Record + Default>(&mut self, out: &mut [T]) -> Result<usize> {
        for (index, slot) in out.iter_mut().enumerate() {
            match self.decode_record(slot) {
                Ok(true) => {}
                Ok(false) => {
                    *slot = T::default();
                    return Ok(index);
                }
                Err(e) => {
                    *slot = T::default();
                    return Err(e);
                }
            }
        }
        Ok(out.len())
    }

    /// Iterates over the remaining records. Iteration ends after the first error.
    pub fn records<T: Record + Default>(&mut self) -> Records<'_, S, T> {
        Records {
            decoder: self,
            done: false,
            _record: PhantomData,
        }
    }

    /// Decodes one record, or a whole sequence or array, and returns how many
    /// records were stored.
    #[deprecated(note = "use decode_record, decode_all or decode_array")]
    pub fn decode<T: Record + Default>(&mut self, target: Target<'_, T>) -> Result<usize> {
        match target {
            Target::Record(out) => self.decode_record(out).map(usize::from),
            Target::Sequence(out) => {
                self.decode_all(out)?;
                Ok(out.len())
            }
            Target::Array(out) => self.decode_array(out),
        }
    }
}

/// Iterator returned by [`Decoder::records`].
pub struct Records<'d, S, T> {
    decoder: &'d mut Decoder<S>,
    done: bool,
    _record: PhantomData<fn() -> T>,
}

impl<S: RowSource, T: Record + Default> Iterator for Records<'_, S, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut record = T::default();
        match self.decoder.decode_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
