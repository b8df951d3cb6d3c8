use std::fmt;

/// Boxed error returned by pluggable collaborators (text and payload codecs).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure converting one cell to or from a typed value.
#[derive(Debug, thiserror::Error)]
pub enum CellError {
    /// The text is not valid for the destination kind.
    #[error("invalid {kind} syntax: {text:?}")]
    Syntax { kind: &'static str, text: String },

    /// The text is valid but the value does not fit the destination width.
    #[error("{kind} overflow: {text:?}")]
    Overflow { kind: &'static str, text: String },

    /// Raised by a custom `TextCodec`; surfaced verbatim.
    #[error(transparent)]
    Text(BoxError),

    /// Raised by the structured-payload codec.
    #[error("payload: {0}")]
    Payload(#[source] BoxError),

    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),
}

impl CellError {
    pub fn syntax(kind: &'static str, text: &str) -> Self {
        Self::Syntax { kind, text: text.to_owned() }
    }

    pub fn overflow(kind: &'static str, text: &str) -> Self {
        Self::Overflow { kind, text: text.to_owned() }
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow { .. })
    }
}

impl From<serde_json::Error> for CellError {
    fn from(e: serde_json::Error) -> Self {
        Self::Payload(Box::new(e))
    }
}

/// A cell failed to decode. Lines and columns are 1-based; the column is a
/// byte index into the physical line.
#[derive(Debug)]
pub struct DecodeError {
    /// Line where the record starts.
    pub start_line: usize,
    /// Line where the failing cell starts.
    pub line: usize,
    pub column: usize,
    /// Header name at the failing position.
    pub field: String,
    pub source: CellError,
}

impl DecodeError {
    pub fn is_overflow(&self) -> bool {
        self.source.is_overflow()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line != self.line {
            write!(
                f,
                "decode error on line {} (starting at line {}), column {}, field {:?}: {}",
                self.line, self.start_line, self.column, self.field, self.source
            )
        } else {
            write!(
                f,
                "decode error on line {}, column {}, field {:?}: {}",
                self.line, self.column, self.field, self.source
            )
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("the header has been already set")]
    HeaderAlreadySet,

    #[error("cannot decide header for {0}")]
    CannotDecideHeader(&'static str),

    #[error("unsupported type: {0}")]
    UnsupportedShape(&'static str),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("encode field {field:?}: {source}")]
    Encode { field: String, source: CellError },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// The cell-level cause, if this error was raised by coercion.
    pub fn cell_error(&self) -> Option<&CellError> {
        match self {
            Error::Decode(e) => Some(&e.source),
            Error::Encode { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_overflow(&self) -> bool {
        self.cell_error().is_some_and(CellError::is_overflow)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
