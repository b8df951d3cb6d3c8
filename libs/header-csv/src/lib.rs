//! Header-driven binding between CSV rows and typed values.
//!
//! ```
//! use header_csv::{Decoder, Encoder, Record};
//!
//! #[derive(Debug, Default, PartialEq, Record)]
//! struct Line {
//!     #[csv("name")]
//!     name: String,
//!     #[csv("text,omitempty")]
//!     text: String,
//! }
//!
//! let mut lines: Vec<Line> = Vec::new();
//! Decoder::new("name,text\nEd,Knock knock.\nSam,\n".as_bytes())
//!     .decode_all(&mut lines)
//!     .unwrap();
//! assert_eq!(lines[1], Line { name: "Sam".into(), text: String::new() });
//!
//! let mut enc = Encoder::new(Vec::new());
//! enc.encode_all(&lines).unwrap();
//! let out = enc.into_inner().into_inner().unwrap();
//! assert_eq!(out, b"name,text\nEd,Knock knock.\nSam,\n");
//! ```

extern crate self as header_csv;

pub mod cell;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
mod number;
pub mod payload;
pub mod record;
pub mod rows;
pub mod shape;
pub mod tag;

pub use cell::{Cell, Dynamic, TextCodec};
pub use config::CsvConfig;
pub use decode::{Decoder, Records, Target};
pub use encode::{Encoder, Source};
pub use error::{BoxError, CellError, DecodeError, Error, Result};
pub use header_csv_derive::{PayloadCell, Record, TextCell};
pub use payload::{JsonCodec, PayloadCodec};
pub use record::{FieldRef, Record};
pub use rows::{CsvReader, CsvWriter, Position, RowSink, RowSource};
pub use shape::{AggregateShape, FieldDecl, FieldMeta, Shape, ShapeCache};
pub use tag::{Tag, TagOptions, parse_tag};
