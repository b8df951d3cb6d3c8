use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{BoxError, CellError};

/// Structured-payload codec: `cell text ↔ serde_json::Value`.
///
/// Used for composite field values (nested records, maps, sequences, open
/// values) that the engine does not flatten into columns.
pub trait PayloadCodec: Send + Sync {
    fn decode(&self, text: &str) -> Result<serde_json::Value, BoxError>;
    fn encode(&self, value: &serde_json::Value) -> Result<String, BoxError>;
}

/// Default codec: JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn decode(&self, text: &str) -> Result<serde_json::Value, BoxError> {
        Ok(serde_json::from_str(text)?)
    }

    fn encode(&self, value: &serde_json::Value) -> Result<String, BoxError> {
        Ok(serde_json::to_string(value)?)
    }
}

/// Decodes a cell into any deserializable value through `codec`.
pub fn decode_value<T: DeserializeOwned>(
    codec: &dyn PayloadCodec,
    text: &str,
) -> Result<T, CellError> {
    let value = codec.decode(text).map_err(CellError::Payload)?;
    Ok(serde_json::from_value(value)?)
}

/// Renders any serializable value as cell text through `codec`.
pub fn encode_value<T: Serialize + ?Sized>(
    codec: &dyn PayloadCodec,
    value: &T,
) -> Result<String, CellError> {
    let value = serde_json::to_value(value)?;
    codec.encode(&value).map_err(CellError::Payload)
}
