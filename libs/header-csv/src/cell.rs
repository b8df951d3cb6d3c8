use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{BoxError, CellError};
use crate::number;
use crate::payload::{self, PayloadCodec};

/// Literal written for an empty optional.
pub const NULL: &str = "null";

/// Conversion between one text cell and one typed value.
pub trait Cell {
    fn decode_cell(&mut self, cell: &str, payload: &dyn PayloadCodec) -> Result<(), CellError>;

    fn encode_cell(&self, payload: &dyn PayloadCodec) -> Result<String, CellError>;

    /// Zero/empty value of the kind, as consulted by `omitempty`.
    fn is_empty_value(&self) -> bool;
}

/// Opt-in textual encoding that owns the whole cell.
///
/// Implement it and add `#[derive(TextCell)]` to take precedence over the
/// built-in handling of the type.
pub trait TextCodec {
    fn decode_text(&mut self, text: &str) -> Result<(), BoxError>;

    fn encode_text(&self) -> Result<String, BoxError>;

    fn is_zero(&self) -> bool {
        false
    }
}

// ═══════════════════════════════════════════════════════════════
//  Primitives
// ═══════════════════════════════════════════════════════════════

impl Cell for String {
    fn decode_cell(&mut self, cell: &str, _: &dyn PayloadCodec) -> Result<(), CellError> {
        cell.clone_into(self);
        Ok(())
    }

    fn encode_cell(&self, _: &dyn PayloadCodec) -> Result<String, CellError> {
        Ok(self.clone())
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl Cell for bool {
    fn decode_cell(&mut self, cell: &str, _: &dyn PayloadCodec) -> Result<(), CellError> {
        *self = match cell {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => true,
            "0" | "f" | "F" | "FALSE" | "false" | "False" => false,
            _ => return Err(CellError::syntax("boolean", cell)),
        };
        Ok(())
    }

    fn encode_cell(&self, _: &dyn PayloadCodec) -> Result<String, CellError> {
        Ok(self.to_string())
    }

    fn is_empty_value(&self) -> bool {
        !*self
    }
}

macro_rules! signed_cell {
    ($($ty:ty),* $(,)?) => {$(
        impl Cell for $ty {
            fn decode_cell(&mut self, cell: &str, _: &dyn PayloadCodec) -> Result<(), CellError> {
                let wide = number::parse_signed(cell)?;
                *self = <$ty>::try_from(wide).map_err(|_| CellError::overflow("integer", cell))?;
                Ok(())
            }

            fn encode_cell(&self, _: &dyn PayloadCodec) -> Result<String, CellError> {
                Ok(self.to_string())
            }

            fn is_empty_value(&self) -> bool {
                *self == 0
            }
        }
    )*};
}

macro_rules! unsigned_cell {
    ($($ty:ty),* $(,)?) => {$(
        impl Cell for $ty {
            fn decode_cell(&mut self, cell: &str, _: &dyn PayloadCodec) -> Result<(), CellError> {
                let wide = number::parse_unsigned(cell)?;
                *self = <$ty>::try_from(wide)
                    .map_err(|_| CellError::overflow("unsigned integer", cell))?;
                Ok(())
            }

            fn encode_cell(&self, _: &dyn PayloadCodec) -> Result<String, CellError> {
                Ok(self.to_string())
            }

            fn is_empty_value(&self) -> bool {
                *self == 0
            }
        }
    )*};
}

macro_rules! float_cell {
    ($($ty:ty),* $(,)?) => {$(
        impl Cell for $ty {
            fn decode_cell(&mut self, cell: &str, _: &dyn PayloadCodec) -> Result<(), CellError> {
                let value: $ty = cell.parse().map_err(|_| CellError::syntax("float", cell))?;
                if value.is_infinite() && !number::is_non_finite_literal(cell) {
                    return Err(CellError::overflow("float", cell));
                }
                *self = value;
                Ok(())
            }

            fn encode_cell(&self, _: &dyn PayloadCodec) -> Result<String, CellError> {
                Ok(number::format_float(*self))
            }

            fn is_empty_value(&self) -> bool {
                *self == 0.0
            }
        }
    )*};
}

signed_cell!(i8, i16, i32, i64, isize);
unsigned_cell!(u8, u16, u32, u64, usize);
float_cell!(f32, f64);

// ═══════════════════════════════════════════════════════════════
//  Optional
// ═══════════════════════════════════════════════════════════════

impl<T: Cell + Default> Cell for Option<T> {
    fn decode_cell(&mut self, cell: &str, payload: &dyn PayloadCodec) -> Result<(), CellError> {
        if cell.is_empty() {
            *self = None;
            return Ok(());
        }
        self.get_or_insert_with(T::default).decode_cell(cell, payload)
    }

    fn encode_cell(&self, payload: &dyn PayloadCodec) -> Result<String, CellError> {
        match self {
            Some(value) => value.encode_cell(payload),
            None => Ok(NULL.to_owned()),
        }
    }

    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl<T: Cell + ?Sized> Cell for Box<T> {
    fn decode_cell(&mut self, cell: &str, payload: &dyn PayloadCodec) -> Result<(), CellError> {
        (**self).decode_cell(cell, payload)
    }

    fn encode_cell(&self, payload: &dyn PayloadCodec) -> Result<String, CellError> {
        (**self).encode_cell(payload)
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Open value
// ═══════════════════════════════════════════════════════════════

/// A field of no fixed kind.
///
/// Decoding always stores the raw cell as `Text`; encoding goes through the
/// payload codec.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Dynamic {
    #[default]
    Null,
    Text(String),
    Payload(serde_json::Value),
}

impl Dynamic {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Dynamic::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_value(&self) -> serde_json::Value {
        match self {
            Dynamic::Null => serde_json::Value::Null,
            Dynamic::Text(s) => serde_json::Value::String(s.clone()),
            Dynamic::Payload(v) => v.clone(),
        }
    }
}

impl From<&str> for Dynamic {
    fn from(s: &str) -> Self {
        Dynamic::Text(s.to_owned())
    }
}

impl From<serde_json::Value> for Dynamic {
    fn from(v: serde_json::Value) -> Self {
        Dynamic::Payload(v)
    }
}

impl Cell for Dynamic {
    fn decode_cell(&mut self, cell: &str, _: &dyn PayloadCodec) -> Result<(), CellError> {
        *self = Dynamic::Text(cell.to_owned());
        Ok(())
    }

    fn encode_cell(&self, payload: &dyn PayloadCodec) -> Result<String, CellError> {
        payload
            .encode(&self.to_value())
            .map_err(CellError::Payload)
    }

    fn is_empty_value(&self) -> bool {
        matches!(self, Dynamic::Null)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Composites
// ═══════════════════════════════════════════════════════════════

impl Cell for serde_json::Value {
    fn decode_cell(&mut self, cell: &str, payload: &dyn PayloadCodec) -> Result<(), CellError> {
        *self = payload.decode(cell).map_err(CellError::Payload)?;
        Ok(())
    }

    fn encode_cell(&self, payload: &dyn PayloadCodec) -> Result<String, CellError> {
        payload.encode(self).map_err(CellError::Payload)
    }

    fn is_empty_value(&self) -> bool {
        self.is_null()
    }
}

impl<V: Serialize + DeserializeOwned> Cell for Vec<V> {
    fn decode_cell(&mut self, cell: &str, payload: &dyn PayloadCodec) -> Result<(), CellError> {
        *self = payload::decode_value(payload, cell)?;
        Ok(())
    }

    fn encode_cell(&self, payload: &dyn PayloadCodec) -> Result<String, CellError> {
        payload::encode_value(payload, self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> Cell for HashMap<K, V, S>
where
    K: Serialize + DeserializeOwned + Eq + Hash,
    V: Serialize + DeserializeOwned,
    S: BuildHasher + Default,
{
    fn decode_cell(&mut self, cell: &str, payload: &dyn PayloadCodec) -> Result<(), CellError> {
        *self = payload::decode_value(payload, cell)?;
        Ok(())
    }

    fn encode_cell(&self, payload: &dyn PayloadCodec) -> Result<String, CellError> {
        payload::encode_value(payload, self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Cell for BTreeMap<K, V>
where
    K: Serialize + DeserializeOwned + Ord,
    V: Serialize + DeserializeOwned,
{
    fn decode_cell(&mut self, cell: &str, payload: &dyn PayloadCodec) -> Result<(), CellError> {
        *self = payload::decode_value(payload, cell)?;
        Ok(())
    }

    fn encode_cell(&self, payload: &dyn PayloadCodec) -> Result<String, CellError> {
        payload::encode_value(payload, self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::JsonCodec;

    fn decode<T: Cell + Default>(cell: &str) -> Result<T, CellError> {
        let mut value = T::default();
        value.decode_cell(cell, &JsonCodec)?;
        Ok(value)
    }

    fn encode<T: Cell>(value: &T) -> String {
        value.encode_cell(&JsonCodec).unwrap()
    }

    #[test]
    fn booleans() {
        for yes in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(decode::<bool>(yes).unwrap(), "{yes}");
        }
        for no in ["0", "f", "F", "FALSE", "false", "False"] {
            assert!(!decode::<bool>(no).unwrap(), "{no}");
        }
        assert!(matches!(decode::<bool>("yes"), Err(CellError::Syntax { .. })));
        assert_eq!(encode(&true), "true");
    }

    #[test]
    fn integer_widths_overflow() {
        assert_eq!(decode::<i8>("127").unwrap(), 127);
        assert_eq!(decode::<i8>("-128").unwrap(), -128);
        assert!(decode::<i8>("128").unwrap_err().is_overflow());
        assert!(decode::<i8>("-129").unwrap_err().is_overflow());
        assert!(decode::<u8>("256").unwrap_err().is_overflow());
        assert!(decode::<u16>("0x10000").unwrap_err().is_overflow());
        assert!(!decode::<u8>("abc").unwrap_err().is_overflow());
        assert!(matches!(decode::<u8>("-1"), Err(CellError::Syntax { .. })));
    }

    #[test]
    fn floats() {
        assert_eq!(decode::<f64>("123").unwrap(), 123.0);
        assert_eq!(decode::<f32>("1.5").unwrap(), 1.5);
        assert!(decode::<f32>("1e100").unwrap_err().is_overflow());
        assert!(decode::<f64>("1e400").unwrap_err().is_overflow());
        assert!(decode::<f64>("-inf").unwrap().is_infinite());
        assert!(matches!(decode::<f32>("abc"), Err(CellError::Syntax { .. })));
        assert_eq!(encode(&123.0f64), "123");
        assert_eq!(encode(&0.1f32), "0.1");
        assert_eq!(encode(&f64::MIN_POSITIVE), "2.2250738585072014e-308");
        assert_eq!(encode(&1e21f64), "1e21");
        assert_eq!(decode::<f64>("1e300").unwrap(), 1e300);
        assert_eq!(decode::<f64>(&encode(&1e300f64)).unwrap(), 1e300);
    }

    #[test]
    fn hex_float_literals_are_rejected() {
        assert!(matches!(decode::<f64>("0x1p-2"), Err(CellError::Syntax { .. })));
        assert!(matches!(decode::<f32>("0x1.8p1"), Err(CellError::Syntax { .. })));
    }

    #[test]
    fn optional_empty_cell_is_none() {
        let mut value = Some(5i32);
        value.decode_cell("", &JsonCodec).unwrap();
        assert_eq!(value, None);
        assert_eq!(decode::<Option<i32>>("7").unwrap(), Some(7));
        assert_eq!(decode::<Option<Option<String>>>("").unwrap(), None);
        assert_eq!(encode(&None::<i32>), NULL);
        assert_eq!(encode(&Some(Box::new(3u8))), "3");
    }

    #[test]
    fn dynamic_keeps_raw_text() {
        assert_eq!(decode::<Dynamic>("123").unwrap(), Dynamic::Text("123".into()));
        assert_eq!(encode(&Dynamic::from("hoge")), "\"hoge\"");
        assert_eq!(encode(&Dynamic::from(serde_json::json!({"a": 1}))), r#"{"a":1}"#);
        assert!(Dynamic::Null.is_empty_value());
    }

    #[test]
    fn composites_use_the_payload_codec() {
        let map: BTreeMap<String, String> = decode(r#"{"a":"hoge"}"#).unwrap();
        assert_eq!(map["a"], "hoge");
        assert_eq!(encode(&vec![1, 2]), "[1,2]");
        assert!(Vec::<u8>::new().is_empty_value());
        assert!(matches!(decode::<Vec<u8>>("nope"), Err(CellError::Payload(_))));
    }
}
