use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use crate::cell::Cell;
use crate::error::CellError;
use crate::payload::PayloadCodec;
use crate::shape::{FieldMeta, Shape, ShapeCache};

/// A field located by header position/name, ready for encoding.
pub struct FieldRef<'a> {
    pub cell: &'a dyn Cell,
    /// Declared metadata; only aggregates carry it.
    pub meta: Option<&'a FieldMeta>,
}

impl<'a> FieldRef<'a> {
    pub fn new(cell: &'a dyn Cell, meta: Option<&'a FieldMeta>) -> Self {
        Self { cell, meta }
    }

    pub fn omit_empty(&self) -> bool {
        self.meta.is_some_and(|m| m.omit_empty)
    }
}

/// A value that one text row maps onto.
///
/// `describe` builds the type's [`Shape`] and is called at most once per
/// cache; every other method receives that resolved shape back.
pub trait Record: 'static {
    fn describe(cache: &ShapeCache) -> Shape
    where
        Self: Sized;

    /// Called once per row before any field is decoded.
    fn begin_row(&mut self, _shape: &Shape, _columns: usize) {}

    /// Decodes `cell` into the field at header position `index` named `name`.
    /// Positions with no writable field are skipped.
    fn decode_field(
        &mut self,
        shape: &Shape,
        index: usize,
        name: &str,
        cell: &str,
        payload: &dyn PayloadCodec,
    ) -> Result<(), CellError>;

    /// The field at header position `index` named `name`, if present.
    fn field<'a>(&'a self, shape: &'a Shape, index: usize, name: &str) -> Option<FieldRef<'a>>;

    /// Header names this value can supply on its own.
    fn header_names(&self, shape: &Shape) -> Option<Vec<String>> {
        shape.header_names().map(<[String]>::to_vec)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Optional
// ═══════════════════════════════════════════════════════════════

fn inner(shape: &Shape) -> &Shape {
    match shape {
        Shape::Optional(inner) => inner,
        other => other,
    }
}

impl<T: Record + Default> Record for Option<T> {
    fn describe(cache: &ShapeCache) -> Shape {
        Shape::Optional(cache.resolve::<T>())
    }

    fn begin_row(&mut self, shape: &Shape, columns: usize) {
        self.get_or_insert_with(T::default).begin_row(inner(shape), columns);
    }

    fn decode_field(
        &mut self,
        shape: &Shape,
        index: usize,
        name: &str,
        cell: &str,
        payload: &dyn PayloadCodec,
    ) -> Result<(), CellError> {
        self.get_or_insert_with(T::default)
            .decode_field(inner(shape), index, name, cell, payload)
    }

    fn field<'a>(&'a self, shape: &'a Shape, index: usize, name: &str) -> Option<FieldRef<'a>> {
        self.as_ref()?.field(inner(shape), index, name)
    }

    fn header_names(&self, shape: &Shape) -> Option<Vec<String>> {
        match self {
            Some(value) => value.header_names(inner(shape)),
            None => shape.header_names().map(<[String]>::to_vec),
        }
    }
}

impl<T: Record> Record for Box<T> {
    fn describe(cache: &ShapeCache) -> Shape {
        Shape::Optional(cache.resolve::<T>())
    }

    fn begin_row(&mut self, shape: &Shape, columns: usize) {
        (**self).begin_row(inner(shape), columns);
    }

    fn decode_field(
        &mut self,
        shape: &Shape,
        index: usize,
        name: &str,
        cell: &str,
        payload: &dyn PayloadCodec,
    ) -> Result<(), CellError> {
        (**self).decode_field(inner(shape), index, name, cell, payload)
    }

    fn field<'a>(&'a self, shape: &'a Shape, index: usize, name: &str) -> Option<FieldRef<'a>> {
        (**self).field(inner(shape), index, name)
    }

    fn header_names(&self, shape: &Shape) -> Option<Vec<String>> {
        (**self).header_names(inner(shape))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Map
// ═══════════════════════════════════════════════════════════════

fn map_shape<K: 'static>() -> Shape {
    if TypeId::of::<K>() == TypeId::of::<String>() {
        Shape::Map
    } else {
        Shape::Unsupported { type_name: type_name::<K>() }
    }
}

/// `Some` only when `K` is `String`, which `map_shape` guarantees for
/// every map that reaches field access.
fn text_key<K: 'static>(name: &str) -> Option<K> {
    let key: Box<dyn Any> = Box::new(name.to_owned());
    key.downcast::<K>().ok().map(|k| *k)
}

fn key_text<K: 'static>(key: &K) -> Option<&str> {
    (key as &dyn Any).downcast_ref::<String>().map(String::as_str)
}

impl<K, V, S> Record for HashMap<K, V, S>
where
    K: Eq + Hash + 'static,
    V: Cell + Default + 'static,
    S: BuildHasher + 'static,
{
    fn describe(_cache: &ShapeCache) -> Shape {
        map_shape::<K>()
    }

    fn decode_field(
        &mut self,
        _shape: &Shape,
        _index: usize,
        name: &str,
        cell: &str,
        payload: &dyn PayloadCodec,
    ) -> Result<(), CellError> {
        let key = text_key::<K>(name).ok_or(CellError::UnsupportedType(type_name::<K>()))?;
        let mut value = V::default();
        value.decode_cell(cell, payload)?;
        self.insert(key, value);
        Ok(())
    }

    fn field<'a>(&'a self, _shape: &'a Shape, _index: usize, name: &str) -> Option<FieldRef<'a>> {
        let key = text_key::<K>(name)?;
        self.get(&key).map(|v| FieldRef::new(v, None))
    }

    fn header_names(&self, shape: &Shape) -> Option<Vec<String>> {
        if shape.is_unsupported() {
            return None;
        }
        self.keys().map(|k| key_text(k).map(str::to_owned)).collect()
    }
}

impl<K, V> Record for BTreeMap<K, V>
where
    K: Ord + 'static,
    V: Cell + Default + 'static,
{
    fn describe(_cache: &ShapeCache) -> Shape {
        map_shape::<K>()
    }

    fn decode_field(
        &mut self,
        _shape: &Shape,
        _index: usize,
        name: &str,
        cell: &str,
        payload: &dyn PayloadCodec,
    ) -> Result<(), CellError> {
        let key = text_key::<K>(name).ok_or(CellError::UnsupportedType(type_name::<K>()))?;
        let mut value = V::default();
        value.decode_cell(cell, payload)?;
        self.insert(key, value);
        Ok(())
    }

    fn field<'a>(&'a self, _shape: &'a Shape, _index: usize, name: &str) -> Option<FieldRef<'a>> {
        let key = text_key::<K>(name)?;
        self.get(&key).map(|v| FieldRef::new(v, None))
    }

    fn header_names(&self, shape: &Shape) -> Option<Vec<String>> {
        if shape.is_unsupported() {
            return None;
        }
        self.keys().map(|k| key_text(k).map(str::to_owned)).collect()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Sequence
// ═══════════════════════════════════════════════════════════════

impl<V: Cell + Default + 'static> Record for Vec<V> {
    fn describe(_cache: &ShapeCache) -> Shape {
        Shape::Sequence
    }

    /// A row replaces the previous contents with one slot per header column.
    fn begin_row(&mut self, _shape: &Shape, columns: usize) {
        self.clear();
        self.resize_with(columns, V::default);
    }

    fn decode_field(
        &mut self,
        _shape: &Shape,
        index: usize,
        _name: &str,
        cell: &str,
        payload: &dyn PayloadCodec,
    ) -> Result<(), CellError> {
        match self.get_mut(index) {
            Some(slot) => slot.decode_cell(cell, payload),
            None => Ok(()),
        }
    }

    fn field<'a>(&'a self, _shape: &'a Shape, index: usize, _name: &str) -> Option<FieldRef<'a>> {
        self.get(index).map(|v| FieldRef::new(v, None))
    }
}

impl<V: Cell + 'static, const N: usize> Record for [V; N] {
    fn describe(_cache: &ShapeCache) -> Shape {
        Shape::Sequence
    }

    fn decode_field(
        &mut self,
        _shape: &Shape,
        index: usize,
        _name: &str,
        cell: &str,
        payload: &dyn PayloadCodec,
    ) -> Result<(), CellError> {
        // Positions past the fixed bound cannot be written.
        match self.get_mut(index) {
            Some(slot) => slot.decode_cell(cell, payload),
            None => Ok(()),
        }
    }

    fn field<'a>(&'a self, _shape: &'a Shape, index: usize, _name: &str) -> Option<FieldRef<'a>> {
        self.get(index).map(|v| FieldRef::new(v, None))
    }
}
