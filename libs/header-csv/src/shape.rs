use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::record::Record;
use crate::tag::{self, parse_tag};

// ═══════════════════════════════════════════════════════════════
//  Field metadata
// ═══════════════════════════════════════════════════════════════

/// Static declaration of one aggregate field, emitted by `#[derive(Record)]`.
#[derive(Debug, Clone, Copy)]
pub struct FieldDecl {
    /// Natural (Rust) name of the field.
    pub name: &'static str,
    /// Raw declaration from `#[csv("...")]`; empty when untagged.
    pub tag: &'static str,
}

/// Resolved metadata for one aggregate field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Display / lookup name.
    pub name: String,
    /// Position among the declared fields, skipped ones included.
    pub index: usize,
    pub omit_empty: bool,
    /// All declared options, recognized or not.
    pub options: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════
//  Shape
// ═══════════════════════════════════════════════════════════════

/// Field layout of a named-field record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateShape {
    headers: Vec<String>,
    fields: HashMap<String, FieldMeta>,
}

impl AggregateShape {
    pub fn new(decls: &[FieldDecl]) -> Self {
        let mut headers = Vec::with_capacity(decls.len());
        let mut fields = HashMap::with_capacity(decls.len());
        for (index, decl) in decls.iter().enumerate() {
            let tag = parse_tag(decl.tag);
            if tag.is_skip() {
                continue;
            }
            let name = if tag.name.is_empty() { decl.name } else { tag.name };
            headers.push(name.to_owned());
            fields.insert(
                name.to_owned(),
                FieldMeta {
                    name: name.to_owned(),
                    index,
                    omit_empty: tag.options.contains(tag::OMIT_EMPTY),
                    options: tag.options.iter().map(str::to_owned).collect(),
                },
            );
        }
        Self { headers, fields }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }
}

/// Resolved description of how a type's fields line up with header positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Aggregate(AggregateShape),
    /// String-keyed map; fields are looked up by key.
    Map,
    /// Positional elements.
    Sequence,
    /// Wraps the shape of the value behind an `Option` or `Box`.
    Optional(Arc<Shape>),
    /// A map whose keys are not text.
    Unsupported { type_name: &'static str },
}

impl Shape {
    pub fn aggregate(decls: &[FieldDecl]) -> Self {
        Shape::Aggregate(AggregateShape::new(decls))
    }

    /// The first shape that is not `Optional`.
    pub fn innermost(&self) -> &Shape {
        let mut shape = self;
        while let Shape::Optional(inner) = shape {
            shape = inner;
        }
        shape
    }

    /// Header names known without looking at a value. Only aggregates have them.
    pub fn header_names(&self) -> Option<&[String]> {
        match self.innermost() {
            Shape::Aggregate(agg) => Some(agg.headers()),
            _ => None,
        }
    }

    /// Aggregate metadata for `name`; `None` for every other shape.
    pub fn field_meta(&self, name: &str) -> Option<&FieldMeta> {
        match self.innermost() {
            Shape::Aggregate(agg) => agg.field(name),
            _ => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.innermost(), Shape::Unsupported { .. })
    }
}

// ═══════════════════════════════════════════════════════════════
//  ShapeCache
// ═══════════════════════════════════════════════════════════════

/// Memoized shapes keyed by concrete type.
///
/// Resolution runs outside the lock; the first shape published for a type
/// wins and every caller receives that same `Arc`.
#[derive(Default)]
pub struct ShapeCache {
    shapes: RwLock<HashMap<TypeId, Arc<Shape>>>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache used by decoders and encoders unless one is injected.
    pub fn shared() -> Arc<ShapeCache> {
        static SHARED: OnceLock<Arc<ShapeCache>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(ShapeCache::new())))
    }

    pub fn resolve<T: Record>(&self) -> Arc<Shape> {
        let id = TypeId::of::<T>();
        if let Some(shape) = self.shapes.read().get(&id) {
            return Arc::clone(shape);
        }

        // May recurse into `resolve` for wrapped types, so no lock is held here.
        let shape = Arc::new(T::describe(self));

        match self.shapes.write().entry(id) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                tracing::trace!(type_name = std::any::type_name::<T>(), "shape resolved");
                Arc::clone(entry.insert(shape))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.shapes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.read().is_empty()
    }
}

impl std::fmt::Debug for ShapeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeCache").field("len", &self.len()).finish()
    }
}
