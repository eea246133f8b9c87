//! Static shape declarations for SSZ types.
//!
//! A [`Schema`] is what a Rust type says about itself, before any
//! specification values are applied.  The resolver turns it into a
//! [`TypeDescriptor`](crate::TypeDescriptor).

use std::any::TypeId;

use crate::hints::SizeAnnotations;

/// Width of an unsigned integer leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UintWidth {
    U8,
    U16,
    U32,
    U64,
    U128,
}

impl UintWidth {
    /// Encoded width in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            UintWidth::U8 => 1,
            UintWidth::U16 => 2,
            UintWidth::U32 => 4,
            UintWidth::U64 => 8,
            UintWidth::U128 => 16,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            UintWidth::U8 => "uint8",
            UintWidth::U16 => "uint16",
            UintWidth::U32 => "uint32",
            UintWidth::U64 => "uint64",
            UintWidth::U128 => "uint128",
        }
    }
}

/// Shape of an SSZ type as declared by its Rust implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    Bool,

    Uint(UintWidth),

    /// Inherently fixed-length array (`[T; N]`).
    Array { elem: Box<Schema>, len: usize },

    /// Variable-length sequence, optionally with a built-in bound.
    List {
        elem: Box<Schema>,
        max: Option<usize>,
    },

    Container(ContainerSchema),
}

impl Schema {
    /// Builds a container schema for `T`.
    pub fn container<T: 'static>(name: &'static str, fields: Vec<FieldSchema>) -> Self {
        Schema::Container(ContainerSchema {
            type_id: TypeId::of::<T>(),
            name,
            fields,
        })
    }

    pub fn array(elem: Schema, len: usize) -> Self {
        Schema::Array {
            elem: Box::new(elem),
            len,
        }
    }

    pub fn list(elem: Schema, max: Option<usize>) -> Self {
        Schema::List {
            elem: Box::new(elem),
            max,
        }
    }

    /// Short human-readable name used in errors.
    pub fn kind_name(&self) -> String {
        match self {
            Schema::Bool => "bool".to_owned(),
            Schema::Uint(w) => w.name().to_owned(),
            Schema::Array { elem, len } => format!("[{}; {len}]", elem.kind_name()),
            Schema::List { elem, max: Some(max) } => format!("List[{}, {max}]", elem.kind_name()),
            Schema::List { elem, max: None } => format!("List[{}]", elem.kind_name()),
            Schema::Container(c) => c.name.to_owned(),
        }
    }
}

/// Fields of a composite type in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSchema {
    pub type_id: TypeId,
    pub name: &'static str,
    pub fields: Vec<FieldSchema>,
}

/// A single container field and its size annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub schema: Schema,
    pub annotations: SizeAnnotations,
}

impl FieldSchema {
    pub fn new(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            annotations: SizeAnnotations::default(),
        }
    }

    pub fn size(mut self, size: &'static str) -> Self {
        self.annotations.size = Some(size);
        self
    }

    pub fn dyn_size(mut self, expr: &'static str) -> Self {
        self.annotations.dyn_size = Some(expr);
        self
    }

    pub fn max(mut self, max: &'static str) -> Self {
        self.annotations.max = Some(max);
        self
    }

    pub fn dyn_max(mut self, expr: &'static str) -> Self {
        self.annotations.dyn_max = Some(expr);
        self
    }
}
