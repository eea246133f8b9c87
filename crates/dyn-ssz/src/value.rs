//! Dynamic value tree that typed values are lowered into for the generic
//! codec path.

use std::vec;

use crate::{
    error::{DynSszError, DynSszResult, FieldPath, PathSegment},
    types::SszType,
};

/// A value lowered from its Rust type, shaped like its [`Schema`](crate::Schema).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SszValue {
    Bool(bool),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Uint128(u128),

    /// Elements of an array, vector or list.
    Sequence(Vec<SszValue>),

    /// Container fields in declaration order.
    Container(Vec<SszValue>),
}

impl SszValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SszValue::Bool(_) => "bool",
            SszValue::Uint8(_) => "uint8",
            SszValue::Uint16(_) => "uint16",
            SszValue::Uint32(_) => "uint32",
            SszValue::Uint64(_) => "uint64",
            SszValue::Uint128(_) => "uint128",
            SszValue::Sequence(_) => "sequence",
            SszValue::Container(_) => "container",
        }
    }

    /// Unwraps a sequence value.
    pub fn into_sequence(self, ty: &str) -> DynSszResult<Vec<SszValue>> {
        match self {
            SszValue::Sequence(items) => Ok(items),
            other => Err(shape_error(ty, "sequence", &other)),
        }
    }

    /// Unwraps a container value holding exactly `count` fields.
    pub fn into_fields(self, ty: &str, count: usize) -> DynSszResult<FieldValues> {
        match self {
            SszValue::Container(fields) if fields.len() == count => Ok(FieldValues {
                ty: ty.to_owned(),
                inner: fields.into_iter(),
            }),
            SszValue::Container(fields) => Err(DynSszError::UnsupportedType {
                ty: ty.to_owned(),
                path: FieldPath::root(),
                reason: format!("expected {count} fields, found {}", fields.len()),
            }),
            other => Err(shape_error(ty, "container", &other)),
        }
    }
}

/// Field values of a container, consumed in declaration order.
#[derive(Debug)]
pub struct FieldValues {
    ty: String,
    inner: vec::IntoIter<SszValue>,
}

impl FieldValues {
    pub fn next_value(&mut self) -> DynSszResult<SszValue> {
        self.inner.next().ok_or_else(|| DynSszError::UnsupportedType {
            ty: self.ty.clone(),
            path: FieldPath::root(),
            reason: "container ran out of field values".to_owned(),
        })
    }

    /// Converts the next field value, reporting failures under `name`.
    pub fn next_field<T: SszType>(&mut self, name: &'static str) -> DynSszResult<T> {
        let value = self.next_value()?;
        T::from_ssz_value(value).map_err(|e| e.within(PathSegment::Field(name)))
    }
}

/// Error for a value whose variant does not match what the type expects.
pub fn shape_error(ty: &str, expected: &str, found: &SszValue) -> DynSszError {
    DynSszError::UnsupportedType {
        ty: ty.to_owned(),
        path: FieldPath::root(),
        reason: format!("expected {expected} value, found {}", found.kind()),
    }
}
