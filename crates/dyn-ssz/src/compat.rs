//! Fast-path compatibility of a type with its fixed-layout codec.

use crate::{descriptor::TypeDescriptor, fast::FastCodec};

/// An engine operation that may be delegated to the fixed-layout codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastOp {
    /// Marshalling and size computation.
    Marshal,
    Unmarshal,
    HashRoot,
}

/// Cached capability flags of a type.
///
/// The fixed-layout codec was compiled against the default sizes, so a type
/// whose layout is touched by any specification value anywhere in its type
/// tree can never use it, whatever capabilities it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastPathCompatibility {
    pub marshal: bool,
    pub unmarshal: bool,
    pub hash_root: bool,
    pub has_dynamic_spec_values: bool,
}

impl FastPathCompatibility {
    pub(crate) fn detect<T>(codec: &FastCodec<T>, descriptor: &TypeDescriptor) -> Self {
        Self {
            marshal: codec.has_marshal(),
            unmarshal: codec.has_unmarshal(),
            hash_root: codec.has_hash_root(),
            has_dynamic_spec_values: descriptor.has_spec_override(),
        }
    }

    /// Whether `op` may be delegated to the fixed-layout codec.
    pub fn allows(&self, op: FastOp) -> bool {
        let capable = match op {
            FastOp::Marshal => self.marshal,
            FastOp::Unmarshal => self.unmarshal,
            FastOp::HashRoot => self.hash_root,
        };
        capable && !self.has_dynamic_spec_values
    }
}
