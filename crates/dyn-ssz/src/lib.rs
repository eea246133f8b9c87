//! SSZ encoding whose layout follows runtime specification values.
//!
//! Types declare their static shape through [`SszType`], with per-field size
//! annotations naming specification values (`SLOTS_PER_HISTORICAL_ROOT`,
//! `SYNC_COMMITTEE_SIZE/8`, ...).  A [`DynSsz`] engine resolves those names
//! against its [`SpecRegistry`] and encodes, decodes and hashes values with
//! the resulting layout.  Types whose layout is unaffected by the registry
//! are delegated to their precompiled fixed-layout codec when they have one.

// Dev-dependencies only used by the integration tests.
#[cfg(test)]
use proptest as _;
#[cfg(test)]
use strata_test_utils_dyn_ssz as _;

mod cache;
mod compat;
mod descriptor;
mod engine;
mod error;
mod fast;
mod hash;
mod hints;
mod marshal;
mod merkle;
mod schema;
mod size;
mod spec;
mod types;
mod unmarshal;
mod value;

pub use compat::{FastOp, FastPathCompatibility};
pub use descriptor::{
    BYTES_PER_LENGTH_OFFSET, DescriptorKind, FieldDescriptor, SszSize, TypeDescriptor,
};
pub use engine::{DynSsz, DynSszBuilder, DynSszConfig};
pub use error::{DynSszError, DynSszResult, FieldPath, PathSegment};
pub use fast::{FastCodec, HashRootFn, MarshalFn, SizeFn, UnmarshalFn};
pub use hints::{SizeAnnotations, SizeHint};
pub use schema::{ContainerSchema, FieldSchema, Schema, UintWidth};
pub use spec::{SpecExprError, SpecRegistry, SpecValues};
pub use types::{SszType, schema_of};
pub use value::{FieldValues, SszValue, shape_error};
