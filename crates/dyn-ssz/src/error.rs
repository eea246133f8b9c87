//! Error types for the dynamic SSZ engine.

use std::fmt;

use thiserror::Error;

/// Errors produced while resolving, encoding, decoding or hashing a value.
///
/// Structural variants carry the name of the type being processed and the
/// field path leading to it from the top-level value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DynSszError {
    /// The specification registry could not be built.
    #[error("invalid specification: {0}")]
    Configuration(String),

    /// The type (or the value lowered from it) cannot be processed.
    #[error("unsupported type {ty} at {path}: {reason}")]
    UnsupportedType {
        ty: String,
        path: FieldPath,
        reason: String,
    },

    /// A size annotation does not fit the kind it was applied to.
    #[error("size hint mismatch for {ty} at {path}: {reason}")]
    HintMismatch {
        ty: String,
        path: FieldPath,
        reason: String,
    },

    /// A runtime length disagrees with the length the descriptor demands.
    #[error("length mismatch for {ty} at {path}: expected {expected}, got {actual}")]
    LengthMismatch {
        ty: String,
        path: FieldPath,
        expected: String,
        actual: usize,
    },

    /// A dynamic offset is smaller than the one before it.
    #[error("offset {offset} for {ty} at {path} precedes previous offset {previous}")]
    OffsetOrder {
        ty: String,
        path: FieldPath,
        previous: usize,
        offset: usize,
    },

    /// A dynamic offset points outside of the region it belongs to.
    #[error("offset {offset} for {ty} at {path} out of range (valid {valid})")]
    OffsetRange {
        ty: String,
        path: FieldPath,
        offset: usize,
        valid: String,
    },

    /// The buffer ends before the fixed part of the value.
    #[error("buffer too short for {ty} at {path}: need {needed} bytes, have {available}")]
    BufferTooShort {
        ty: String,
        path: FieldPath,
        needed: usize,
        available: usize,
    },

    /// The buffer holds more bytes than the fixed-size value consumes.
    #[error("trailing data after {ty} at {path}: consumed {consumed} of {available} bytes")]
    TrailingData {
        ty: String,
        path: FieldPath,
        consumed: usize,
        available: usize,
    },

    /// Encoded bytes outside the domain of a leaf type, such as a boolean
    /// byte other than 0 or 1.
    #[error("invalid value for {ty} at {path}: {reason}")]
    InvalidValue {
        ty: String,
        path: FieldPath,
        reason: String,
    },

    /// The fixed-layout codec rejected the input it was delegated.
    #[error("fixed-layout codec failed for {ty}: {reason}")]
    FixedCodec { ty: String, reason: String },
}

impl DynSszError {
    /// Prepends `seg` to the error's field path, for errors raised by a
    /// nested value that only knows its own position.
    pub(crate) fn within(mut self, seg: PathSegment) -> Self {
        match &mut self {
            Self::UnsupportedType { path, .. }
            | Self::HintMismatch { path, .. }
            | Self::LengthMismatch { path, .. }
            | Self::OffsetOrder { path, .. }
            | Self::OffsetRange { path, .. }
            | Self::BufferTooShort { path, .. }
            | Self::TrailingData { path, .. }
            | Self::InvalidValue { path, .. } => path.0.insert(0, seg),
            Self::Configuration(_) | Self::FixedCodec { .. } => {}
        }
        self
    }
}

/// Convenience alias used throughout the crate.
pub type DynSszResult<T> = Result<T, DynSszError>;

/// A single step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(&'static str),
    Index(usize),
}

/// Location of a value inside the top-level value, rendered as
/// `field.nested[3].leaf`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push_field(&mut self, name: &'static str) {
        self.0.push(PathSegment::Field(name));
    }

    pub(crate) fn push_index(&mut self, idx: usize) {
        self.0.push(PathSegment::Index(idx));
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }

        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }

        Ok(())
    }
}
