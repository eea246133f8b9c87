//! Capabilities of the precompiled fixed-layout codec.
//!
//! Each operation is detected independently: a type may provide a fast
//! encoder but no fast hasher.  The usual source of these operations is the
//! `ssz`/`tree_hash` derive output, wired in with [`FastCodec::ssz_encode`],
//! [`FastCodec::ssz_decode`] and [`FastCodec::tree_hash`].

use std::fmt;

use ssz::{Decode, Encode};
use tree_hash::{Sha256Hasher, TreeHash};

/// Appends the encoding of a value to a buffer.
pub type MarshalFn<T> = fn(&T, &mut Vec<u8>) -> Result<(), String>;

/// Computes the encoded length of a value.
pub type SizeFn<T> = fn(&T) -> usize;

/// Decodes a value from exactly the given bytes.
pub type UnmarshalFn<T> = fn(&[u8]) -> Result<T, String>;

/// Computes the hash tree root of a value.
pub type HashRootFn<T> = fn(&T) -> Result<[u8; 32], String>;

/// Operations a type's fixed-layout codec provides.
pub struct FastCodec<T> {
    marshal: Option<(MarshalFn<T>, SizeFn<T>)>,
    unmarshal: Option<UnmarshalFn<T>>,
    hash_root: Option<HashRootFn<T>>,
}

impl<T> FastCodec<T> {
    /// No fixed-layout operations; every call takes the generic path.
    pub const fn none() -> Self {
        Self {
            marshal: None,
            unmarshal: None,
            hash_root: None,
        }
    }

    pub fn with_marshal(mut self, marshal: MarshalFn<T>, size: SizeFn<T>) -> Self {
        self.marshal = Some((marshal, size));
        self
    }

    pub fn with_unmarshal(mut self, unmarshal: UnmarshalFn<T>) -> Self {
        self.unmarshal = Some(unmarshal);
        self
    }

    pub fn with_hash_root(mut self, hash_root: HashRootFn<T>) -> Self {
        self.hash_root = Some(hash_root);
        self
    }

    pub fn marshal_fn(&self) -> Option<MarshalFn<T>> {
        self.marshal.map(|(f, _)| f)
    }

    pub fn size_fn(&self) -> Option<SizeFn<T>> {
        self.marshal.map(|(_, f)| f)
    }

    pub fn unmarshal_fn(&self) -> Option<UnmarshalFn<T>> {
        self.unmarshal
    }

    pub fn hash_root_fn(&self) -> Option<HashRootFn<T>> {
        self.hash_root
    }

    pub fn has_marshal(&self) -> bool {
        self.marshal.is_some()
    }

    pub fn has_unmarshal(&self) -> bool {
        self.unmarshal.is_some()
    }

    pub fn has_hash_root(&self) -> bool {
        self.hash_root.is_some()
    }
}

impl<T: Encode> FastCodec<T> {
    /// Uses the type's [`Encode`] impl for marshalling and sizing.
    pub fn ssz_encode(self) -> Self {
        self.with_marshal(ssz_append::<T>, ssz_bytes_len::<T>)
    }
}

impl<T: Decode> FastCodec<T> {
    /// Uses the type's [`Decode`] impl for unmarshalling.
    pub fn ssz_decode(self) -> Self {
        self.with_unmarshal(ssz_from_bytes::<T>)
    }
}

impl<T: TreeHash<Sha256Hasher>> FastCodec<T> {
    /// Uses the type's [`TreeHash`] impl for hash tree roots.
    pub fn tree_hash(self) -> Self {
        self.with_hash_root(tree_hash_root::<T>)
    }
}

impl<T> Default for FastCodec<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> fmt::Debug for FastCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastCodec")
            .field("marshal", &self.has_marshal())
            .field("unmarshal", &self.has_unmarshal())
            .field("hash_root", &self.has_hash_root())
            .finish()
    }
}

fn ssz_append<T: Encode>(value: &T, buf: &mut Vec<u8>) -> Result<(), String> {
    value.ssz_append(buf);
    Ok(())
}

fn ssz_bytes_len<T: Encode>(value: &T) -> usize {
    value.ssz_bytes_len()
}

fn ssz_from_bytes<T: Decode>(bytes: &[u8]) -> Result<T, String> {
    T::from_ssz_bytes(bytes).map_err(|e| format!("{e:?}"))
}

fn tree_hash_root<T: TreeHash<Sha256Hasher>>(value: &T) -> Result<[u8; 32], String> {
    Ok(TreeHash::<Sha256Hasher>::tree_hash_root(value).0)
}
