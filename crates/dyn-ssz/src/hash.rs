//! Hash tree root computation for the generic path.

use crate::{
    descriptor::{DescriptorKind, TypeDescriptor},
    error::{DynSszError, DynSszResult, FieldPath},
    marshal::{check_list_bound, value_mismatch, write_uint},
    merkle::{BYTES_PER_CHUNK, Chunk, chunk_count, merkleize, mix_in_length, pack},
    value::SszValue,
};

/// Computes the SSZ hash tree root of `value` laid out per `desc`.
pub(crate) fn hash_value(
    desc: &TypeDescriptor,
    value: &SszValue,
    path: &mut FieldPath,
) -> DynSszResult<Chunk> {
    match (desc.kind(), value) {
        (DescriptorKind::Bool | DescriptorKind::Uint(_), value) => {
            let mut bytes = Vec::with_capacity(BYTES_PER_CHUNK);
            write_leaf(desc, value, &mut bytes, path)?;

            let mut chunk = [0u8; BYTES_PER_CHUNK];
            chunk[..bytes.len()].copy_from_slice(&bytes);
            Ok(chunk)
        }

        (DescriptorKind::Vector { elem, len }, SszValue::Sequence(items)) => {
            if items.len() != *len {
                return Err(DynSszError::LengthMismatch {
                    ty: desc.name().to_owned(),
                    path: path.clone(),
                    expected: len.to_string(),
                    actual: items.len(),
                });
            }
            merkleize_sequence(desc, elem, items, Some(*len), path)
        }

        (DescriptorKind::List { elem, max }, SszValue::Sequence(items)) => {
            check_list_bound(desc, *max, items.len(), path)?;
            let root = merkleize_sequence(desc, elem, items, *max, path)?;
            Ok(mix_in_length(&root, items.len()))
        }

        (DescriptorKind::Container { fields }, SszValue::Container(values))
            if fields.len() == values.len() =>
        {
            let mut roots = Vec::with_capacity(fields.len());
            for (field, value) in fields.iter().zip(values) {
                path.push_field(field.name);
                roots.push(hash_value(&field.descriptor, value, path)?);
                path.pop();
            }
            merkleize(&roots, None).ok_or_else(|| value_mismatch(desc, value, path))
        }

        (_, value) => Err(value_mismatch(desc, value, path)),
    }
}

/// Merkleizes the elements of a vector or list, `limit` being the element
/// count the tree is sized for.
fn merkleize_sequence(
    desc: &TypeDescriptor,
    elem: &TypeDescriptor,
    items: &[SszValue],
    limit: Option<usize>,
    path: &mut FieldPath,
) -> DynSszResult<Chunk> {
    let (chunks, chunk_limit) = if elem.is_basic() {
        let esize = elem.fixed_part_len();
        let mut bytes = Vec::with_capacity(items.len() * esize);
        for (i, item) in items.iter().enumerate() {
            path.push_index(i);
            write_leaf(elem, item, &mut bytes, path)?;
            path.pop();
        }
        (pack(&bytes), limit.map(|n| chunk_count(n, esize)))
    } else {
        let mut roots = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            path.push_index(i);
            roots.push(hash_value(elem, item, path)?);
            path.pop();
        }
        (roots, limit)
    };

    merkleize(&chunks, chunk_limit).ok_or_else(|| DynSszError::LengthMismatch {
        ty: desc.name().to_owned(),
        path: path.clone(),
        expected: format!("at most {} chunks", chunk_limit.unwrap_or(chunks.len())),
        actual: chunks.len(),
    })
}

fn write_leaf(
    desc: &TypeDescriptor,
    value: &SszValue,
    buf: &mut Vec<u8>,
    path: &FieldPath,
) -> DynSszResult<()> {
    match (desc.kind(), value) {
        (DescriptorKind::Bool, SszValue::Bool(b)) => {
            buf.push(u8::from(*b));
            Ok(())
        }
        (DescriptorKind::Uint(width), value) => {
            write_uint(*width, value, buf).ok_or_else(|| value_mismatch(desc, value, path))
        }
        (_, value) => Err(value_mismatch(desc, value, path)),
    }
}
