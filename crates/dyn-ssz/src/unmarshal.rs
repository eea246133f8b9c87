//! Generic SSZ decoder driven by a [`TypeDescriptor`].

use std::ops::Range;

use crate::{
    descriptor::{BYTES_PER_LENGTH_OFFSET, DescriptorKind, FieldDescriptor, TypeDescriptor},
    error::{DynSszError, DynSszResult, FieldPath},
    marshal::check_list_bound,
    schema::UintWidth,
    value::SszValue,
};

/// Decodes `bytes`, which must be exactly the encoding of one value of
/// `desc`.
pub(crate) fn unmarshal_value(
    desc: &TypeDescriptor,
    bytes: &[u8],
    path: &mut FieldPath,
) -> DynSszResult<SszValue> {
    if let Some(size) = desc.fixed_size() {
        check_exact_len(desc, size, bytes.len(), path)?;
    }

    match desc.kind() {
        DescriptorKind::Bool => match bytes[0] {
            0 => Ok(SszValue::Bool(false)),
            1 => Ok(SszValue::Bool(true)),
            b => Err(DynSszError::InvalidValue {
                ty: desc.name().to_owned(),
                path: path.clone(),
                reason: format!("boolean byte {b:#04x}"),
            }),
        },

        DescriptorKind::Uint(width) => Ok(read_uint(*width, bytes)),

        DescriptorKind::Vector { elem, len } => {
            if elem.is_fixed_size() {
                unmarshal_fixed_elems(elem, bytes, path)
            } else {
                unmarshal_offset_elems(desc, elem, Some(*len), None, bytes, path)
            }
        }

        DescriptorKind::List { elem, max } => match elem.fixed_size() {
            Some(esize) => {
                if bytes.len() % esize != 0 {
                    return Err(DynSszError::LengthMismatch {
                        ty: desc.name().to_owned(),
                        path: path.clone(),
                        expected: format!("a multiple of {esize} bytes"),
                        actual: bytes.len(),
                    });
                }
                check_list_bound(desc, *max, bytes.len() / esize, path)?;
                unmarshal_fixed_elems(elem, bytes, path)
            }
            None => unmarshal_offset_elems(desc, elem, None, *max, bytes, path),
        },

        DescriptorKind::Container { fields } => unmarshal_container(desc, fields, bytes, path),
    }
}

fn check_exact_len(
    desc: &TypeDescriptor,
    size: usize,
    available: usize,
    path: &FieldPath,
) -> DynSszResult<()> {
    if available < size {
        return Err(DynSszError::BufferTooShort {
            ty: desc.name().to_owned(),
            path: path.clone(),
            needed: size,
            available,
        });
    }
    if available > size {
        return Err(DynSszError::TrailingData {
            ty: desc.name().to_owned(),
            path: path.clone(),
            consumed: size,
            available,
        });
    }
    Ok(())
}

fn unmarshal_fixed_elems(
    elem: &TypeDescriptor,
    bytes: &[u8],
    path: &mut FieldPath,
) -> DynSszResult<SszValue> {
    let Some(esize) = elem.fixed_size() else {
        return Ok(SszValue::Sequence(Vec::new()));
    };

    let mut items = Vec::with_capacity(bytes.len() / esize);
    for (i, part) in bytes.chunks_exact(esize).enumerate() {
        path.push_index(i);
        items.push(unmarshal_value(elem, part, path)?);
        path.pop();
    }
    Ok(SszValue::Sequence(items))
}

/// Decodes a sequence of variable-size elements behind an offset table.
///
/// `count` is the required element count for vectors; lists derive the
/// count from the first offset and check it against `max`.
fn unmarshal_offset_elems(
    desc: &TypeDescriptor,
    elem: &TypeDescriptor,
    count: Option<usize>,
    max: Option<usize>,
    bytes: &[u8],
    path: &mut FieldPath,
) -> DynSszResult<SszValue> {
    if bytes.is_empty() && count.is_none() {
        return Ok(SszValue::Sequence(Vec::new()));
    }

    let table_min = count.unwrap_or(1) * BYTES_PER_LENGTH_OFFSET;
    if bytes.len() < table_min {
        return Err(DynSszError::BufferTooShort {
            ty: desc.name().to_owned(),
            path: path.clone(),
            needed: table_min,
            available: bytes.len(),
        });
    }

    let first = read_offset(bytes, 0);
    let first_valid = match count {
        Some(n) => first == n * BYTES_PER_LENGTH_OFFSET,
        None => first != 0 && first % BYTES_PER_LENGTH_OFFSET == 0 && first <= bytes.len(),
    };
    if !first_valid {
        let valid = match count {
            Some(n) => format!("== {}", n * BYTES_PER_LENGTH_OFFSET),
            None => format!(
                "non-zero multiple of {BYTES_PER_LENGTH_OFFSET} <= {}",
                bytes.len()
            ),
        };
        return Err(DynSszError::OffsetRange {
            ty: desc.name().to_owned(),
            path: path.clone(),
            offset: first,
            valid,
        });
    }

    let len = first / BYTES_PER_LENGTH_OFFSET;
    check_list_bound(desc, max, len, path)?;

    let mut offsets = Vec::with_capacity(len);
    offsets.push(first);
    for i in 1..len {
        let offset = read_offset(bytes, i * BYTES_PER_LENGTH_OFFSET);
        check_next_offset(desc, offsets[i - 1], offset, bytes.len(), path)?;
        offsets.push(offset);
    }

    let mut items = Vec::with_capacity(len);
    for (i, start) in offsets.iter().enumerate() {
        let end = offsets.get(i + 1).copied().unwrap_or(bytes.len());
        path.push_index(i);
        items.push(unmarshal_value(elem, &bytes[*start..end], path)?);
        path.pop();
    }
    Ok(SszValue::Sequence(items))
}

fn unmarshal_container(
    desc: &TypeDescriptor,
    fields: &[FieldDescriptor],
    bytes: &[u8],
    path: &mut FieldPath,
) -> DynSszResult<SszValue> {
    let fixed_len: usize = fields.iter().map(|f| f.descriptor.fixed_part_len()).sum();
    if bytes.len() < fixed_len {
        return Err(DynSszError::BufferTooShort {
            ty: desc.name().to_owned(),
            path: path.clone(),
            needed: fixed_len,
            available: bytes.len(),
        });
    }

    // Byte range of every field; dynamic ranges are closed by the next
    // dynamic field's offset or the end of the buffer.
    let mut ranges: Vec<Range<usize>> = Vec::with_capacity(fields.len());
    let mut last_dynamic: Option<usize> = None;
    let mut pos = 0;

    for field in fields {
        let part = field.descriptor.fixed_part_len();
        if field.descriptor.is_fixed_size() {
            ranges.push(pos..pos + part);
        } else {
            path.push_field(field.name);
            let offset = read_offset(bytes, pos);
            match last_dynamic {
                None if offset != fixed_len => {
                    return Err(DynSszError::OffsetRange {
                        ty: desc.name().to_owned(),
                        path: path.clone(),
                        offset,
                        valid: format!("== {fixed_len}"),
                    });
                }
                None => {}
                Some(idx) => {
                    check_next_offset(desc, ranges[idx].start, offset, bytes.len(), path)?;
                    ranges[idx].end = offset;
                }
            }
            path.pop();

            last_dynamic = Some(ranges.len());
            ranges.push(offset..bytes.len());
        }
        pos += part;
    }

    let mut values = Vec::with_capacity(fields.len());
    for (field, range) in fields.iter().zip(ranges) {
        path.push_field(field.name);
        values.push(unmarshal_value(&field.descriptor, &bytes[range], path)?);
        path.pop();
    }
    Ok(SszValue::Container(values))
}

fn check_next_offset(
    desc: &TypeDescriptor,
    previous: usize,
    offset: usize,
    len: usize,
    path: &FieldPath,
) -> DynSszResult<()> {
    if offset < previous {
        return Err(DynSszError::OffsetOrder {
            ty: desc.name().to_owned(),
            path: path.clone(),
            previous,
            offset,
        });
    }
    if offset > len {
        return Err(DynSszError::OffsetRange {
            ty: desc.name().to_owned(),
            path: path.clone(),
            offset,
            valid: format!("{previous}..={len}"),
        });
    }
    Ok(())
}

/// Reads the little-endian offset at `pos`; the caller checks bounds.
fn read_offset(bytes: &[u8], pos: usize) -> usize {
    u32::from_le_bytes(le_array(&bytes[pos..])) as usize
}

fn read_uint(width: UintWidth, bytes: &[u8]) -> SszValue {
    match width {
        UintWidth::U8 => SszValue::Uint8(bytes[0]),
        UintWidth::U16 => SszValue::Uint16(u16::from_le_bytes(le_array(bytes))),
        UintWidth::U32 => SszValue::Uint32(u32::from_le_bytes(le_array(bytes))),
        UintWidth::U64 => SszValue::Uint64(u64::from_le_bytes(le_array(bytes))),
        UintWidth::U128 => SszValue::Uint128(u128::from_le_bytes(le_array(bytes))),
    }
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}
