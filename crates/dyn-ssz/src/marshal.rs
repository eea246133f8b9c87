//! Generic SSZ encoder driven by a [`TypeDescriptor`].

use crate::{
    descriptor::{BYTES_PER_LENGTH_OFFSET, DescriptorKind, FieldDescriptor, TypeDescriptor},
    error::{DynSszError, DynSszResult, FieldPath},
    schema::UintWidth,
    value::SszValue,
};

/// Appends the encoding of `value` laid out per `desc` to `buf`.
///
/// On error `buf` may hold a partial encoding; the caller truncates it.
pub(crate) fn marshal_value(
    desc: &TypeDescriptor,
    value: &SszValue,
    buf: &mut Vec<u8>,
    path: &mut FieldPath,
) -> DynSszResult<()> {
    match (desc.kind(), value) {
        (DescriptorKind::Bool, SszValue::Bool(b)) => {
            buf.push(u8::from(*b));
            Ok(())
        }

        (DescriptorKind::Uint(width), value) => write_uint(*width, value, buf)
            .ok_or_else(|| value_mismatch(desc, value, path)),

        (DescriptorKind::Vector { elem, len }, SszValue::Sequence(items)) => {
            if items.len() != *len {
                return Err(DynSszError::LengthMismatch {
                    ty: desc.name().to_owned(),
                    path: path.clone(),
                    expected: len.to_string(),
                    actual: items.len(),
                });
            }
            marshal_sequence(elem, items, buf, path)
        }

        (DescriptorKind::List { elem, max }, SszValue::Sequence(items)) => {
            check_list_bound(desc, *max, items.len(), path)?;
            marshal_sequence(elem, items, buf, path)
        }

        (DescriptorKind::Container { fields }, SszValue::Container(values)) => {
            if fields.len() != values.len() {
                return Err(value_mismatch(desc, value, path));
            }
            marshal_container(desc, fields, values, buf, path)
        }

        (_, value) => Err(value_mismatch(desc, value, path)),
    }
}

fn marshal_sequence(
    elem: &TypeDescriptor,
    items: &[SszValue],
    buf: &mut Vec<u8>,
    path: &mut FieldPath,
) -> DynSszResult<()> {
    if elem.is_fixed_size() {
        for (i, item) in items.iter().enumerate() {
            path.push_index(i);
            marshal_value(elem, item, buf, path)?;
            path.pop();
        }
        return Ok(());
    }

    // Offset table first, then each element's payload.
    let start = buf.len();
    let table_end = start + items.len() * BYTES_PER_LENGTH_OFFSET;
    buf.resize(table_end, 0);

    for (i, item) in items.iter().enumerate() {
        path.push_index(i);
        let offset = buf.len() - start;
        write_offset(buf, start + i * BYTES_PER_LENGTH_OFFSET, offset, elem, path)?;
        marshal_value(elem, item, buf, path)?;
        path.pop();
    }

    Ok(())
}

fn marshal_container(
    desc: &TypeDescriptor,
    fields: &[FieldDescriptor],
    values: &[SszValue],
    buf: &mut Vec<u8>,
    path: &mut FieldPath,
) -> DynSszResult<()> {
    let start = buf.len();
    let mut pending = Vec::new();

    for (field, value) in fields.iter().zip(values) {
        if field.descriptor.is_fixed_size() {
            path.push_field(field.name);
            marshal_value(&field.descriptor, value, buf, path)?;
            path.pop();
        } else {
            pending.push((buf.len(), field, value));
            buf.extend_from_slice(&[0u8; BYTES_PER_LENGTH_OFFSET]);
        }
    }

    for (slot, field, value) in pending {
        path.push_field(field.name);
        let offset = buf.len() - start;
        write_offset(buf, slot, offset, desc, path)?;
        marshal_value(&field.descriptor, value, buf, path)?;
        path.pop();
    }

    Ok(())
}

/// Patches the offset placeholder at `slot`.
fn write_offset(
    buf: &mut [u8],
    slot: usize,
    offset: usize,
    desc: &TypeDescriptor,
    path: &FieldPath,
) -> DynSszResult<()> {
    let encoded = u32::try_from(offset).map_err(|_| DynSszError::OffsetRange {
        ty: desc.name().to_owned(),
        path: path.clone(),
        offset,
        valid: format!("<= {}", u32::MAX),
    })?;
    buf[slot..slot + BYTES_PER_LENGTH_OFFSET].copy_from_slice(&encoded.to_le_bytes());
    Ok(())
}

/// Little-endian encoding of a uint value of the given width.
pub(crate) fn write_uint(width: UintWidth, value: &SszValue, buf: &mut Vec<u8>) -> Option<()> {
    match (width, value) {
        (UintWidth::U8, SszValue::Uint8(v)) => buf.push(*v),
        (UintWidth::U16, SszValue::Uint16(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (UintWidth::U32, SszValue::Uint32(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (UintWidth::U64, SszValue::Uint64(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (UintWidth::U128, SszValue::Uint128(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        _ => return None,
    }
    Some(())
}

pub(crate) fn check_list_bound(
    desc: &TypeDescriptor,
    max: Option<usize>,
    len: usize,
    path: &FieldPath,
) -> DynSszResult<()> {
    match max {
        Some(max) if len > max => Err(DynSszError::LengthMismatch {
            ty: desc.name().to_owned(),
            path: path.clone(),
            expected: format!("at most {max}"),
            actual: len,
        }),
        _ => Ok(()),
    }
}

pub(crate) fn value_mismatch(
    desc: &TypeDescriptor,
    value: &SszValue,
    path: &FieldPath,
) -> DynSszError {
    DynSszError::UnsupportedType {
        ty: desc.name().to_owned(),
        path: path.clone(),
        reason: format!("{} value does not match descriptor", value.kind()),
    }
}
