//! Encoded size computation for the generic path.

use crate::{
    descriptor::{BYTES_PER_LENGTH_OFFSET, DescriptorKind, TypeDescriptor},
    error::{DynSszError, DynSszResult, FieldPath},
    marshal::{check_list_bound, value_mismatch},
    value::SszValue,
};

/// Length the generic encoder would produce for `value`.
///
/// Performs the same length checks as the encoder so the two never disagree
/// on which values are encodable.
pub(crate) fn value_size(
    desc: &TypeDescriptor,
    value: &SszValue,
    path: &mut FieldPath,
) -> DynSszResult<usize> {
    match (desc.kind(), value) {
        (DescriptorKind::Bool, SszValue::Bool(_)) => Ok(1),

        (DescriptorKind::Uint(width), value) => {
            if value.kind() != width.name() {
                return Err(value_mismatch(desc, value, path));
            }
            Ok(width.bytes())
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
            sequence_size(elem, items, path)
        }

        (DescriptorKind::List { elem, max }, SszValue::Sequence(items)) => {
            check_list_bound(desc, *max, items.len(), path)?;
            sequence_size(elem, items, path)
        }

        (DescriptorKind::Container { fields }, SszValue::Container(values))
            if fields.len() == values.len() =>
        {
            let mut total = 0;
            for (field, value) in fields.iter().zip(values) {
                path.push_field(field.name);
                total += value_size(&field.descriptor, value, path)?;
                if !field.descriptor.is_fixed_size() {
                    total += BYTES_PER_LENGTH_OFFSET;
                }
                path.pop();
            }
            Ok(total)
        }

        (_, value) => Err(value_mismatch(desc, value, path)),
    }
}

fn sequence_size(
    elem: &TypeDescriptor,
    items: &[SszValue],
    path: &mut FieldPath,
) -> DynSszResult<usize> {
    let per_item_offset = if elem.is_fixed_size() {
        0
    } else {
        BYTES_PER_LENGTH_OFFSET
    };

    let mut total = 0;
    for (i, item) in items.iter().enumerate() {
        path.push_index(i);
        total += value_size(elem, item, path)? + per_item_offset;
        path.pop();
    }
    Ok(total)
}
