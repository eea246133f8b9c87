//! The [`SszType`] trait and its impls for the built-in kinds.

use ssz_types::VariableList;

use crate::{
    error::{DynSszError, DynSszResult, FieldPath, PathSegment},
    fast::FastCodec,
    schema::{Schema, UintWidth},
    value::{SszValue, shape_error},
};

/// A type the engine can encode, decode and hash.
///
/// Implementations describe their shape with [`SszType::schema`] and convert
/// to and from the [`SszValue`] tree walked by the generic path.  A type
/// with a precompiled fixed-layout codec advertises it via
/// [`SszType::fast_codec`]; the engine uses it only while no specification
/// value changes the type's layout.
///
/// Application structs usually get this impl from
/// [`impl_ssz_container!`](crate::impl_ssz_container).
pub trait SszType: Sized + 'static {
    /// Static shape including field size annotations.
    fn schema() -> Schema;

    /// Lowers the value into a dynamic value tree.
    fn to_ssz_value(&self) -> SszValue;

    /// Rebuilds the value from a dynamic value tree.
    fn from_ssz_value(value: SszValue) -> DynSszResult<Self>;

    /// Fixed-layout operations available for this type.
    fn fast_codec() -> FastCodec<Self> {
        FastCodec::none()
    }
}

/// Schema of a field, inferred from an accessor closure.
///
/// Used by [`impl_ssz_container!`](crate::impl_ssz_container) so that the
/// macro does not need field types spelled out.
pub fn schema_of<S, T: SszType>(_accessor: impl Fn(&S) -> &T) -> Schema {
    T::schema()
}

impl SszType for bool {
    fn schema() -> Schema {
        Schema::Bool
    }

    fn to_ssz_value(&self) -> SszValue {
        SszValue::Bool(*self)
    }

    fn from_ssz_value(value: SszValue) -> DynSszResult<Self> {
        match value {
            SszValue::Bool(b) => Ok(b),
            other => Err(shape_error("bool", "bool", &other)),
        }
    }

    fn fast_codec() -> FastCodec<Self> {
        FastCodec::none().ssz_encode().ssz_decode()
    }
}

macro_rules! impl_ssz_uint {
    ($ty:ty, $width:ident, $variant:ident) => {
        impl SszType for $ty {
            fn schema() -> Schema {
                Schema::Uint(UintWidth::$width)
            }

            fn to_ssz_value(&self) -> SszValue {
                SszValue::$variant(*self)
            }

            fn from_ssz_value(value: SszValue) -> DynSszResult<Self> {
                match value {
                    SszValue::$variant(v) => Ok(v),
                    other => Err(shape_error(
                        stringify!($ty),
                        UintWidth::$width.name(),
                        &other,
                    )),
                }
            }

            fn fast_codec() -> FastCodec<Self> {
                FastCodec::none().ssz_encode().ssz_decode()
            }
        }
    };
}

impl_ssz_uint!(u8, U8, Uint8);
impl_ssz_uint!(u16, U16, Uint16);
impl_ssz_uint!(u32, U32, Uint32);
impl_ssz_uint!(u64, U64, Uint64);
impl_ssz_uint!(u128, U128, Uint128);

fn elements_from_values<T: SszType>(items: Vec<SszValue>) -> DynSszResult<Vec<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| T::from_ssz_value(item).map_err(|e| e.within(PathSegment::Index(i))))
        .collect()
}

impl<T: SszType, const N: usize> SszType for [T; N] {
    fn schema() -> Schema {
        Schema::array(T::schema(), N)
    }

    fn to_ssz_value(&self) -> SszValue {
        SszValue::Sequence(self.iter().map(SszType::to_ssz_value).collect())
    }

    fn from_ssz_value(value: SszValue) -> DynSszResult<Self> {
        let ty = Self::schema().kind_name();
        let items = value.into_sequence(&ty)?;
        let elems = elements_from_values::<T>(items)?;

        <[T; N]>::try_from(elems).map_err(|elems| DynSszError::LengthMismatch {
            ty,
            path: FieldPath::root(),
            expected: N.to_string(),
            actual: elems.len(),
        })
    }
}

impl<T: SszType> SszType for Vec<T> {
    fn schema() -> Schema {
        Schema::list(T::schema(), None)
    }

    fn to_ssz_value(&self) -> SszValue {
        SszValue::Sequence(self.iter().map(SszType::to_ssz_value).collect())
    }

    fn from_ssz_value(value: SszValue) -> DynSszResult<Self> {
        let items = value.into_sequence("Vec")?;
        elements_from_values(items)
    }
}

impl<T: SszType, const N: usize> SszType for VariableList<T, N> {
    fn schema() -> Schema {
        Schema::list(T::schema(), Some(N))
    }

    fn to_ssz_value(&self) -> SszValue {
        SszValue::Sequence(self.iter().map(SszType::to_ssz_value).collect())
    }

    fn from_ssz_value(value: SszValue) -> DynSszResult<Self> {
        let items = value.into_sequence("VariableList")?;
        if items.len() > N {
            return Err(DynSszError::LengthMismatch {
                ty: Self::schema().kind_name(),
                path: FieldPath::root(),
                expected: format!("at most {N}"),
                actual: items.len(),
            });
        }

        Ok(VariableList::from(elements_from_values::<T>(items)?))
    }
}

impl<T: SszType> SszType for Box<T> {
    fn schema() -> Schema {
        T::schema()
    }

    fn to_ssz_value(&self) -> SszValue {
        T::to_ssz_value(self)
    }

    fn from_ssz_value(value: SszValue) -> DynSszResult<Self> {
        T::from_ssz_value(value).map(Box::new)
    }
}

/// Implements [`SszType`] for a struct with named fields.
///
/// Fields are listed in declaration (wire) order.  Size annotations follow
/// the field name; an optional trailing `fast = [..]` list names the
/// fixed-layout operations the struct provides (`ssz_encode`, `ssz_decode`,
/// `tree_hash`).
///
/// ```ignore
/// impl_ssz_container!(BeaconState {
///     slot,
///     validators => { max: "1099511627776", dyn_max: "VALIDATOR_REGISTRY_LIMIT" },
///     block_roots => { size: "8192,32", dyn_size: "SLOTS_PER_HISTORICAL_ROOT,?" },
/// }, fast = [ssz_encode, ssz_decode, tree_hash]);
/// ```
#[macro_export]
macro_rules! impl_ssz_container {
    (
        $ty:ident {
            $( $field:ident $( => { $( $key:ident : $val:literal ),* $(,)? } )? ),* $(,)?
        }
        $(, fast = [ $( $cap:ident ),* $(,)? ] )?
        $(,)?
    ) => {
        impl $crate::SszType for $ty {
            fn schema() -> $crate::Schema {
                $crate::Schema::container::<Self>(
                    stringify!($ty),
                    vec![
                        $(
                            $crate::FieldSchema::new(
                                stringify!($field),
                                $crate::schema_of(|v: &$ty| &v.$field),
                            )
                            $( $( .$key($val) )* )?
                        ),*
                    ],
                )
            }

            fn to_ssz_value(&self) -> $crate::SszValue {
                $crate::SszValue::Container(vec![
                    $( $crate::SszType::to_ssz_value(&self.$field) ),*
                ])
            }

            fn from_ssz_value(value: $crate::SszValue) -> $crate::DynSszResult<Self> {
                let names: &[&str] = &[$( stringify!($field) ),*];
                #[allow(unused_mut, unused_variables, reason = "containers without fields")]
                let mut fields = value.into_fields(stringify!($ty), names.len())?;
                Ok(Self {
                    $( $field: fields.next_field(stringify!($field))?, )*
                })
            }

            $(
                fn fast_codec() -> $crate::FastCodec<Self> {
                    $crate::FastCodec::none() $( .$cap() )*
                }
            )?
        }
    };
}
