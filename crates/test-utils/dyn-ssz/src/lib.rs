//! Test utilities for the dynamic SSZ engine.

// Referenced by the derive expansions in `fixtures`.
use ssz as _;
use strata_dyn_ssz::{DynSsz, DynSszConfig, SpecRegistry, SpecValues};
use tree_hash as _;

pub mod fixtures;
pub mod strategies;

#[doc(hidden)]
pub use proptest as __proptest;

/// Engine without any specification values.
pub fn default_engine() -> DynSsz {
    DynSsz::new(SpecRegistry::empty())
}

/// Engine built from `(name, value)` pairs as a single layer.
///
/// Panics if a name is given twice.
pub fn engine_with(pairs: &[(&str, u64)]) -> DynSsz {
    let layer = SpecValues::try_from_pairs(pairs.iter().copied())
        .expect("test: distinct spec value names");
    DynSsz::builder()
        .with_spec_values(layer)
        .build()
        .expect("test: valid spec values")
}

/// Engine with the same registry as `engine` that never uses fast paths.
pub fn forced_dynamic(engine: &DynSsz) -> DynSsz {
    DynSsz::with_config(
        engine.registry().clone(),
        DynSszConfig {
            force_dynamic: true,
        },
    )
}

/// Generates property tests for a type implementing `SszType`:
///
/// - encode then decode yields the original value,
/// - the computed size equals the encoded length,
/// - the generic path agrees with the fast path on bytes and root.
///
/// The optional third argument builds the engine under test (defaults to
/// [`default_engine`]).  Invoke once per module.
#[macro_export]
macro_rules! dyn_ssz_proptest {
    ($ty:ty, $strategy:expr) => {
        $crate::dyn_ssz_proptest!($ty, $strategy, $crate::default_engine());
    };

    ($ty:ty, $strategy:expr, $engine:expr) => {
        $crate::__proptest::proptest! {
            #[test]
            fn dyn_ssz_roundtrip(value in $strategy) {
                let engine = $engine;
                let bytes = engine.marshal(&value).expect("test: marshal");
                let decoded: $ty = engine.unmarshal(&bytes).expect("test: unmarshal");
                $crate::__proptest::prop_assert_eq!(&decoded, &value);
            }

            #[test]
            fn dyn_ssz_size_matches_encoding(value in $strategy) {
                let engine = $engine;
                let bytes = engine.marshal(&value).expect("test: marshal");
                let size = engine.size_ssz(&value).expect("test: size");
                $crate::__proptest::prop_assert_eq!(size, bytes.len());
            }

            #[test]
            fn dyn_ssz_generic_matches_fast(value in $strategy) {
                let engine = $engine;
                let generic = $crate::forced_dynamic(&engine);

                let fast_bytes = engine.marshal(&value).expect("test: marshal");
                let generic_bytes = generic.marshal(&value).expect("test: generic marshal");
                $crate::__proptest::prop_assert_eq!(&fast_bytes, &generic_bytes);

                let fast_root = engine.hash_tree_root(&value).expect("test: root");
                let generic_root = generic.hash_tree_root(&value).expect("test: generic root");
                $crate::__proptest::prop_assert_eq!(fast_root, generic_root);

                let decoded: $ty = generic.unmarshal(&fast_bytes).expect("test: generic unmarshal");
                $crate::__proptest::prop_assert_eq!(&decoded, &value);
            }
        }
    };
}
