//! Agreement between the fixed-layout codec and the generic path, and
//! concurrent use of a shared engine.

#![expect(unused_crate_dependencies, reason = "test dependencies")]

use std::{sync::Arc, thread};

use proptest::prelude::*;
use strata_dyn_ssz::{DynSsz, FastOp};
use strata_test_utils_dyn_ssz::{
    default_engine, dyn_ssz_proptest, engine_with, fixtures::*, forced_dynamic, strategies::*,
};
use tree_hash::{Sha256Hasher, TreeHash};

mod checkpoint_header {
    use super::*;

    dyn_ssz_proptest!(CheckpointHeader, arb_checkpoint_header());
}

mod envelope {
    use super::*;

    dyn_ssz_proptest!(Envelope, arb_envelope());
}

mod balance_registry {
    use super::*;

    dyn_ssz_proptest!(BalanceRegistry, arb_balance_registry());
}

mod balance_registry_limited {
    use super::*;

    dyn_ssz_proptest!(
        BalanceRegistry,
        arb_balance_registry(),
        engine_with(&[("VALIDATOR_REGISTRY_LIMIT", 64)])
    );
}

mod mixed_struct {
    use super::*;

    dyn_ssz_proptest!(MixedStruct, arb_mixed_struct());
}

mod dyn_struct_vector {
    use super::*;

    dyn_ssz_proptest!(DynStructVector, arb_dyn_struct_vector());
}

mod nested_lists {
    use super::*;

    dyn_ssz_proptest!(NestedLists, arb_nested_lists());
}

mod historical_roots_minimal {
    use super::*;

    dyn_ssz_proptest!(
        HistoricalRoots,
        arb_historical_roots(4, 4),
        engine_with(&[("SLOTS_PER_HISTORICAL_ROOT", 4), ("SYNC_COMMITTEE_SIZE", 32)])
    );
}

proptest! {
    #[test]
    fn generic_root_matches_tree_hash(value in arb_envelope()) {
        let generic = forced_dynamic(&default_engine());
        let expected = TreeHash::<Sha256Hasher>::tree_hash_root(&value);
        prop_assert_eq!(generic.hash_tree_root(&value).unwrap(), expected.0);
    }

    #[test]
    fn generic_bytes_match_ssz_encode(value in arb_envelope()) {
        let generic = forced_dynamic(&default_engine());
        prop_assert_eq!(generic.marshal(&value).unwrap(), ssz::Encode::as_ssz_bytes(&value));
    }
}

#[test]
fn test_capabilities_detected_independently() {
    let engine = default_engine();

    let header = engine.fast_path_compatibility::<CheckpointHeader>().unwrap();
    assert!(header.allows(FastOp::Marshal));
    assert!(header.allows(FastOp::Unmarshal));
    assert!(header.allows(FastOp::HashRoot));

    // Primitives only wire up the byte codec.
    let word = engine.fast_path_compatibility::<u32>().unwrap();
    assert!(word.allows(FastOp::Marshal));
    assert!(word.allows(FastOp::Unmarshal));
    assert!(!word.allows(FastOp::HashRoot));

    let mixed = engine.fast_path_compatibility::<MixedStruct>().unwrap();
    assert!(!mixed.marshal && !mixed.unmarshal && !mixed.hash_root);
}

#[test]
fn test_forced_dynamic_config() {
    let engine = DynSsz::builder().force_dynamic(true).build().unwrap();
    assert!(engine.config().force_dynamic);

    // Eligibility is still reported; the config only skips delegation.
    let compat = engine.fast_path_compatibility::<CheckpointHeader>().unwrap();
    assert!(compat.allows(FastOp::Marshal));
}

#[test]
fn test_shared_engine_across_threads() {
    let engine = Arc::new(default_engine());
    let generic = Arc::new(forced_dynamic(&engine));
    let value = Envelope {
        seq: 7,
        header: CheckpointHeader {
            epoch: 1,
            l1_view_update_height: 2,
            terminal_slot: 3,
            terminal_blkid: [0xaa; 32],
            final_state_root: [0xbb; 32],
        },
        payload: vec![1, 2, 3].into(),
        acked: true,
        parents: vec![[0x11; 32], [0x22; 32]].into(),
    };
    let expected_bytes = ssz::Encode::as_ssz_bytes(&value);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            let generic = generic.clone();
            let value = value.clone();
            thread::spawn(move || {
                // Odd threads go through the shared generic engine, so both
                // engines populate their caches concurrently.
                let (bytes, root) = if i % 2 == 0 {
                    (
                        engine.marshal(&value).unwrap(),
                        engine.hash_tree_root(&value).unwrap(),
                    )
                } else {
                    (
                        generic.marshal(&value).unwrap(),
                        generic.hash_tree_root(&value).unwrap(),
                    )
                };
                let desc = engine.type_descriptor::<Envelope>().unwrap();
                let generic_desc = generic.type_descriptor::<Envelope>().unwrap();
                (bytes, root, desc, generic_desc)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let (_, first_root, first_desc, first_generic_desc) = &results[0];
    for (bytes, root, desc, generic_desc) in &results {
        assert_eq!(bytes, &expected_bytes);
        assert_eq!(root, first_root);
        assert!(Arc::ptr_eq(desc, first_desc));
        assert!(Arc::ptr_eq(generic_desc, first_generic_desc));
    }
    assert!(!Arc::ptr_eq(first_desc, first_generic_desc));
}
