//! Proptest strategies for the fixture types.

use proptest::{collection::vec, prelude::*};
use ssz_types::VariableList;

use crate::fixtures::*;

pub fn arb_checkpoint_header() -> impl Strategy<Value = CheckpointHeader> {
    (
        any::<u32>(),
        any::<u32>(),
        any::<u64>(),
        any::<[u8; 32]>(),
        any::<[u8; 32]>(),
    )
        .prop_map(
            |(epoch, l1_view_update_height, terminal_slot, terminal_blkid, final_state_root)| {
                CheckpointHeader {
                    epoch,
                    l1_view_update_height,
                    terminal_slot,
                    terminal_blkid,
                    final_state_root,
                }
            },
        )
}

pub fn arb_envelope() -> impl Strategy<Value = Envelope> {
    (
        any::<u64>(),
        arb_checkpoint_header(),
        vec(any::<u8>(), 0..256),
        any::<bool>(),
        vec(any::<[u8; 32]>(), 0..=8),
    )
        .prop_map(|(seq, header, payload, acked, parents)| Envelope {
            seq,
            header,
            payload: VariableList::from(payload),
            acked,
            parents: VariableList::from(parents),
        })
}

pub fn arb_balance_registry() -> impl Strategy<Value = BalanceRegistry> {
    (any::<u64>(), vec(any::<u64>(), 0..64)).prop_map(|(epoch, balances)| BalanceRegistry {
        epoch,
        balances: VariableList::from(balances),
    })
}

pub fn arb_mixed_struct() -> impl Strategy<Value = MixedStruct> {
    (
        any::<bool>(),
        vec(any::<u8>(), 0..64),
        vec(any::<u16>(), 5),
        any::<u32>(),
    )
        .prop_map(|(flag, data, words, tail)| MixedStruct {
            flag,
            data,
            words,
            tail,
        })
}

pub fn arb_dyn_struct() -> impl Strategy<Value = DynStruct> {
    (any::<bool>(), vec(any::<u8>(), 0..16)).prop_map(|(flag, data)| DynStruct { flag, data })
}

pub fn arb_dyn_struct_vector() -> impl Strategy<Value = DynStructVector> {
    (any::<u8>(), vec(arb_dyn_struct(), 3), any::<u8>()).prop_map(|(head, items, tail)| {
        DynStructVector { head, items, tail }
    })
}

pub fn arb_nested_lists() -> impl Strategy<Value = NestedLists> {
    (any::<u8>(), vec(vec(any::<u8>(), 2), 0..8), any::<u8>())
        .prop_map(|(head, pairs, tail)| NestedLists { head, pairs, tail })
}

/// Historical roots sized for `roots_len` roots and `sync_bytes` sync bytes.
pub fn arb_historical_roots(
    roots_len: usize,
    sync_bytes: usize,
) -> impl Strategy<Value = HistoricalRoots> {
    (
        any::<u64>(),
        vec(any::<[u8; 32]>(), roots_len),
        vec(any::<u8>(), sync_bytes),
    )
        .prop_map(|(slot, roots, sync_bits)| HistoricalRoots {
            slot,
            roots,
            sync_bits,
        })
}
