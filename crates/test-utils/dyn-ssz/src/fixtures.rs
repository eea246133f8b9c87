//! Types shared by the dynamic SSZ tests.
//!
//! The first group derives the `ssz`/`tree_hash` codecs and advertises them
//! as fast paths; the rest only have the generic path.

use ssz_derive::{Decode, Encode};
use ssz_types::VariableList;
use strata_dyn_ssz::impl_ssz_container;
use tree_hash_derive::TreeHash;

/// Maximum number of validator balances in [`BalanceRegistry`] by default.
pub const DEFAULT_VALIDATOR_LIMIT: usize = 1024;

/// Fixed-size checkpoint header.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TreeHash)]
pub struct CheckpointHeader {
    pub epoch: u32,
    pub l1_view_update_height: u32,
    pub terminal_slot: u64,
    pub terminal_blkid: [u8; 32],
    pub final_state_root: [u8; 32],
}

impl_ssz_container!(CheckpointHeader {
    epoch,
    l1_view_update_height,
    terminal_slot,
    terminal_blkid,
    final_state_root,
}, fast = [ssz_encode, ssz_decode, tree_hash]);

/// Variable-size envelope around a header.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TreeHash)]
pub struct Envelope {
    pub seq: u64,
    pub header: CheckpointHeader,
    pub payload: VariableList<u8, 1024>,
    pub acked: bool,
    pub parents: VariableList<[u8; 32], 8>,
}

impl_ssz_container!(Envelope {
    seq,
    header,
    payload,
    acked,
    parents,
}, fast = [ssz_encode, ssz_decode, tree_hash]);

/// A list bound that specification values may change.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TreeHash)]
pub struct BalanceRegistry {
    pub epoch: u64,
    pub balances: VariableList<u64, DEFAULT_VALIDATOR_LIMIT>,
}

impl_ssz_container!(BalanceRegistry {
    epoch,
    balances => { max: "1024", dyn_max: "VALIDATOR_REGISTRY_LIMIT" },
}, fast = [ssz_encode, ssz_decode, tree_hash]);

/// All unsigned widths plus a boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmallInts {
    pub flag: bool,
    pub a: u8,
    pub b: u16,
    pub c: u32,
    pub d: u64,
}

impl_ssz_container!(SmallInts { flag, a, b, c, d });

/// Dynamic bytes between fixed fields, with one fixed-length hinted list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedStruct {
    pub flag: bool,
    pub data: Vec<u8>,
    pub words: Vec<u16>,
    pub tail: u32,
}

impl_ssz_container!(MixedStruct {
    flag,
    data,
    words => { size: "5" },
    tail,
});

/// A list of fixed-length byte vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedLists {
    pub head: u8,
    pub pairs: Vec<Vec<u8>>,
    pub tail: u8,
}

impl_ssz_container!(NestedLists {
    head,
    pairs => { size: "?,2" },
    tail,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynStruct {
    pub flag: bool,
    pub data: Vec<u8>,
}

impl_ssz_container!(DynStruct { flag, data });

/// A vector of variable-size containers, encoded with two levels of offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynStructVector {
    pub head: u8,
    pub items: Vec<DynStruct>,
    pub tail: u8,
}

impl_ssz_container!(DynStructVector {
    head,
    items => { size: "3" },
    tail,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticStruct {
    pub flag: bool,
    pub data: Vec<u8>,
}

impl_ssz_container!(StaticStruct { flag, data => { size: "3" } });

/// A vector of boxed fixed-size containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticStructVector {
    pub head: u8,
    pub items: Vec<Box<StaticStruct>>,
    pub tail: u8,
}

impl_ssz_container!(StaticStructVector {
    head,
    items => { size: "3" },
    tail,
});

/// Historical roots whose count follows a specification value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalRoots {
    pub slot: u64,
    pub roots: Vec<[u8; 32]>,
    pub sync_bits: Vec<u8>,
}

impl_ssz_container!(HistoricalRoots {
    slot,
    roots => { size: "8", dyn_size: "SLOTS_PER_HISTORICAL_ROOT" },
    sync_bits => { size: "64", dyn_size: "SYNC_COMMITTEE_SIZE/8" },
});
