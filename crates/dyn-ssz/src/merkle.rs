//! SSZ merkleization primitives.

use std::sync::LazyLock;

use sha2::{Digest, Sha256};

pub(crate) const BYTES_PER_CHUNK: usize = 32;

pub(crate) type Chunk = [u8; BYTES_PER_CHUNK];

/// Depth of the deepest tree we pad to, enough for any `usize` limit.
const MAX_DEPTH: usize = 64;

/// `ZERO_HASHES[i]` is the root of a tree of depth `i` with all-zero leaves.
static ZERO_HASHES: LazyLock<[Chunk; MAX_DEPTH + 1]> = LazyLock::new(|| {
    let mut hashes = [[0u8; BYTES_PER_CHUNK]; MAX_DEPTH + 1];
    for i in 0..MAX_DEPTH {
        hashes[i + 1] = hash_pair(&hashes[i], &hashes[i]);
    }
    hashes
});

pub(crate) fn hash_pair(left: &Chunk, right: &Chunk) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

pub(crate) fn zero_hash(depth: usize) -> Chunk {
    ZERO_HASHES[depth]
}

/// Packs serialized basic values into chunks, zero-padding the last one.
pub(crate) fn pack(bytes: &[u8]) -> Vec<Chunk> {
    bytes
        .chunks(BYTES_PER_CHUNK)
        .map(|part| {
            let mut chunk = [0u8; BYTES_PER_CHUNK];
            chunk[..part.len()].copy_from_slice(part);
            chunk
        })
        .collect()
}

/// Number of chunks needed for `count` basic values of `size` bytes each.
pub(crate) fn chunk_count(count: usize, size: usize) -> usize {
    count.saturating_mul(size).div_ceil(BYTES_PER_CHUNK)
}

/// Merkleizes chunks, padding with zero chunks to the next power of two of
/// `limit` (or of the chunk count if there is no limit).
///
/// Returns `None` if there are more chunks than the limit allows.
pub(crate) fn merkleize(chunks: &[Chunk], limit: Option<usize>) -> Option<Chunk> {
    let limit = limit.unwrap_or(chunks.len());
    if chunks.len() > limit {
        return None;
    }

    let width = limit.max(1).checked_next_power_of_two()?;
    let depth = width.trailing_zeros() as usize;

    if chunks.is_empty() {
        return Some(zero_hash(depth));
    }

    let mut layer = chunks.to_vec();
    for level in 0..depth {
        if layer.len() % 2 == 1 {
            layer.push(zero_hash(level));
        }
        layer = layer
            .chunks_exact(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }

    layer.first().copied()
}

/// Mixes the element count of a list into its root.
pub(crate) fn mix_in_length(root: &Chunk, len: usize) -> Chunk {
    let mut len_chunk = [0u8; BYTES_PER_CHUNK];
    len_chunk[..8].copy_from_slice(&(len as u64).to_le_bytes());
    hash_pair(root, &len_chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_from_hex(s: &str) -> Chunk {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_zero_hashes() {
        assert_eq!(zero_hash(0), [0u8; 32]);
        assert_eq!(
            zero_hash(1),
            chunk_from_hex("f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a92759fb4b")
        );
        assert_eq!(
            zero_hash(2),
            chunk_from_hex("db56114e00fdd4c1f85c892bf35ac9a89289aaecb1ebd0a96cde606a748b5d71")
        );
    }

    #[test]
    fn test_pack() {
        let chunks = pack(&[1u8; 40]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], [1u8; 32]);
        assert_eq!(&chunks[1][..8], &[1u8; 8]);
        assert_eq!(&chunks[1][8..], &[0u8; 24]);

        assert!(pack(&[]).is_empty());
    }

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunk_count(0, 8), 0);
        assert_eq!(chunk_count(4, 8), 1);
        assert_eq!(chunk_count(5, 8), 2);
        assert_eq!(chunk_count(64, 1), 2);
    }

    #[test]
    fn test_merkleize_single_chunk_is_identity() {
        let chunk = [7u8; 32];
        assert_eq!(merkleize(&[chunk], None), Some(chunk));
        assert_eq!(merkleize(&[chunk], Some(1)), Some(chunk));
    }

    #[test]
    fn test_merkleize_pads_to_power_of_two() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let c = [3u8; 32];

        let expected = hash_pair(&hash_pair(&a, &b), &hash_pair(&c, &zero_hash(0)));
        assert_eq!(merkleize(&[a, b, c], None), Some(expected));

        // A larger limit keeps hashing against zero subtrees.
        let expected_8 = hash_pair(&expected, &zero_hash(2));
        assert_eq!(merkleize(&[a, b, c], Some(8)), Some(expected_8));
    }

    #[test]
    fn test_merkleize_empty_and_over_limit() {
        assert_eq!(merkleize(&[], None), Some(zero_hash(0)));
        assert_eq!(merkleize(&[], Some(4)), Some(zero_hash(2)));
        assert_eq!(merkleize(&[[0u8; 32]; 3], Some(2)), None);
    }

    #[test]
    fn test_mix_in_length() {
        let root = [9u8; 32];
        let mut len_chunk = [0u8; 32];
        len_chunk[0] = 3;
        assert_eq!(mix_in_length(&root, 3), hash_pair(&root, &len_chunk));
    }
}
