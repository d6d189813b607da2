//! SparseBitSet codec (spec §4.1).
//!
//! Represents a set of non-negative integers as a byte-packed complete 8-ary tree, laid out
//! breadth-first, layer by layer. Each byte is one node: a bit set in an internal node marks a
//! child with at least one member beneath it, a bit set in a leaf node marks membership of the
//! corresponding value directly.
//!
//! This is a direct, fixed-branch-factor-8 port of the original `patch_subset::SparseBitSet`
//! (`sparse_bit_set.cc`) — not the newer variable-branch-factor IFT `sparse-bit-set-decoding`
//! format (see `int-set`'s `sparse_bit_set.rs` for that variant), which adds a header byte and
//! branch factors of 2/4/32 that this protocol does not use.

use crate::codepoint_set::CodepointSet;
use crate::error::{PatchSubsetError, Result};

const BITS_PER_BYTE: u32 = 8;

/// Encodes `set` as a sparse bit set. Returns an empty byte vector for the empty set.
pub fn encode(set: &CodepointSet) -> Vec<u8> {
    let Some(max_value) = set.last() else {
        return Vec::new();
    };

    let depth = tree_depth_for(max_value);
    let mut bytes: Vec<u8> = Vec::new();
    let mut byte_bases: Vec<u64> = vec![0];
    let mut byte_index = 0usize;
    for layer in 0..depth {
        byte_index = encode_layer(set, layer, depth, byte_index, &mut byte_bases, &mut bytes);
    }
    bytes
}

/// Decodes a sparse bit set, appending decoded members to `out` (existing members are kept).
pub fn decode(bytes: &[u8], out: &mut CodepointSet) -> Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }

    let mut layer_indices: Vec<u64> = vec![0];
    let mut byte_index = 0usize;
    while byte_index < bytes.len() {
        let end_index = layer_indices.len() - 1;
        if end_index >= bytes.len() {
            return Err(PatchSubsetError::invalid_argument(
                "sparse bit set stream ended mid-layer",
            ));
        }
        byte_index = decode_layer(bytes, byte_index, end_index, &mut layer_indices, out)?;
    }
    Ok(())
}

fn decode_layer(
    bytes: &[u8],
    start_index: usize,
    end_index: usize,
    layer_indices: &mut Vec<u64>,
    out: &mut CodepointSet,
) -> Result<usize> {
    let has_more_layers = layer_indices.len() < bytes.len();
    let mut i = start_index;
    while i <= end_index && i < bytes.len() {
        let byte = bytes[i];
        for bit_index in 0..BITS_PER_BYTE {
            if byte & (1 << bit_index) == 0 {
                continue;
            }

            let index = layer_indices[i] * BITS_PER_BYTE as u64 + bit_index as u64;
            if has_more_layers {
                layer_indices.push(index);
                continue;
            }

            let index = u32::try_from(index).map_err(|_| {
                PatchSubsetError::invalid_argument("sparse bit set value exceeds u32 range")
            })?;
            out.insert(index);
        }
        i += 1;
    }
    Ok(i)
}

fn tree_depth_for(max_value: u32) -> u32 {
    let mut depth = 1u32;
    let mut value: u64 = BITS_PER_BYTE as u64;
    while value - 1 < max_value as u64 {
        depth += 1;
        value *= BITS_PER_BYTE as u64;
    }
    depth
}

fn max_value_for_tree_of_depth(depth: u32) -> u64 {
    let mut value: u64 = 1;
    for _ in 0..depth {
        value *= BITS_PER_BYTE as u64;
    }
    value
}

fn values_per_bit_for_layer(layer: u32, depth: u32) -> u64 {
    let mut tree_size = max_value_for_tree_of_depth(depth);
    for _ in 0..layer {
        tree_size /= BITS_PER_BYTE as u64;
    }
    tree_size / BITS_PER_BYTE as u64
}

fn next_index(cp: u64, byte_index: usize, byte_bases: &[u64], values_per_byte: u64) -> usize {
    if cp >= byte_bases[byte_index] + values_per_byte {
        byte_index + 1
    } else {
        byte_index
    }
}

fn expand_if_needed(byte_index: usize, bytes: &mut Vec<u8>) {
    if byte_index >= bytes.len() {
        bytes.push(0);
    }
}

fn encode_layer(
    set: &CodepointSet,
    layer: u32,
    depth: u32,
    mut byte_index: usize,
    byte_bases: &mut Vec<u64>,
    bytes: &mut Vec<u8>,
) -> usize {
    let values_per_bit = values_per_bit_for_layer(layer, depth);
    let values_per_byte = values_per_bit * BITS_PER_BYTE as u64;

    for cp in set.iter() {
        let cp = cp as u64;
        byte_index = next_index(cp, byte_index, byte_bases, values_per_byte);
        expand_if_needed(byte_index, bytes);

        let bit_index = ((cp - byte_bases[byte_index]) / values_per_bit) as u32;
        let mask = 1u8 << bit_index;
        if bytes[byte_index] & mask != 0 {
            continue;
        }
        bytes[byte_index] |= mask;
        if values_per_bit > 1 {
            byte_bases.push((cp / values_per_bit) * values_per_bit);
        }
    }

    byte_index + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[u32]) -> CodepointSet {
        values.iter().copied().collect()
    }

    #[test]
    fn empty_set_round_trips() {
        assert_eq!(encode(&CodepointSet::empty()), Vec::<u8>::new());

        let mut out = CodepointSet::empty();
        decode(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn doc_example_two_and_sixty_three() {
        // From the docstring of the original SparseBitSet: encoding {2, 63} needs a depth-2
        // tree of 3 bytes.
        let bytes = encode(&set(&[2, 63]));
        assert_eq!(bytes, vec![0b10000001, 0b00000100, 0b10000000]);

        let mut out = CodepointSet::empty();
        decode(&bytes, &mut out).unwrap();
        assert_eq!(out, set(&[2, 63]));
    }

    #[test]
    fn single_byte_set() {
        let bytes = encode(&set(&[0, 7]));
        assert_eq!(bytes, vec![0b10000001]);
    }

    #[test]
    fn round_trip_arbitrary() {
        for values in [
            vec![],
            vec![0u32],
            vec![7],
            vec![8],
            vec![0, 7, 8, 63, 64, 511],
            vec![11, 74, 9358],
            vec![1, u32::MAX],
        ] {
            let s = set(&values);
            let bytes = encode(&s);
            let mut out = CodepointSet::empty();
            decode(&bytes, &mut out).unwrap();
            assert_eq!(out, s, "round trip failed for {values:?}");
        }
    }

    #[test]
    fn decode_appends_to_existing_set() {
        let mut out = set(&[1, 2]);
        let bytes = encode(&set(&[9]));
        decode(&bytes, &mut out).unwrap();
        assert_eq!(out, set(&[1, 2, 9]));
    }

    #[test]
    fn power_of_eight_boundary() {
        // max value exactly 7 needs depth 1 (one byte); 8 needs depth 2.
        assert_eq!(tree_depth_for(7), 1);
        assert_eq!(tree_depth_for(8), 2);
        assert_eq!(encode(&set(&[7])).len(), 1);
        assert!(encode(&set(&[8])).len() > 1);
    }

    #[test]
    fn invalid_truncated_stream() {
        let bytes = encode(&set(&[2, 63]));
        let truncated = &bytes[..bytes.len() - 1];
        let mut out = CodepointSet::empty();
        assert!(decode(truncated, &mut out).is_err());
    }
}
