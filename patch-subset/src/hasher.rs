//! Stable 64-bit fingerprinting (spec §4.3), used for the original/base/index fingerprints
//! carried on the wire and for the `CodepointMap` fingerprint of §4.5/§6.3.
//!
//! FarmHash (`farm_hasher.h`) is one valid choice here; no exact function is mandated by the
//! protocol, only determinism across a wire-compatible deployment. This crate uses XXH3, a fast,
//! well-tested, non-cryptographic 64-bit hash with the same stability guarantee.

use twox_hash::xxh3;

/// A stable fingerprint function over byte sequences.
///
/// Implementations must be deterministic: the same bytes must always produce the same value,
/// including across process restarts and target architectures.
pub trait Hasher {
    fn hash(&self, data: &[u8]) -> u64;
}

/// The default `Hasher`, backed by XXH3-64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3Hasher;

impl Hasher for Xxh3Hasher {
    fn hash(&self, data: &[u8]) -> u64 {
        xxh3::hash64(data)
    }
}

/// Encodes `values` as the concatenation of their 32-bit little-endian representations, the
/// canonical hash input format used by `CodepointMap::fingerprint` (spec §6.3).
pub fn little_endian_u32_input<I: IntoIterator<Item = u32>>(values: I) -> Vec<u8> {
    let mut bytes = Vec::new();
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}
