//! `CodepointMap` and `CodepointMapper` (spec §4.5): a bijection between a subset of codepoints
//! and the contiguous index range `0..N-1`, used to shrink the numeric space of codepoint sets
//! carried on the wire.
//!
//! Grounded on `codepoint_map.h`/`codepoint_mapper.h`/`simple_codepoint_mapper.cc`, extended to
//! carry the delta-list serialisation and fingerprint those headers lack.

use crate::codepoint_set::CodepointSet;
use crate::error::{PatchSubsetError, Result};
use crate::hasher::{little_endian_u32_input, Hasher};

/// A deterministic bijection between a set of codepoints and `0..N-1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodepointMap {
    /// `decode(k) = codepoints[k]`, ascending.
    codepoints: Vec<u32>,
}

impl CodepointMap {
    pub fn empty() -> Self {
        CodepointMap {
            codepoints: Vec::new(),
        }
    }

    /// Builds a map by assigning ascending indices to `codepoints`.
    pub fn from_domain(codepoints: &CodepointSet) -> Self {
        CodepointMap {
            codepoints: codepoints.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.codepoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codepoints.is_empty()
    }

    pub fn domain(&self) -> CodepointSet {
        self.codepoints.iter().copied().collect()
    }

    /// `decode(index)`: the codepoint assigned to `index`.
    pub fn decode_one(&self, index: u32) -> Result<u32> {
        self.codepoints
            .get(index as usize)
            .copied()
            .ok_or_else(|| PatchSubsetError::invalid_argument(format!("index {index} not in map")))
    }

    /// `encode(cp)`: the index assigned to codepoint `cp`.
    pub fn encode_one(&self, codepoint: u32) -> Result<u32> {
        self.codepoints
            .binary_search(&codepoint)
            .map(|i| i as u32)
            .map_err(|_| {
                PatchSubsetError::invalid_argument(format!("codepoint {codepoint} not in map"))
            })
    }

    pub fn encode(&self, set: &CodepointSet) -> Result<CodepointSet> {
        let mut out = CodepointSet::empty();
        for cp in set.iter() {
            out.insert(self.encode_one(cp)?);
        }
        Ok(out)
    }

    pub fn decode(&self, set: &CodepointSet) -> Result<CodepointSet> {
        let mut out = CodepointSet::empty();
        for index in set.iter() {
            out.insert(self.decode_one(index)?);
        }
        Ok(out)
    }

    /// Restricts `set` to this map's domain, dropping any values the map does not cover.
    pub fn intersect_with_domain(&self, set: &mut CodepointSet) {
        let domain = self.domain();
        *set = set.intersection(&domain);
    }

    /// `[decode(0), decode(1) - decode(0), …]`.
    pub fn to_delta_list(&self) -> Vec<u32> {
        let mut deltas = Vec::with_capacity(self.codepoints.len());
        let mut previous = 0u32;
        for &cp in &self.codepoints {
            deltas.push(cp - previous);
            previous = cp;
        }
        deltas
    }

    /// Rebuilds a map from a delta list produced by [`Self::to_delta_list`].
    pub fn from_delta_list(deltas: &[u32]) -> Self {
        let mut codepoints = Vec::with_capacity(deltas.len());
        let mut running = 0u32;
        for &delta in deltas {
            running += delta;
            codepoints.push(running);
        }
        CodepointMap { codepoints }
    }

    /// Hasher applied to the canonical little-endian `[N, delta_0, …]` encoding (spec §6.3).
    pub fn fingerprint(&self, hasher: &dyn Hasher) -> u64 {
        let deltas = self.to_delta_list();
        let mut values = Vec::with_capacity(deltas.len() + 1);
        values.push(deltas.len() as u32);
        values.extend(deltas);
        hasher.hash(&little_endian_u32_input(values))
    }
}

/// Computes a `CodepointMap` for a font's codepoint set.
pub trait CodepointMapper {
    fn compute_mapping(&self, font_codepoints: &CodepointSet) -> CodepointMap;
}

/// Assigns indices in plain ascending codepoint order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleCodepointMapper;

impl CodepointMapper for SimpleCodepointMapper {
    fn compute_mapping(&self, font_codepoints: &CodepointSet) -> CodepointMap {
        CodepointMap::from_domain(font_codepoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Xxh3Hasher;

    fn domain() -> CodepointSet {
        [b'a', b'b', b'c', b'd', b'e', b'f']
            .into_iter()
            .map(u32::from)
            .collect()
    }

    #[test]
    fn involution() {
        let map = SimpleCodepointMapper.compute_mapping(&domain());
        for (index, &cp) in map.codepoints.iter().enumerate() {
            assert_eq!(map.decode_one(index as u32).unwrap(), cp);
            assert_eq!(map.encode_one(cp).unwrap(), index as u32);
        }
    }

    #[test]
    fn out_of_domain_is_invalid_argument() {
        let map = SimpleCodepointMapper.compute_mapping(&domain());
        assert!(map.encode_one(u32::from(b'z')).is_err());
        assert!(map.decode_one(map.len() as u32).is_err());
    }

    #[test]
    fn delta_list_round_trips() {
        let map = SimpleCodepointMapper.compute_mapping(&domain());
        let deltas = map.to_delta_list();
        assert_eq!(deltas, vec![97, 1, 1, 1, 1, 1]);

        let rebuilt = CodepointMap::from_delta_list(&deltas);
        assert_eq!(rebuilt, map);
    }

    #[test]
    fn fingerprint_matches_literal() {
        let map = SimpleCodepointMapper.compute_mapping(&domain());
        // Only checks that the fingerprint is a pure, deterministic function of the delta list;
        // the exact hash value is an XXH3 implementation choice (spec §4.3).
        let hasher = Xxh3Hasher;
        assert_eq!(map.fingerprint(&hasher), map.fingerprint(&hasher));

        let other = CodepointMap::from_delta_list(&[97, 1, 1, 1, 1, 1]);
        assert_eq!(map.fingerprint(&hasher), other.fingerprint(&hasher));
    }

    #[test]
    fn intersect_with_domain_drops_values_outside_map() {
        let map = SimpleCodepointMapper.compute_mapping(&domain());
        let mut set: CodepointSet = [u32::from(b'a'), u32::from(b'z')].into_iter().collect();
        map.intersect_with_domain(&mut set);
        assert_eq!(set, [u32::from(b'a')].into_iter().collect());
    }
}
