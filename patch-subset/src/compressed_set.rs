//! CompressedSet codec (spec §4.2): a hybrid of [`sparse_bit_set`] and a delta-encoded range
//! list, chosen per-range by a size heuristic that estimates the variable-length-integer cost of
//! a range against the bit-set cost of the same span.

use crate::codepoint_set::CodepointSet;
use crate::error::{PatchSubsetError, Result};
use crate::sparse_bit_set;

const BITS_PER_BYTE: u32 = 8;

/// On-wire payload: a sparse bit set plus an ordered, delta-encoded range list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressedSet {
    pub sparse_bit_set: Vec<u8>,
    /// Flattened `(gap_to_start, length)` pairs; always even length.
    pub range_deltas: Vec<u32>,
}

#[derive(Debug, Clone, Copy)]
struct Range {
    start: u32,
    end: u32,
}

impl CompressedSet {
    pub fn is_empty(&self) -> bool {
        self.sparse_bit_set.is_empty() && self.range_deltas.is_empty()
    }

    pub fn encode(set: &CodepointSet) -> CompressedSet {
        let (sparse_set, ranges) = encoding_strategy(set);
        let sparse_bit_set = sparse_bit_set::encode(&sparse_set);

        let mut range_deltas = Vec::with_capacity(ranges.len() * 2);
        let mut last_end = 0u32;
        for range in ranges {
            range_deltas.push(range.start - last_end);
            range_deltas.push(range.end - range.start);
            last_end = range.end;
        }

        CompressedSet {
            sparse_bit_set,
            range_deltas,
        }
    }

    /// Decodes this set, appending members to `out`.
    pub fn decode(&self, out: &mut CodepointSet) -> Result<()> {
        if self.range_deltas.len() % 2 != 0 {
            return Err(PatchSubsetError::invalid_argument(
                "compressed set has an odd number of range deltas",
            ));
        }

        sparse_bit_set::decode(&self.sparse_bit_set, out)?;

        let mut last_end = 0u32;
        for pair in self.range_deltas.chunks_exact(2) {
            let range_start = last_end + pair[0];
            let range_end = range_start + pair[1];
            out.insert_range(range_start..=range_end);
            last_end = range_end;
        }
        Ok(())
    }
}

fn to_ranges(set: &CodepointSet) -> Vec<Range> {
    let mut out = Vec::new();
    let mut current: Option<Range> = None;

    for cp in set.iter() {
        current = Some(match current {
            None => Range { start: cp, end: cp },
            Some(r) if cp == r.end + 1 => Range {
                start: r.start,
                end: cp,
            },
            Some(r) => {
                out.push(r);
                Range { start: cp, end: cp }
            }
        });
    }
    if let Some(r) = current {
        out.push(r);
    }
    out
}

fn variable_integer_encoded_size(value: u32) -> u32 {
    let mut value = value;
    let mut size = 0u32;
    loop {
        value /= 128;
        size += 1;
        if value == 0 {
            break;
        }
    }
    size
}

fn range_encoded_size(last_output_end: u32, range: &Range) -> u32 {
    variable_integer_encoded_size(range.start - last_output_end)
        + variable_integer_encoded_size(range.end - range.start)
}

fn bit_set_encoded_size(range: &Range, previous: Option<&Range>, next: Option<&Range>) -> i64 {
    let mut byte_count = ((range.end - range.start + 1 + BITS_PER_BYTE - 1) / BITS_PER_BYTE) as i64;

    if let Some(p) = previous {
        if p.end / BITS_PER_BYTE == range.start / BITS_PER_BYTE {
            byte_count -= 1;
        }
    }
    if let Some(n) = next {
        if n.start / BITS_PER_BYTE == range.end / BITS_PER_BYTE {
            byte_count -= 1;
        }
    }
    byte_count
}

fn strategy_for(
    range: Range,
    previous: Option<&Range>,
    next: Option<&Range>,
    sparse_set: &mut CodepointSet,
    output_ranges: &mut Vec<Range>,
) {
    let last_output_end = output_ranges.last().map(|r| r.end).unwrap_or(0);

    let is_multi_value = range.start != range.end;
    let chooses_range = is_multi_value
        && range_encoded_size(last_output_end, &range) as i64
            <= bit_set_encoded_size(&range, previous, next);

    if chooses_range {
        output_ranges.push(range);
    } else {
        sparse_set.insert_range(range.start..=range.end);
    }
}

fn encoding_strategy(set: &CodepointSet) -> (CodepointSet, Vec<Range>) {
    let input_ranges = to_ranges(set);
    let mut sparse_set = CodepointSet::empty();
    let mut output_ranges = Vec::new();

    for (i, range) in input_ranges.iter().enumerate() {
        let previous = if i > 0 { input_ranges.get(i - 1) } else { None };
        let next = input_ranges.get(i + 1);
        strategy_for(*range, previous, next, &mut sparse_set, &mut output_ranges);
    }

    (sparse_set, output_ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: impl IntoIterator<Item = u32>) -> CodepointSet {
        values.into_iter().collect()
    }

    #[test]
    fn empty_set_is_empty() {
        let cs = CompressedSet::encode(&CodepointSet::empty());
        assert!(cs.is_empty());
    }

    #[test]
    fn single_values_never_use_range_encoding() {
        let cs = CompressedSet::encode(&set([1, 50, 1000]));
        assert!(cs.range_deltas.is_empty());
        assert!(!cs.sparse_bit_set.is_empty());
    }

    #[test]
    fn long_contiguous_range_uses_range_encoding() {
        let cs = CompressedSet::encode(&set(100..=500));
        assert!(!cs.range_deltas.is_empty());
        assert_eq!(cs.range_deltas, vec![100, 400]);
    }

    #[test]
    fn round_trip_mixed() {
        let mut values: Vec<u32> = (100..=500).collect();
        values.extend([1, 50, 1000, 1001, 1002]);
        let s = set(values);

        let cs = CompressedSet::encode(&s);
        let mut out = CodepointSet::empty();
        cs.decode(&mut out).unwrap();
        assert_eq!(out, s);
    }

    #[test]
    fn odd_delta_list_is_invalid() {
        let cs = CompressedSet {
            sparse_bit_set: Vec::new(),
            range_deltas: vec![1, 2, 3],
        };
        let mut out = CodepointSet::empty();
        assert!(cs.decode(&mut out).is_err());
    }

    #[test]
    fn decode_appends() {
        let cs = CompressedSet::encode(&set(10..=20));
        let mut out = set([1, 2]);
        cs.decode(&mut out).unwrap();
        assert_eq!(out, set([1, 2].into_iter().chain(10..=20)));
    }
}
