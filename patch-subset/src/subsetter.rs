//! The `Subsetter` capability (spec §9 "Dynamic dispatch of strategies"): produces a font subset
//! covering a given codepoint set, and inspects the codepoints already covered by a font blob.
//!
//! Subsetting itself — laying out tables, remapping glyph ids, trimming unreferenced data — is
//! explicitly out of scope for this crate (see the protocol's Non-goals): callers inject a real
//! implementation (e.g. a `skrifa`/HarfBuzz-backed subsetter) at construction. `FakeSubsetter`
//! below exists only to exercise the rest of the protocol in tests and the demo binary.

use crate::codepoint_set::CodepointSet;
use crate::error::Result;

/// Produces font subsets and reports which codepoints a font blob already covers.
pub trait Subsetter {
    /// The bytes of `font`, restricted to `codepoints`. An empty `codepoints` set yields an
    /// empty subset.
    fn subset(&self, font: &[u8], codepoints: &CodepointSet) -> Result<Vec<u8>>;

    /// The codepoints actually renderable by `font_data` (empty if `font_data` is empty).
    fn codepoints_in_font(&self, font_data: &[u8]) -> Result<CodepointSet>;
}

/// A deterministic, non-semantic `Subsetter` for tests and demos: "subsetting" a font to a
/// codepoint set just means recording which codepoints were requested, and "the codepoints in a
/// subset" is the inverse of that recording. No real font tables are touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeSubsetter;

impl FakeSubsetter {
    /// Serialises a codepoint set as a subset blob: a `FAKE` magic tag followed by each
    /// codepoint's 4-byte little-endian form, ascending.
    fn encode(codepoints: &CodepointSet) -> Vec<u8> {
        let mut bytes = b"FAKE".to_vec();
        for cp in codepoints.iter() {
            bytes.extend_from_slice(&cp.to_le_bytes());
        }
        bytes
    }
}

impl Subsetter for FakeSubsetter {
    fn subset(&self, _font: &[u8], codepoints: &CodepointSet) -> Result<Vec<u8>> {
        if codepoints.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Self::encode(codepoints))
    }

    fn codepoints_in_font(&self, font_data: &[u8]) -> Result<CodepointSet> {
        if font_data.is_empty() {
            return Ok(CodepointSet::empty());
        }
        let mut out = CodepointSet::empty();
        for chunk in font_data[4..].chunks_exact(4) {
            out.insert(u32::from_le_bytes(chunk.try_into().unwrap()));
        }
        Ok(out)
    }
}
