//! Wire messages: a hand-rolled tag-length-value binary layout. The protocol does not mandate
//! any particular concrete encoding — only that field identity and optional/default fields are
//! preserved — so this mirrors `patch_subset.proto`'s record layout without pulling in a schema
//! compiler.

use crate::codepoint_map::CodepointMap;
use crate::compressed_set::CompressedSet;
use crate::error::{PatchSubsetError, Result};
use crate::hasher::Hasher;

/// Compression formats a client is willing to accept, or a patch is encoded with. The protocol
/// requires every implementation to support at least `BrotliSharedDict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchFormat {
    BrotliSharedDict,
}

impl PatchFormat {
    fn to_byte(self) -> u8 {
        match self {
            PatchFormat::BrotliSharedDict => 0,
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(PatchFormat::BrotliSharedDict),
            other => Err(PatchSubsetError::invalid_argument(format!(
                "unknown patch format tag {other}"
            ))),
        }
    }
}

/// The three possible response outcomes (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Patch,
    Rebase,
    Reindex,
}

impl ResponseType {
    fn to_byte(self) -> u8 {
        match self {
            ResponseType::Patch => 0,
            ResponseType::Rebase => 1,
            ResponseType::Reindex => 2,
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(ResponseType::Patch),
            1 => Ok(ResponseType::Rebase),
            2 => Ok(ResponseType::Reindex),
            other => Err(PatchSubsetError::invalid_argument(format!(
                "unknown response type tag {other}"
            ))),
        }
    }
}

/// A codepoint remapping as carried on the wire: the delta list plus its fingerprint, so a
/// receiver can validate it without recomputing a mapping from a font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodepointRemapping {
    pub codepoint_ordering: Vec<i64>,
    pub fingerprint: u64,
}

impl CodepointRemapping {
    pub fn from_map(map: &CodepointMap, hasher: &dyn Hasher) -> Self {
        CodepointRemapping {
            codepoint_ordering: map.to_delta_list().into_iter().map(i64::from).collect(),
            fingerprint: map.fingerprint(hasher),
        }
    }

    /// Rebuilds the map this remapping describes. The protocol trusts the wire bytes whenever
    /// the fingerprint matches, so this is the total (non-fallible on value range) form; callers
    /// that need to validate trust should compare `fingerprint` against an independently
    /// recomputed one themselves.
    pub fn to_map(&self) -> Result<CodepointMap> {
        let mut deltas = Vec::with_capacity(self.codepoint_ordering.len());
        for &delta in &self.codepoint_ordering {
            let delta = u32::try_from(delta).map_err(|_| {
                PatchSubsetError::invalid_argument("negative codepoint delta on the wire")
            })?;
            deltas.push(delta);
        }
        Ok(CodepointMap::from_delta_list(&deltas))
    }
}

/// A patch as carried on the wire (spec §6.1, `patch` field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRecord {
    pub format: PatchFormat,
    pub patch: Vec<u8>,
    pub patched_fingerprint: u64,
}

/// A client's extend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRequest {
    pub original_fingerprint: u64,
    pub base_fingerprint: u64,
    pub index_fingerprint: u64,
    pub codepoints_have: CompressedSet,
    pub codepoints_needed: CompressedSet,
    pub accept_format: Vec<PatchFormat>,
}

/// The server's response to a [`ServerRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerResponse {
    pub response_type: ResponseType,
    pub original_fingerprint: u64,
    pub codepoint_remapping: Option<CodepointRemapping>,
    pub patch: Option<PatchRecord>,
}

struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    fn new() -> Self {
        ByteWriter { bytes: Vec::new() }
    }

    fn u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    fn u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn i64(&mut self, value: i64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn bytes_field(&mut self, value: &[u8]) {
        self.u32(value.len() as u32);
        self.bytes.extend_from_slice(value);
    }

    fn compressed_set(&mut self, value: &CompressedSet) {
        self.bytes_field(&value.sparse_bit_set);
        self.u32(value.range_deltas.len() as u32);
        for &delta in &value.range_deltas {
            self.u32(delta);
        }
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| PatchSubsetError::invalid_argument("wire message truncated"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn bytes_field(&mut self) -> Result<Vec<u8>> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    fn compressed_set(&mut self) -> Result<CompressedSet> {
        let sparse_bit_set = self.bytes_field()?;
        let delta_count = self.u32()? as usize;
        let mut range_deltas = Vec::with_capacity(delta_count);
        for _ in 0..delta_count {
            range_deltas.push(self.u32()?);
        }
        Ok(CompressedSet {
            sparse_bit_set,
            range_deltas,
        })
    }

    fn finish(self) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(PatchSubsetError::invalid_argument(
                "wire message has trailing bytes",
            ));
        }
        Ok(())
    }
}

pub fn encode_request(request: &ServerRequest) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.u64(request.original_fingerprint);
    w.u64(request.base_fingerprint);
    w.u64(request.index_fingerprint);
    w.compressed_set(&request.codepoints_have);
    w.compressed_set(&request.codepoints_needed);
    w.u32(request.accept_format.len() as u32);
    for format in &request.accept_format {
        w.u8(format.to_byte());
    }
    w.bytes
}

pub fn decode_request(bytes: &[u8]) -> Result<ServerRequest> {
    let mut r = ByteReader::new(bytes);
    let original_fingerprint = r.u64()?;
    let base_fingerprint = r.u64()?;
    let index_fingerprint = r.u64()?;
    let codepoints_have = r.compressed_set()?;
    let codepoints_needed = r.compressed_set()?;
    let format_count = r.u32()? as usize;
    let mut accept_format = Vec::with_capacity(format_count);
    for _ in 0..format_count {
        accept_format.push(PatchFormat::from_byte(r.u8()?)?);
    }
    r.finish()?;
    Ok(ServerRequest {
        original_fingerprint,
        base_fingerprint,
        index_fingerprint,
        codepoints_have,
        codepoints_needed,
        accept_format,
    })
}

pub fn encode_response(response: &ServerResponse) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.u8(response.response_type.to_byte());
    w.u64(response.original_fingerprint);

    match &response.codepoint_remapping {
        Some(remapping) => {
            w.u8(1);
            w.u32(remapping.codepoint_ordering.len() as u32);
            for &delta in &remapping.codepoint_ordering {
                w.i64(delta);
            }
            w.u64(remapping.fingerprint);
        }
        None => w.u8(0),
    }

    match &response.patch {
        Some(patch) => {
            w.u8(1);
            w.u8(patch.format.to_byte());
            w.bytes_field(&patch.patch);
            w.u64(patch.patched_fingerprint);
        }
        None => w.u8(0),
    }

    w.bytes
}

pub fn decode_response(bytes: &[u8]) -> Result<ServerResponse> {
    let mut r = ByteReader::new(bytes);
    let response_type = ResponseType::from_byte(r.u8()?)?;
    let original_fingerprint = r.u64()?;

    let codepoint_remapping = if r.u8()? == 1 {
        let delta_count = r.u32()? as usize;
        let mut codepoint_ordering = Vec::with_capacity(delta_count);
        for _ in 0..delta_count {
            codepoint_ordering.push(r.i64()?);
        }
        let fingerprint = r.u64()?;
        Some(CodepointRemapping {
            codepoint_ordering,
            fingerprint,
        })
    } else {
        None
    };

    let patch = if r.u8()? == 1 {
        let format = PatchFormat::from_byte(r.u8()?)?;
        let patch = r.bytes_field()?;
        let patched_fingerprint = r.u64()?;
        Some(PatchRecord {
            format,
            patch,
            patched_fingerprint,
        })
    } else {
        None
    };

    r.finish()?;
    Ok(ServerResponse {
        response_type,
        original_fingerprint,
        codepoint_remapping,
        patch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips() {
        let request = ServerRequest {
            original_fingerprint: 1,
            base_fingerprint: 2,
            index_fingerprint: 0,
            codepoints_have: CompressedSet {
                sparse_bit_set: vec![1, 2, 3],
                range_deltas: vec![10, 20],
            },
            codepoints_needed: CompressedSet::default(),
            accept_format: vec![PatchFormat::BrotliSharedDict],
        };

        let bytes = encode_request(&request);
        assert_eq!(decode_request(&bytes).unwrap(), request);
    }

    #[test]
    fn response_round_trips_with_remapping_and_patch() {
        let response = ServerResponse {
            response_type: ResponseType::Rebase,
            original_fingerprint: 42,
            codepoint_remapping: Some(CodepointRemapping {
                codepoint_ordering: vec![97, 1, 1, 1, 1, 1],
                fingerprint: 7,
            }),
            patch: Some(PatchRecord {
                format: PatchFormat::BrotliSharedDict,
                patch: vec![9, 9, 9],
                patched_fingerprint: 123,
            }),
        };

        let bytes = encode_response(&response);
        assert_eq!(decode_response(&bytes).unwrap(), response);
    }

    #[test]
    fn response_round_trips_reindex_without_patch() {
        let response = ServerResponse {
            response_type: ResponseType::Reindex,
            original_fingerprint: 1,
            codepoint_remapping: Some(CodepointRemapping {
                codepoint_ordering: vec![1],
                fingerprint: 2,
            }),
            patch: None,
        };

        let bytes = encode_response(&response);
        assert_eq!(decode_response(&bytes).unwrap(), response);
    }

    #[test]
    fn truncated_message_is_invalid() {
        let request = ServerRequest {
            original_fingerprint: 1,
            base_fingerprint: 0,
            index_fingerprint: 0,
            codepoints_have: CompressedSet::default(),
            codepoints_needed: CompressedSet::default(),
            accept_format: vec![PatchFormat::BrotliSharedDict],
        };
        let bytes = encode_request(&request);
        assert!(decode_request(&bytes[..bytes.len() - 1]).is_err());
    }
}
