//! The client core (spec §4.8), grounded on `patch_subset_client.h`/`.cc`.

use crate::binary_diff::BinaryPatch;
use crate::codepoint_map::CodepointMap;
use crate::codepoint_set::CodepointSet;
use crate::compressed_set::CompressedSet;
use crate::error::{PatchSubsetError, Result};
use crate::hasher::Hasher;
use crate::request_logger::RequestLogger;
use crate::subsetter::Subsetter;
use crate::wire::{self, PatchFormat, ResponseType, ServerRequest, ServerResponse};

use log::{debug, warn};

/// Bounds how large a patched font a client will ever materialise, guarding against a
/// maliciously or accidentally huge decompressed stream (the same bound `BinaryPatch`'s
/// underlying shared-dictionary decoder requires explicitly).
const MAX_PATCHED_FONT_SIZE: usize = 100 * 1024 * 1024;

/// Everything a client remembers about one font between extend calls.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    pub font_id: String,
    pub font_data: Vec<u8>,
    pub original_fingerprint: u64,
    /// The active codepoint remapping, if the server has ever put one in place, alongside its
    /// fingerprint as last validated.
    pub remapping: Option<(CodepointMap, u64)>,
}

impl ClientState {
    pub fn new(font_id: impl Into<String>) -> Self {
        ClientState {
            font_id: font_id.into(),
            font_data: Vec::new(),
            original_fingerprint: 0,
            remapping: None,
        }
    }
}

/// Drives the client side of the protocol: building requests and validating/applying responses.
pub struct PatchSubsetClient {
    subsetter: Box<dyn Subsetter>,
    binary_patch: Box<dyn BinaryPatch>,
    hasher: Box<dyn Hasher>,
    request_logger: Box<dyn RequestLogger>,
}

impl PatchSubsetClient {
    pub fn new(
        subsetter: Box<dyn Subsetter>,
        binary_patch: Box<dyn BinaryPatch>,
        hasher: Box<dyn Hasher>,
        request_logger: Box<dyn RequestLogger>,
    ) -> Self {
        PatchSubsetClient {
            subsetter,
            binary_patch,
            hasher,
            request_logger,
        }
    }

    /// Builds a request for `additional_codepoints` given `state`. Returns `Ok(None)` when the
    /// font already covers everything asked for: no transport call is required.
    pub fn create_request(
        &self,
        additional_codepoints: &CodepointSet,
        state: &ClientState,
    ) -> Result<Option<ServerRequest>> {
        let mut existing = self.subsetter.codepoints_in_font(&state.font_data)?;
        let mut needed = additional_codepoints.difference(&existing);

        if let Some((map, _)) = &state.remapping {
            map.intersect_with_domain(&mut existing);
            map.intersect_with_domain(&mut needed);
            existing = map.encode(&existing)?;
            needed = map.encode(&needed)?;
        }

        if needed.is_empty() {
            return Ok(None);
        }

        let base_fingerprint = if existing.is_empty() {
            0
        } else {
            self.hasher.hash(&state.font_data)
        };
        let index_fingerprint = state.remapping.as_ref().map(|(_, fp)| *fp).unwrap_or(0);

        Ok(Some(ServerRequest {
            original_fingerprint: state.original_fingerprint,
            base_fingerprint,
            index_fingerprint,
            codepoints_have: CompressedSet::encode(&existing),
            codepoints_needed: CompressedSet::encode(&needed),
            accept_format: vec![PatchFormat::BrotliSharedDict],
        }))
    }

    /// Validates and applies `response` to `state`. `state` is left untouched unless every check
    /// passes.
    pub fn amend_state(&self, response: &ServerResponse, state: &mut ClientState) -> Result<()> {
        if response.response_type == ResponseType::Reindex {
            let remapping = response.codepoint_remapping.as_ref().ok_or_else(|| {
                PatchSubsetError::invalid_argument("REINDEX response is missing a remapping")
            })?;
            let map = remapping.to_map()?;
            state.remapping = Some((map, remapping.fingerprint));
            state.original_fingerprint = response.original_fingerprint;
            return Ok(());
        }

        let base: &[u8] = if response.response_type == ResponseType::Rebase {
            &[]
        } else {
            &state.font_data
        };

        let patch_record = response
            .patch
            .as_ref()
            .ok_or_else(|| PatchSubsetError::invalid_argument("response is missing a patch"))?;
        if patch_record.format != PatchFormat::BrotliSharedDict {
            warn!("server returned an unsupported patch format for {}", state.font_id);
            return Err(PatchSubsetError::failed_precondition(
                "server returned an unsupported patch format",
            ));
        }

        let patched =
            self.binary_patch
                .patch(base, &patch_record.patch, MAX_PATCHED_FONT_SIZE)?;
        if self.hasher.hash(&patched) != patch_record.patched_fingerprint {
            warn!("patched font fingerprint mismatch for {}", state.font_id);
            return Err(PatchSubsetError::failed_precondition(
                "patched font fingerprint does not match the server's claim",
            ));
        }

        let remapping = if matches!(
            response.response_type,
            ResponseType::Rebase | ResponseType::Reindex
        ) {
            match &response.codepoint_remapping {
                Some(remapping) => Some((remapping.to_map()?, remapping.fingerprint)),
                None => None,
            }
        } else {
            None
        };

        state.font_data = patched;
        state.original_fingerprint = response.original_fingerprint;
        if remapping.is_some() {
            state.remapping = remapping;
        }
        Ok(())
    }

    /// Runs a full extend cycle: build a request, hand its wire bytes to `transport`, and apply
    /// the response. Skips the transport call entirely when no new codepoints are needed.
    pub fn extend(
        &mut self,
        additional_codepoints: &CodepointSet,
        state: &mut ClientState,
        transport: impl FnOnce(&[u8]) -> Result<Vec<u8>>,
    ) -> Result<()> {
        let Some(request) = self.create_request(additional_codepoints, state)? else {
            return Ok(());
        };

        let request_bytes = wire::encode_request(&request);
        let response_bytes = transport(&request_bytes)?;
        debug!(
            "completed exchange for {}: {} request bytes, {} response bytes",
            state.font_id,
            request_bytes.len(),
            response_bytes.len()
        );
        self.request_logger.log_request(&request_bytes, &response_bytes);

        let response = wire::decode_response(&response_bytes)?;
        self.amend_state(&response, state)
    }
}
