//! The server core state machine (spec §4.7), grounded on `patch_subset_server_impl.h`/`.cc`.

use crate::binary_diff::BinaryDiff;
use crate::codepoint_map::{CodepointMap, CodepointMapper};
use crate::codepoint_predictor::CodepointPredictor;
use crate::codepoint_set::CodepointSet;
use crate::compressed_set::CompressedSet;
use crate::error::Result;
use crate::font_provider::FontProvider;
use crate::hasher::Hasher;
use crate::subsetter::Subsetter;
use crate::wire::{CodepointRemapping, PatchFormat, PatchRecord, ResponseType, ServerRequest, ServerResponse};

use log::warn;

/// Handles patch/rebase/reindex requests for a single collection of fonts.
///
/// Collaborators are all stateless capability objects supplied at construction (spec §9): the
/// server itself holds no mutable state beyond them.
pub struct PatchSubsetServer {
    font_provider: Box<dyn FontProvider>,
    subsetter: Box<dyn Subsetter>,
    binary_diff: Box<dyn BinaryDiff>,
    hasher: Box<dyn Hasher>,
    mapper: Option<Box<dyn CodepointMapper>>,
    predictor: Box<dyn CodepointPredictor>,
    predictor_max: usize,
}

impl PatchSubsetServer {
    pub fn new(
        font_provider: Box<dyn FontProvider>,
        subsetter: Box<dyn Subsetter>,
        binary_diff: Box<dyn BinaryDiff>,
        hasher: Box<dyn Hasher>,
        mapper: Option<Box<dyn CodepointMapper>>,
        predictor: Box<dyn CodepointPredictor>,
        predictor_max: usize,
    ) -> Self {
        PatchSubsetServer {
            font_provider,
            subsetter,
            binary_diff,
            hasher,
            mapper,
            predictor,
            predictor_max,
        }
    }

    pub fn handle(&self, font_id: &str, request: &ServerRequest) -> Result<ServerResponse> {
        let mut have = CodepointSet::empty();
        request.codepoints_have.decode(&mut have)?;
        let mut needed = CodepointSet::empty();
        request.codepoints_needed.decode(&mut needed)?;
        needed.union_with(&have);

        let font = self.font_provider.get_font(font_id)?;
        let original_fingerprint = self.hasher.hash(&font);

        let mut rebase_forced = false;
        if !have.is_empty() && original_fingerprint != request.original_fingerprint {
            warn!(
                "original fingerprint mismatch for font {font_id} ({} != {}); downgrading to rebase",
                request.original_fingerprint, original_fingerprint
            );
            have.clear();
            rebase_forced = true;
        }

        let mut map: Option<CodepointMap> = None;
        if let Some(mapper) = &self.mapper {
            let font_codepoints = self.subsetter.codepoints_in_font(&font)?;
            let computed_map = mapper.compute_mapping(&font_codepoints);

            if !have.is_empty() {
                let index_fingerprint = computed_map.fingerprint(self.hasher.as_ref());
                if index_fingerprint != request.index_fingerprint {
                    return Ok(ServerResponse {
                        response_type: ResponseType::Reindex,
                        original_fingerprint,
                        codepoint_remapping: Some(CodepointRemapping::from_map(
                            &computed_map,
                            self.hasher.as_ref(),
                        )),
                        patch: None,
                    });
                }
                have = computed_map.decode(&have)?;
                needed = computed_map.decode(&needed)?;
            }
            map = Some(computed_map);
        }

        let requested_not_had = needed.difference(&have);
        let font_codepoints = self.subsetter.codepoints_in_font(&font)?;
        let predicted = self.predictor.predict(
            &font_codepoints,
            &have,
            &requested_not_had,
            self.predictor_max,
        );
        needed.union_with(&predicted);

        let mut client_subset = self.subsetter.subset(&font, &have)?;
        let target_subset = self.subsetter.subset(&font, &needed)?;

        if !have.is_empty() && self.hasher.hash(&client_subset) != request.base_fingerprint {
            warn!("base fingerprint mismatch for font {font_id}; downgrading to rebase");
            client_subset.clear();
            have.clear();
            rebase_forced = true;
        }

        let patch_bytes = self.binary_diff.diff(&client_subset, &target_subset)?;
        let response_type = if rebase_forced || have.is_empty() {
            ResponseType::Rebase
        } else {
            ResponseType::Patch
        };

        let codepoint_remapping = if response_type == ResponseType::Rebase {
            map.as_ref()
                .map(|m| CodepointRemapping::from_map(m, self.hasher.as_ref()))
        } else {
            None
        };

        Ok(ServerResponse {
            response_type,
            original_fingerprint,
            codepoint_remapping,
            patch: Some(PatchRecord {
                format: PatchFormat::BrotliSharedDict,
                patch: patch_bytes,
                patched_fingerprint: self.hasher.hash(&target_subset),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary_diff::{BinaryPatch, SharedBrotliDiff};
    use crate::codepoint_predictor::NoopCodepointPredictor;
    use crate::font_provider::MemoryFontProvider;
    use crate::hasher::Xxh3Hasher;
    use crate::subsetter::FakeSubsetter;

    fn codepoints(values: impl IntoIterator<Item = u32>) -> CodepointSet {
        values.into_iter().collect()
    }

    fn server_with_font(id: &str, font: Vec<u8>) -> PatchSubsetServer {
        PatchSubsetServer::new(
            Box::new(MemoryFontProvider::new().with_font(id, font)),
            Box::new(FakeSubsetter),
            Box::new(SharedBrotliDiff),
            Box::new(Xxh3Hasher),
            None,
            Box::new(NoopCodepointPredictor),
            0,
        )
    }

    #[test]
    fn fresh_request_returns_rebase() {
        let font = b"full font bytes".to_vec();
        let server = server_with_font("Roboto-Regular.ttf", font.clone());
        let hasher = Xxh3Hasher;

        let request = ServerRequest {
            original_fingerprint: 0,
            base_fingerprint: 0,
            index_fingerprint: 0,
            codepoints_have: CompressedSet::default(),
            codepoints_needed: CompressedSet::encode(&codepoints([b'a', b'b'].map(u32::from))),
            accept_format: vec![PatchFormat::BrotliSharedDict],
        };

        let response = server.handle("Roboto-Regular.ttf", &request).unwrap();
        assert_eq!(response.response_type, ResponseType::Rebase);
        assert_eq!(response.original_fingerprint, hasher.hash(&font));
        assert!(response.patch.is_some());
    }

    #[test]
    fn unknown_font_is_not_found() {
        let server = server_with_font("Roboto-Regular.ttf", b"font".to_vec());
        let request = ServerRequest {
            original_fingerprint: 0,
            base_fingerprint: 0,
            index_fingerprint: 0,
            codepoints_have: CompressedSet::default(),
            codepoints_needed: CompressedSet::encode(&codepoints([b'a' as u32])),
            accept_format: vec![PatchFormat::BrotliSharedDict],
        };

        assert!(server.handle("Missing.ttf", &request).is_err());
    }

    #[test]
    fn wrong_original_fingerprint_downgrades_to_rebase_not_error() {
        let font = b"full font bytes".to_vec();
        let server = server_with_font("Roboto-Regular.ttf", font.clone());

        // Client claims to already have codepoints under a bogus original fingerprint.
        let request = ServerRequest {
            original_fingerprint: 0xDEADBEEF,
            base_fingerprint: 0,
            index_fingerprint: 0,
            codepoints_have: CompressedSet::encode(&codepoints([b'a' as u32])),
            codepoints_needed: CompressedSet::encode(&codepoints([b'b' as u32])),
            accept_format: vec![PatchFormat::BrotliSharedDict],
        };

        let response = server.handle("Roboto-Regular.ttf", &request).unwrap();
        assert_eq!(response.response_type, ResponseType::Rebase);
    }

    #[test]
    fn wrong_base_fingerprint_downgrades_to_rebase_and_matches_fresh_request() {
        let font = b"full font bytes".to_vec();
        let server = server_with_font("Roboto-Regular.ttf", font.clone());
        let hasher = Xxh3Hasher;

        // Client claims to already have {a} under a bogus base_fingerprint, but its
        // original_fingerprint is correct.
        let request = ServerRequest {
            original_fingerprint: hasher.hash(&font),
            base_fingerprint: 0xBAD_F00D,
            index_fingerprint: 0,
            codepoints_have: CompressedSet::encode(&codepoints([b'a' as u32])),
            codepoints_needed: CompressedSet::encode(&codepoints([b'b' as u32])),
            accept_format: vec![PatchFormat::BrotliSharedDict],
        };

        let response = server.handle("Roboto-Regular.ttf", &request).unwrap();
        assert_eq!(response.response_type, ResponseType::Rebase);

        let patch_record = response.patch.unwrap();
        let patched = SharedBrotliDiff
            .patch(&[], &patch_record.patch, usize::MAX)
            .unwrap();

        let fresh_request = ServerRequest {
            original_fingerprint: 0,
            base_fingerprint: 0,
            index_fingerprint: 0,
            codepoints_have: CompressedSet::default(),
            codepoints_needed: CompressedSet::encode(&codepoints([b'a' as u32, b'b' as u32])),
            accept_format: vec![PatchFormat::BrotliSharedDict],
        };
        let fresh_response = server.handle("Roboto-Regular.ttf", &fresh_request).unwrap();
        let fresh_patch_record = fresh_response.patch.unwrap();
        let fresh_patched = SharedBrotliDiff
            .patch(&[], &fresh_patch_record.patch, usize::MAX)
            .unwrap();

        assert_eq!(patched, fresh_patched);
    }
}
