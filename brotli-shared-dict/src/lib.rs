//! Shared brotli (<https://datatracker.ietf.org/doc/draft-vandevenne-shared-brotli-format/>) is an
//! extension of brotli to allow compression/decompression to use a raw shared dictionary.
//!
//! This is the codec underlying the patch-subset protocol's `BinaryDiff`/`BinaryPatch`
//! capabilities: the previous subset a client holds acts as the dictionary used to compress
//! (and later decompress) the next subset.

#[cfg(feature = "c-brotli")]
mod c_brotli;
#[cfg(feature = "c-brotli")]
mod c_brotli_encode;

pub mod error;

pub use error::{DecodeError, EncodeError};

/// Decodes a shared-dictionary encoded brotli stream.
///
/// `shared_dictionary` is the raw LZ77-style dictionary; pass `None` (or an empty slice) when
/// the derived data was encoded without one. Fails if the decoded size would exceed
/// `max_uncompressed_length`, or if `encoded` has trailing bytes beyond the end of the stream.
pub fn shared_brotli_decode(
    encoded: &[u8],
    shared_dictionary: Option<&[u8]>,
    max_uncompressed_length: usize,
) -> Result<Vec<u8>, DecodeError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "c-brotli")] {
            c_brotli::shared_brotli_decode_c(encoded, shared_dictionary, max_uncompressed_length)
        } else {
            compile_error!("At least one brotli backend feature ('c-brotli') must be enabled.");
        }
    }
}

/// Encodes `derived` as a shared-dictionary brotli stream, using `shared_dictionary` as the raw
/// dictionary if one is supplied. With no dictionary this degenerates to ordinary brotli
/// self-compression.
pub fn shared_brotli_encode(
    derived: &[u8],
    shared_dictionary: Option<&[u8]>,
) -> Result<Vec<u8>, EncodeError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "c-brotli")] {
            c_brotli_encode::shared_brotli_encode_c(derived, shared_dictionary)
        } else {
            compile_error!("At least one brotli backend feature ('c-brotli') must be enabled.");
        }
    }
}
