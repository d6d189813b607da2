//! Error taxonomy for the patch-subset protocol core.
//!
//! Mirrors the `StatusCode` kinds of `common/status.h`: every failure reported by this crate
//! falls into one of these categories. `StatusCode::kOk` has no variant here — a successful call
//! simply returns `Ok(_)`.

use brotli_shared_dict::{DecodeError, EncodeError};

/// A failure produced by some part of the patch-subset core.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchSubsetError {
    /// Malformed wire bytes, a codepoint-set value outside a map's domain, or an unrecognised
    /// enum value read off the wire.
    InvalidArgument(String),
    /// The requested font id is not known to the font provider.
    NotFound(String),
    /// An unsupported patch format, or a patched-blob fingerprint that does not match the
    /// server's claim.
    FailedPrecondition(String),
    /// A response type this implementation does not yet handle.
    Unimplemented(String),
    /// A compressor/decompressor/subsetter failure that is not expected to be recoverable.
    Internal(String),
}

impl PatchSubsetError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        PatchSubsetError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        PatchSubsetError::NotFound(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        PatchSubsetError::FailedPrecondition(msg.into())
    }

    pub fn unimplemented(msg: impl Into<String>) -> Self {
        PatchSubsetError::Unimplemented(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        PatchSubsetError::Internal(msg.into())
    }
}

impl std::fmt::Display for PatchSubsetError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PatchSubsetError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            PatchSubsetError::NotFound(msg) => write!(f, "not found: {msg}"),
            PatchSubsetError::FailedPrecondition(msg) => write!(f, "failed precondition: {msg}"),
            PatchSubsetError::Unimplemented(msg) => write!(f, "unimplemented: {msg}"),
            PatchSubsetError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for PatchSubsetError {}

impl From<DecodeError> for PatchSubsetError {
    fn from(err: DecodeError) -> Self {
        PatchSubsetError::Internal(format!("brotli decode failed: {err}"))
    }
}

impl From<EncodeError> for PatchSubsetError {
    fn from(err: EncodeError) -> Self {
        PatchSubsetError::Internal(format!("brotli encode failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PatchSubsetError>;
