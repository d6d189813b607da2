//! An implementation of the Patch-Subset protocol: incremental font delivery via progressively
//! extended subsets, with a request/response state machine that negotiates patch, rebase, and
//! reindex outcomes between a client holding a partial font and a server holding the canonical
//! original.
//!
//! The core types are organised around the protocol's own vocabulary (see each module's
//! docs for the relevant protocol section):
//!
//! - [`codepoint_set`] — the in-memory codepoint set type every codec and map builds on.
//! - [`sparse_bit_set`] / [`compressed_set`] — the wire codecs for codepoint sets.
//! - [`hasher`] — the fingerprint function used throughout the protocol.
//! - [`codepoint_map`] — the bijection that shrinks codepoint sets sent on the wire.
//! - [`codepoint_predictor`] — optional bundling of likely-next-needed codepoints.
//! - [`binary_diff`] — the shared-dictionary diff/patch codec.
//! - [`font_provider`] / [`subsetter`] — external capabilities injected by the caller.
//! - [`wire`] — request/response record types and their binary encoding.
//! - [`client`] / [`server`] — the two halves of the protocol's state machine.
//! - [`request_logger`] — an observability hook for the client's exchanges.

pub mod binary_diff;
pub mod client;
pub mod codepoint_map;
pub mod codepoint_predictor;
pub mod codepoint_set;
pub mod compressed_set;
pub mod error;
pub mod font_provider;
pub mod hasher;
pub mod request_logger;
pub mod server;
pub mod sparse_bit_set;
pub mod subsetter;
pub mod wire;

pub use client::{ClientState, PatchSubsetClient};
pub use codepoint_set::CodepointSet;
pub use error::{PatchSubsetError, Result};
pub use server::PatchSubsetServer;
