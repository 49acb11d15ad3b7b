//! # TPM 2.0 Command Codec
//!
//! A zero-copy, big-endian codec for TPM 2.0 command envelopes and a
//! response registry keyed by command code, per the TPM 2.0 Library
//! Specification Part 1 §16.9/§16.10 and Part 3 for each command.
//!
//! Commands are described by [`CommandInput`] implementations which write
//! their handle and parameter areas through the crate's wire cursor; the
//! [`TpmExecutor`] assembles `Header | Handles | AuthArea? | Parameters`,
//! patches sizes, computes `cpHash`/`rpHash` for HMAC-bound sessions, and
//! splits the response envelope by the per-command handle-count metadata in
//! the [`attrs`] table. The transport is a narrow byte channel; device I/O
//! lives outside this crate.

pub mod attrs;
pub mod command;
pub mod response;
pub mod types;

mod executor;

use thiserror::Error as ThisError;

use crate::core::wire::WireError;

pub use attrs::{CommandAttributes, CommandCode};
pub use command::{
    CommandInput, CreatePrimaryInput, FlushContextInput, GetCapabilityInput, GetRandomInput,
    PcrReadInput, ReadPublicInput, StartAuthSessionInput, StartupInput,
};
pub use executor::{HmacSession, TpmExecutor, TpmTransport};
pub use response::{
    CapabilityData, CreatePrimaryResponse, GetCapabilityResponse, GetRandomResponse,
    PcrReadResponse, ReadPublicResponse, ResponseBody, StartAuthSessionResponse, TpmResponse,
    response_spec,
};
pub use types::{SymDef, TpmBlob, TpmHeader, TpmlPcrSelection, TpmsPcrSelection};

/// Errors arising from TPM command execution and response parsing.
#[derive(ThisError, Debug)]
pub enum Error {
    /// The TPM answered with a non-zero response code.
    #[error("TPM returned response code {0:#010x}")]
    Response(u32),

    /// The command or response envelope is internally inconsistent.
    #[error("envelope inconsistency: {0}")]
    Envelope(String),

    /// The byte channel to the TPM failed.
    #[error("transport failure: {0}")]
    Transport(#[source] anyhow::Error),

    /// The response buffer ended before the envelope said it would.
    #[error(transparent)]
    Wire(#[from] WireError),
}
