//! # Core Utilities
//!
//! Shared plumbing used by the library's subsystems. The only resident today
//! is the big-endian wire cursor used by the TPM codec and the DER assembly
//! helpers.

pub mod wire;

pub use wire::{WireError, WireReader, WireWriter};
