//! The trust and cryptographic substrate for Decentralized Identifier (DID)
//! and Verifiable Credential (VC) toolkits.
//!
//! Four tightly coupled subsystems make up the core:
//!
//! * [`sensitive`] — a pooled allocator and ownership discipline for
//!   cryptographic key material: move-only secret buffers, zeroization on
//!   every release path, and optional platform encryption at rest.
//! * [`crypto`] — uniform sign/verify/derive/generate dispatch across
//!   classical (ECDSA, Ed25519, X25519, RSA) and post-quantum (ML-DSA,
//!   ML-KEM) algorithms, with strict key-format discipline.
//! * [`dcql`] — the Digital Credentials Query Language engine: a bit-exact
//!   JSON codec, one-shot query preparation with coarse storage predicates,
//!   and fine-grained per-credential evaluation.
//! * [`tpm`] — a zero-copy TPM 2.0 command codec and executor with
//!   HMAC-session integrity.
//!
//! Layering is strict: [`core`] and [`sensitive`] sit at the bottom,
//! [`crypto`] and [`dcql`] build on them, [`tpm`] on all of the above.
//! Everything is synchronous; nothing here suspends.

pub mod core;
pub mod crypto;
pub mod dcql;
pub mod sensitive;
pub mod tpm;

pub use crate::sensitive::{KeyPair, SecretBuffer, SensitivePool, Tag};
