//! # Cryptographic Dispatch
//!
//! A single entry point per operation — [`verify`], [`sign`], [`derive`],
//! [`generate`], [`encapsulate`], [`decapsulate`] — keyed by [`Algorithm`].
//! Inputs and outputs carry [`Tag`]s which the dispatch layer checks before
//! any key byte reaches an underlying primitive.
//!
//! Key-format discipline is strict. ECDSA verification keys arrive as
//! `SubjectPublicKeyInfo` DER and are decoded by resolving the named-curve
//! OID explicitly — never by an auto-detecting key factory. ECDSA signatures
//! are accepted in raw `r‖s` form (fixed width per curve) or as ASN.1 DER;
//! raw signatures are normalized before reaching the primitive. Generated
//! keys are emitted in the canonical encoding for their algorithm: fixed
//! width big-endian scalars and compressed points for ECDSA, PKCS#1 DER for
//! RSA private keys, raw FIPS 203/204 encodings for ML-KEM and ML-DSA.

mod agree;
pub mod encoding;
mod keygen;
mod kem;
mod signing;
mod spki;
mod verifying;

use thiserror::Error as ThisError;

use crate::sensitive::Tag;

pub use agree::derive;
pub use kem::{decapsulate, encapsulate};
pub use keygen::generate;
pub use self::spki::ec_subject_public_key_info;
pub use signing::sign;
pub use verifying::verify;

/// The algorithms the dispatch layer understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Algorithm {
    /// ECDSA over NIST P-256 with SHA-256.
    P256,
    /// ECDSA over NIST P-384 with SHA-384.
    P384,
    /// ECDSA over NIST P-521 with SHA-512.
    P521,
    /// ECDSA over secp256k1 with SHA-256.
    Secp256k1,
    /// Ed25519 (EdDSA over Curve25519).
    Ed25519,
    /// X25519 key agreement.
    X25519,
    /// RSA with a 2048-bit modulus.
    Rsa2048,
    /// RSA with a 4096-bit modulus.
    Rsa4096,
    /// ML-DSA-44 (FIPS 204).
    MlDsa44,
    /// ML-DSA-65 (FIPS 204).
    MlDsa65,
    /// ML-DSA-87 (FIPS 204).
    MlDsa87,
    /// ML-KEM-512 (FIPS 203).
    MlKem512,
    /// ML-KEM-768 (FIPS 203).
    MlKem768,
    /// ML-KEM-1024 (FIPS 203).
    MlKem1024,
}

impl Algorithm {
    /// Field element width in bytes for ECDSA curves (`ceil(field_bits/8)`).
    ///
    /// P-521 rounds 521 bits up to 66 bytes.
    #[must_use]
    pub const fn field_len(self) -> Option<usize> {
        match self {
            Self::P256 | Self::Secp256k1 => Some(32),
            Self::P384 => Some(48),
            Self::P521 => Some(66),
            _ => None,
        }
    }

    /// The tag carried by public keys generated for this algorithm.
    #[must_use]
    pub const fn public_key_tag(self) -> Tag {
        match self {
            Self::P256 => Tag::P256PublicKey,
            Self::P384 => Tag::P384PublicKey,
            Self::P521 => Tag::P521PublicKey,
            Self::Secp256k1 => Tag::Secp256k1PublicKey,
            Self::Ed25519 => Tag::Ed25519PublicKey,
            Self::X25519 => Tag::X25519PublicKey,
            Self::Rsa2048 => Tag::Rsa2048PublicKey,
            Self::Rsa4096 => Tag::Rsa4096PublicKey,
            Self::MlDsa44 => Tag::MlDsa44PublicKey,
            Self::MlDsa65 => Tag::MlDsa65PublicKey,
            Self::MlDsa87 => Tag::MlDsa87PublicKey,
            Self::MlKem512 => Tag::MlKem512PublicKey,
            Self::MlKem768 => Tag::MlKem768PublicKey,
            Self::MlKem1024 => Tag::MlKem1024PublicKey,
        }
    }

    /// The tag carried by private keys generated for this algorithm.
    #[must_use]
    pub const fn private_key_tag(self) -> Tag {
        match self {
            Self::P256 => Tag::P256PrivateKey,
            Self::P384 => Tag::P384PrivateKey,
            Self::P521 => Tag::P521PrivateKey,
            Self::Secp256k1 => Tag::Secp256k1PrivateKey,
            Self::Ed25519 => Tag::Ed25519PrivateKey,
            Self::X25519 => Tag::X25519PrivateKey,
            Self::Rsa2048 => Tag::Rsa2048PrivateKey,
            Self::Rsa4096 => Tag::Rsa4096PrivateKey,
            Self::MlDsa44 => Tag::MlDsa44PrivateKey,
            Self::MlDsa65 => Tag::MlDsa65PrivateKey,
            Self::MlDsa87 => Tag::MlDsa87PrivateKey,
            Self::MlKem512 => Tag::MlKem512PrivateKey,
            Self::MlKem768 => Tag::MlKem768PrivateKey,
            Self::MlKem1024 => Tag::MlKem1024PrivateKey,
        }
    }

    /// The tag carried by signatures produced with this algorithm, where the
    /// algorithm signs at all.
    #[must_use]
    pub const fn signature_tag(self) -> Option<Tag> {
        match self {
            Self::P256 => Some(Tag::P256Signature),
            Self::P384 => Some(Tag::P384Signature),
            Self::P521 => Some(Tag::P521Signature),
            Self::Secp256k1 => Some(Tag::Secp256k1Signature),
            Self::Ed25519 => Some(Tag::Ed25519Signature),
            Self::MlDsa44 => Some(Tag::MlDsa44Signature),
            Self::MlDsa65 => Some(Tag::MlDsa65Signature),
            Self::MlDsa87 => Some(Tag::MlDsa87Signature),
            _ => None,
        }
    }
}

/// Errors arising from the dispatch layer.
#[derive(ThisError, Debug)]
pub enum Error {
    /// The algorithm does not support the requested operation.
    #[error("{operation} is not supported for {algorithm:?}")]
    UnsupportedAlgorithm {
        /// The algorithm that was requested.
        algorithm: Algorithm,
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// A key's role does not match the requested operation.
    #[error("key tagged {actual:?} cannot be used where {expected:?} is required")]
    TagMismatch {
        /// The tag the operation requires.
        expected: Tag,
        /// The tag the supplied buffer carries.
        actual: Tag,
    },

    /// A key failed to parse in its declared encoding.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// A signature failed to parse in raw or DER form.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// Key agreement produced a non-contributory (all-zero) result.
    #[error("key agreement produced a non-contributory result")]
    InvalidPoint,

    /// The underlying primitive failed to produce a key pair.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// A sensitive-memory invariant failed while producing an output buffer.
    #[error(transparent)]
    Sensitive(#[from] crate::sensitive::Error),
}
