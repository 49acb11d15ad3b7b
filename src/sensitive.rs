//! # Sensitive Memory
//!
//! A pooled allocator and ownership discipline for cryptographic key
//! material. Key bytes live in [`SecretBuffer`]s rented from a
//! [`SensitivePool`]; a buffer is the sole owner of its region, reads happen
//! only through a scoped accessor, and the region is zeroized before it is
//! returned to the pool — on every exit path.
//!
//! Long-lived secrets can additionally be wrapped in a
//! [`PlatformEncryptedSecret`], which keeps the bytes encrypted at rest via a
//! platform keystore cipher (DPAPI and equivalents) and decrypts only for the
//! duration of a closure.

mod buffer;
mod platform;
mod pool;

use thiserror::Error;

pub use buffer::{KeyPair, SecretBuffer};
pub use platform::{PlatformCipher, PlatformEncryptedSecret};
pub use pool::SensitivePool;

/// Errors arising from sensitive-memory operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested buffer length does not match the canonical encoding
    /// length for the tag.
    #[error("length {actual} does not match canonical length {expected} for {tag:?}")]
    LengthInvariant {
        /// The tag the buffer was requested for.
        tag: Tag,
        /// The canonical encoding length for the tag.
        expected: usize,
        /// The length that was requested or supplied.
        actual: usize,
    },

    /// The platform cipher failed to seal or open a secret.
    #[error("platform cipher failure: {0}")]
    Platform(#[source] anyhow::Error),
}

/// Identifies the algorithm and role of the bytes held in a [`SecretBuffer`].
///
/// Tags are a closed enumeration: the dispatch layer uses them to check that
/// sign, verify and derive operations receive keys of the correct kind, and
/// the pool uses them to enforce canonical encoding lengths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Tag {
    /// NIST P-256 public key, compressed SEC1 point.
    P256PublicKey,
    /// NIST P-256 private scalar, fixed-width big-endian.
    P256PrivateKey,
    /// NIST P-384 public key, compressed SEC1 point.
    P384PublicKey,
    /// NIST P-384 private scalar, fixed-width big-endian.
    P384PrivateKey,
    /// NIST P-521 public key, compressed SEC1 point.
    P521PublicKey,
    /// NIST P-521 private scalar, fixed-width big-endian.
    P521PrivateKey,
    /// secp256k1 public key, compressed SEC1 point.
    Secp256k1PublicKey,
    /// secp256k1 private scalar, fixed-width big-endian.
    Secp256k1PrivateKey,
    /// Ed25519 public key, raw.
    Ed25519PublicKey,
    /// Ed25519 private seed, raw.
    Ed25519PrivateKey,
    /// X25519 public key, raw.
    X25519PublicKey,
    /// X25519 private key, raw (clamped scalar).
    X25519PrivateKey,
    /// RSA-2048 public key, DID-compatible DER of the modulus.
    Rsa2048PublicKey,
    /// RSA-2048 private key, PKCS#1 `RSAPrivateKey` DER.
    Rsa2048PrivateKey,
    /// RSA-4096 public key, DID-compatible DER of the modulus.
    Rsa4096PublicKey,
    /// RSA-4096 private key, PKCS#1 `RSAPrivateKey` DER.
    Rsa4096PrivateKey,
    /// ML-DSA-44 public key, FIPS 204 encoding.
    MlDsa44PublicKey,
    /// ML-DSA-44 private key, FIPS 204 encoding.
    MlDsa44PrivateKey,
    /// ML-DSA-65 public key, FIPS 204 encoding.
    MlDsa65PublicKey,
    /// ML-DSA-65 private key, FIPS 204 encoding.
    MlDsa65PrivateKey,
    /// ML-DSA-87 public key, FIPS 204 encoding.
    MlDsa87PublicKey,
    /// ML-DSA-87 private key, FIPS 204 encoding.
    MlDsa87PrivateKey,
    /// ML-KEM-512 encapsulation key, FIPS 203 encoding.
    MlKem512PublicKey,
    /// ML-KEM-512 decapsulation key, FIPS 203 encoding.
    MlKem512PrivateKey,
    /// ML-KEM-768 encapsulation key, FIPS 203 encoding.
    MlKem768PublicKey,
    /// ML-KEM-768 decapsulation key, FIPS 203 encoding.
    MlKem768PrivateKey,
    /// ML-KEM-1024 encapsulation key, FIPS 203 encoding.
    MlKem1024PublicKey,
    /// ML-KEM-1024 decapsulation key, FIPS 203 encoding.
    MlKem1024PrivateKey,
    /// ECDSA P-256 signature, raw `r‖s`.
    P256Signature,
    /// ECDSA P-384 signature, raw `r‖s`.
    P384Signature,
    /// ECDSA P-521 signature, raw `r‖s`.
    P521Signature,
    /// ECDSA secp256k1 signature, raw `r‖s`.
    Secp256k1Signature,
    /// Ed25519 signature, raw 64 bytes.
    Ed25519Signature,
    /// ML-DSA-44 detached signature.
    MlDsa44Signature,
    /// ML-DSA-65 detached signature.
    MlDsa65Signature,
    /// ML-DSA-87 detached signature.
    MlDsa87Signature,
    /// X25519 key-agreement output.
    X25519SharedSecret,
    /// ML-KEM-512 ciphertext.
    MlKem512Ciphertext,
    /// ML-KEM-768 ciphertext.
    MlKem768Ciphertext,
    /// ML-KEM-1024 ciphertext.
    MlKem1024Ciphertext,
    /// ML-KEM shared secret (32 bytes for every parameter set).
    MlKemSharedSecret,
    /// A TPM authorization-session key (length follows the session hash).
    TpmSessionKey,
    /// A secret sealed by the Windows platform keystore (DPAPI).
    WindowsPlatformEncrypted,
}

impl Tag {
    /// The natural encoding length for this tag, where one exists.
    ///
    /// DER encodings (RSA keys) and platform-sealed blobs are variable-length
    /// and return `None`.
    #[must_use]
    pub const fn canonical_len(self) -> Option<usize> {
        match self {
            Self::P256PublicKey | Self::Secp256k1PublicKey => Some(33),
            Self::P256PrivateKey
            | Self::Secp256k1PrivateKey
            | Self::Ed25519PublicKey
            | Self::Ed25519PrivateKey
            | Self::X25519PublicKey
            | Self::X25519PrivateKey
            | Self::X25519SharedSecret
            | Self::MlKemSharedSecret => Some(32),
            Self::P384PublicKey => Some(49),
            Self::P384PrivateKey => Some(48),
            Self::P521PublicKey => Some(67),
            Self::P521PrivateKey => Some(66),
            Self::MlDsa44PublicKey => Some(1312),
            Self::MlDsa44PrivateKey => Some(2560),
            Self::MlDsa65PublicKey => Some(1952),
            Self::MlDsa65PrivateKey => Some(4032),
            Self::MlDsa87PublicKey => Some(2592),
            Self::MlDsa87PrivateKey => Some(4896),
            Self::MlKem512PublicKey => Some(800),
            Self::MlKem512PrivateKey => Some(1632),
            Self::MlKem768PublicKey => Some(1184),
            Self::MlKem768PrivateKey => Some(2400),
            Self::MlKem1024PublicKey => Some(1568),
            Self::MlKem1024PrivateKey => Some(3168),
            Self::P256Signature | Self::Secp256k1Signature | Self::Ed25519Signature => Some(64),
            Self::P384Signature => Some(96),
            Self::P521Signature => Some(132),
            Self::MlDsa44Signature => Some(2420),
            Self::MlDsa65Signature => Some(3309),
            Self::MlDsa87Signature => Some(4627),
            Self::MlKem512Ciphertext => Some(768),
            Self::MlKem768Ciphertext => Some(1088),
            Self::MlKem1024Ciphertext => Some(1568),
            Self::Rsa2048PublicKey
            | Self::Rsa2048PrivateKey
            | Self::Rsa4096PublicKey
            | Self::Rsa4096PrivateKey
            | Self::TpmSessionKey
            | Self::WindowsPlatformEncrypted => None,
        }
    }

    /// Whether this tag names private key material.
    #[must_use]
    pub const fn is_private(self) -> bool {
        matches!(
            self,
            Self::P256PrivateKey
                | Self::P384PrivateKey
                | Self::P521PrivateKey
                | Self::Secp256k1PrivateKey
                | Self::Ed25519PrivateKey
                | Self::X25519PrivateKey
                | Self::Rsa2048PrivateKey
                | Self::Rsa4096PrivateKey
                | Self::MlDsa44PrivateKey
                | Self::MlDsa65PrivateKey
                | Self::MlDsa87PrivateKey
                | Self::MlKem512PrivateKey
                | Self::MlKem768PrivateKey
                | Self::MlKem1024PrivateKey
        )
    }
}
