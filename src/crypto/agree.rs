//! # Key Agreement
//!
//! X25519 Diffie-Hellman over tagged buffers. Both keys are raw 32-byte
//! encodings; the shared secret comes back as a pooled buffer tagged
//! [`Tag::X25519SharedSecret`]. A non-contributory (all-zero) result is
//! rejected rather than returned.

use zeroize::Zeroize as _;

use crate::sensitive::{SecretBuffer, SensitivePool, Tag};

use super::{Algorithm, Error};

/// Derive a shared secret from `private_key` and `public_key`.
///
/// Only [`Algorithm::X25519`] performs key agreement.
///
/// # Errors
///
/// Returns [`Error::UnsupportedAlgorithm`] for any other algorithm,
/// [`Error::TagMismatch`] when either buffer carries the wrong tag, and
/// [`Error::InvalidPoint`] when the agreement lands on a low-order point.
pub fn derive(
    pool: &SensitivePool, algorithm: Algorithm, private_key: &SecretBuffer,
    public_key: &SecretBuffer,
) -> Result<SecretBuffer, Error> {
    if algorithm != Algorithm::X25519 {
        return Err(Error::UnsupportedAlgorithm { algorithm, operation: "derive" });
    }
    if private_key.tag() != Tag::X25519PrivateKey {
        return Err(Error::TagMismatch {
            expected: Tag::X25519PrivateKey,
            actual: private_key.tag(),
        });
    }
    if public_key.tag() != Tag::X25519PublicKey {
        return Err(Error::TagMismatch {
            expected: Tag::X25519PublicKey,
            actual: public_key.tag(),
        });
    }

    let secret = private_key.expose(|bytes| {
        let mut raw: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::MalformedKey("X25519 private key must be 32 bytes".to_string()))?;
        let secret = x25519_dalek::StaticSecret::from(raw);
        raw.zeroize();
        Ok::<_, Error>(secret)
    })?;
    let peer = public_key.expose(|bytes| {
        let raw: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::MalformedKey("X25519 public key must be 32 bytes".to_string()))?;
        Ok::<_, Error>(x25519_dalek::PublicKey::from(raw))
    })?;

    let shared = secret.diffie_hellman(&peer);
    if !shared.was_contributory() {
        return Err(Error::InvalidPoint);
    }
    Ok(pool.from_slice(Tag::X25519SharedSecret, shared.as_bytes())?)
}
