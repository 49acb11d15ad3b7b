//! # Signing
//!
//! Signing keyed by [`Algorithm`]. The private key arrives as a tagged
//! [`SecretBuffer`] and the tag must match the algorithm's key family before
//! a single byte is read. ECDSA signatures are emitted in raw `r‖s` form,
//! fixed width per curve, to match the verify path's normalization.

use zeroize::Zeroize as _;

use crate::sensitive::{SecretBuffer, SensitivePool, Tag};

use super::{Algorithm, Error};

macro_rules! ecdsa_sign {
    ($curve:ident, $pool:expr, $tag:expr, $private_key:expr, $data:expr) => {{
        use $curve::ecdsa::signature::Signer as _;

        let key = $private_key.expose(|bytes| {
            $curve::ecdsa::SigningKey::from_slice(bytes)
                .map_err(|e| Error::MalformedKey(format!("EC private scalar: {e}")))
        })?;
        let signature: $curve::ecdsa::Signature = key.sign($data);
        Ok($pool.from_slice($tag, &signature.to_bytes())?)
    }};
}

macro_rules! mldsa_sign {
    ($set:ident, $pool:expr, $tag:expr, $private_key:expr, $data:expr) => {{
        use pqcrypto_traits::sign::{DetachedSignature as _, SecretKey as _};

        let key = $private_key.expose(|bytes| {
            pqcrypto_mldsa::$set::SecretKey::from_bytes(bytes)
                .map_err(|e| Error::MalformedKey(format!("ML-DSA private key: {e}")))
        })?;
        let signature = pqcrypto_mldsa::$set::detached_sign($data, &key);
        Ok($pool.from_slice($tag, signature.as_bytes())?)
    }};
}

/// Sign `data` with `private_key`, returning the signature in the canonical
/// encoding for `algorithm`: raw `r‖s` for ECDSA, 64 raw bytes for Ed25519,
/// a FIPS 204 detached signature for ML-DSA.
///
/// # Errors
///
/// Returns [`Error::TagMismatch`] if the buffer's tag is not the private-key
/// tag for `algorithm`, [`Error::UnsupportedAlgorithm`] for algorithms that
/// do not sign, and [`Error::MalformedKey`] if the key bytes do not decode.
pub fn sign(
    pool: &SensitivePool, algorithm: Algorithm, private_key: &SecretBuffer, data: &[u8],
) -> Result<SecretBuffer, Error> {
    let expected = algorithm.private_key_tag();
    if private_key.tag() != expected {
        return Err(Error::TagMismatch { expected, actual: private_key.tag() });
    }

    match algorithm {
        Algorithm::P256 => ecdsa_sign!(p256, pool, Tag::P256Signature, private_key, data),
        Algorithm::P384 => ecdsa_sign!(p384, pool, Tag::P384Signature, private_key, data),
        Algorithm::P521 => ecdsa_sign!(p521, pool, Tag::P521Signature, private_key, data),
        Algorithm::Secp256k1 => {
            ecdsa_sign!(k256, pool, Tag::Secp256k1Signature, private_key, data)
        }
        Algorithm::Ed25519 => sign_ed25519(pool, private_key, data),
        Algorithm::MlDsa44 => mldsa_sign!(mldsa44, pool, Tag::MlDsa44Signature, private_key, data),
        Algorithm::MlDsa65 => mldsa_sign!(mldsa65, pool, Tag::MlDsa65Signature, private_key, data),
        Algorithm::MlDsa87 => mldsa_sign!(mldsa87, pool, Tag::MlDsa87Signature, private_key, data),
        Algorithm::X25519
        | Algorithm::Rsa2048
        | Algorithm::Rsa4096
        | Algorithm::MlKem512
        | Algorithm::MlKem768
        | Algorithm::MlKem1024 => {
            Err(Error::UnsupportedAlgorithm { algorithm, operation: "sign" })
        }
    }
}

fn sign_ed25519(
    pool: &SensitivePool, private_key: &SecretBuffer, data: &[u8],
) -> Result<SecretBuffer, Error> {
    use ed25519_dalek::Signer as _;

    let key = private_key.expose(|bytes| {
        let mut seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::MalformedKey("Ed25519 seed must be 32 bytes".to_string()))?;
        let key = ed25519_dalek::SigningKey::from_bytes(&seed);
        seed.zeroize();
        Ok::<_, Error>(key)
    })?;
    let signature = key.sign(data);
    Ok(pool.from_slice(Tag::Ed25519Signature, &signature.to_bytes())?)
}
