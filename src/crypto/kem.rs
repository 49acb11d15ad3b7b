//! # Key Encapsulation
//!
//! ML-KEM encapsulation and decapsulation (FIPS 203). Ciphertexts and
//! shared secrets come back as pooled buffers; the shared secret is 32
//! bytes for every parameter set and carries
//! [`Tag::MlKemSharedSecret`].

use crate::sensitive::{SecretBuffer, SensitivePool, Tag};

use super::{Algorithm, Error};

macro_rules! mlkem_encapsulate {
    ($set:ident, $pool:expr, $ciphertext_tag:expr, $encapsulation_key:expr) => {{
        use pqcrypto_traits::kem::{Ciphertext as _, PublicKey as _, SharedSecret as _};

        let key = pqcrypto_mlkem::$set::PublicKey::from_bytes($encapsulation_key)
            .map_err(|e| Error::MalformedKey(format!("ML-KEM encapsulation key: {e}")))?;
        let (shared, ciphertext) = pqcrypto_mlkem::$set::encapsulate(&key);
        let ciphertext = $pool.from_slice($ciphertext_tag, ciphertext.as_bytes())?;
        let shared = $pool.from_slice(Tag::MlKemSharedSecret, shared.as_bytes())?;
        Ok((ciphertext, shared))
    }};
}

macro_rules! mlkem_decapsulate {
    ($set:ident, $pool:expr, $private_key:expr, $ciphertext:expr) => {{
        use pqcrypto_traits::kem::{Ciphertext as _, SecretKey as _, SharedSecret as _};

        let key = $private_key.expose(|bytes| {
            pqcrypto_mlkem::$set::SecretKey::from_bytes(bytes)
                .map_err(|e| Error::MalformedKey(format!("ML-KEM decapsulation key: {e}")))
        })?;
        let ciphertext = pqcrypto_mlkem::$set::Ciphertext::from_bytes($ciphertext)
            .map_err(|e| Error::MalformedSignature(format!("ML-KEM ciphertext: {e}")))?;
        let shared = pqcrypto_mlkem::$set::decapsulate(&ciphertext, &key);
        Ok($pool.from_slice(Tag::MlKemSharedSecret, shared.as_bytes())?)
    }};
}

/// Encapsulate a fresh shared secret to `encapsulation_key`, returning the
/// `(ciphertext, shared_secret)` pair.
///
/// # Errors
///
/// Returns [`Error::UnsupportedAlgorithm`] for non-KEM algorithms and
/// [`Error::MalformedKey`] if the encapsulation key has the wrong length.
pub fn encapsulate(
    pool: &SensitivePool, algorithm: Algorithm, encapsulation_key: &[u8],
) -> Result<(SecretBuffer, SecretBuffer), Error> {
    match algorithm {
        Algorithm::MlKem512 => {
            mlkem_encapsulate!(mlkem512, pool, Tag::MlKem512Ciphertext, encapsulation_key)
        }
        Algorithm::MlKem768 => {
            mlkem_encapsulate!(mlkem768, pool, Tag::MlKem768Ciphertext, encapsulation_key)
        }
        Algorithm::MlKem1024 => {
            mlkem_encapsulate!(mlkem1024, pool, Tag::MlKem1024Ciphertext, encapsulation_key)
        }
        _ => Err(Error::UnsupportedAlgorithm { algorithm, operation: "encapsulate" }),
    }
}

/// Recover the shared secret from `ciphertext` with the decapsulation key.
///
/// # Errors
///
/// Returns [`Error::UnsupportedAlgorithm`] for non-KEM algorithms,
/// [`Error::TagMismatch`] when the private key carries the wrong tag, and
/// [`Error::MalformedKey`] / [`Error::MalformedSignature`] when key or
/// ciphertext have the wrong length.
pub fn decapsulate(
    pool: &SensitivePool, algorithm: Algorithm, private_key: &SecretBuffer, ciphertext: &[u8],
) -> Result<SecretBuffer, Error> {
    let expected = algorithm.private_key_tag();
    if private_key.tag() != expected {
        return Err(Error::TagMismatch { expected, actual: private_key.tag() });
    }

    match algorithm {
        Algorithm::MlKem512 => mlkem_decapsulate!(mlkem512, pool, private_key, ciphertext),
        Algorithm::MlKem768 => mlkem_decapsulate!(mlkem768, pool, private_key, ciphertext),
        Algorithm::MlKem1024 => mlkem_decapsulate!(mlkem1024, pool, private_key, ciphertext),
        _ => Err(Error::UnsupportedAlgorithm { algorithm, operation: "decapsulate" }),
    }
}
