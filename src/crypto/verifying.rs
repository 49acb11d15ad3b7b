//! # Signature Verification
//!
//! Verification keyed by [`Algorithm`]. A `true`/`false` result reports
//! whether the signature checks out; structural problems — an unparseable
//! key or signature, an unsupported algorithm — surface as errors instead.

use super::{Algorithm, Error, encoding, spki};

/// Normalize an ECDSA signature: raw `r‖s` of exactly `2·field_len` bytes is
/// wrapped into an ASN.1 DER `SEQUENCE { INTEGER r, INTEGER s }`; anything
/// else is passed through as DER.
fn normalized_der(signature: &[u8], field_len: usize) -> std::borrow::Cow<'_, [u8]> {
    if signature.len() == 2 * field_len {
        std::borrow::Cow::Owned(encoding::ecdsa_der_signature(
            &signature[..field_len],
            &signature[field_len..],
        ))
    } else {
        std::borrow::Cow::Borrowed(signature)
    }
}

macro_rules! ecdsa_verify {
    ($curve:ident, $field_len:expr, $algorithm:expr, $data:expr, $signature:expr, $public_key:expr) => {{
        use $curve::ecdsa::signature::Verifier as _;

        let point = spki::decode_ec_point($algorithm, $public_key)?;
        let key = $curve::ecdsa::VerifyingKey::from_sec1_bytes(point)
            .map_err(|e| Error::MalformedKey(format!("EC point does not decode: {e}")))?;
        let der = normalized_der($signature, $field_len);
        let sig = $curve::ecdsa::Signature::from_der(&der)
            .map_err(|e| Error::MalformedSignature(format!("signature does not parse: {e}")))?;
        Ok(key.verify($data, &sig).is_ok())
    }};
}

macro_rules! mldsa_verify {
    ($set:ident, $data:expr, $signature:expr, $public_key:expr) => {{
        use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _};

        let key = pqcrypto_mldsa::$set::PublicKey::from_bytes($public_key)
            .map_err(|e| Error::MalformedKey(format!("ML-DSA public key: {e}")))?;
        let sig = pqcrypto_mldsa::$set::DetachedSignature::from_bytes($signature)
            .map_err(|e| Error::MalformedSignature(format!("ML-DSA signature: {e}")))?;
        Ok(pqcrypto_mldsa::$set::verify_detached_signature(&sig, $data, &key).is_ok())
    }};
}

/// Verify `signature` over `data` with `public_key`.
///
/// Key encodings are fixed per algorithm: `SubjectPublicKeyInfo` DER for the
/// ECDSA family, raw 32 bytes for Ed25519, the FIPS 204 encoding for ML-DSA.
/// ECDSA signatures may be raw `r‖s` or ASN.1 DER.
///
/// # Errors
///
/// Returns [`Error::UnsupportedAlgorithm`] for algorithms that do not
/// verify, [`Error::MalformedKey`] or [`Error::MalformedSignature`] when an
/// input does not parse in its declared encoding.
pub fn verify(
    algorithm: Algorithm, data: &[u8], signature: &[u8], public_key: &[u8],
) -> Result<bool, Error> {
    match algorithm {
        Algorithm::P256 => ecdsa_verify!(p256, 32, algorithm, data, signature, public_key),
        Algorithm::P384 => ecdsa_verify!(p384, 48, algorithm, data, signature, public_key),
        Algorithm::P521 => ecdsa_verify!(p521, 66, algorithm, data, signature, public_key),
        Algorithm::Secp256k1 => ecdsa_verify!(k256, 32, algorithm, data, signature, public_key),
        Algorithm::Ed25519 => verify_ed25519(data, signature, public_key),
        Algorithm::MlDsa44 => mldsa_verify!(mldsa44, data, signature, public_key),
        Algorithm::MlDsa65 => mldsa_verify!(mldsa65, data, signature, public_key),
        Algorithm::MlDsa87 => mldsa_verify!(mldsa87, data, signature, public_key),
        Algorithm::X25519
        | Algorithm::Rsa2048
        | Algorithm::Rsa4096
        | Algorithm::MlKem512
        | Algorithm::MlKem768
        | Algorithm::MlKem1024 => {
            Err(Error::UnsupportedAlgorithm { algorithm, operation: "verify" })
        }
    }
}

fn verify_ed25519(data: &[u8], signature: &[u8], public_key: &[u8]) -> Result<bool, Error> {
    use ed25519_dalek::Verifier as _;

    let key_bytes: &[u8; 32] = public_key
        .try_into()
        .map_err(|_| Error::MalformedKey("Ed25519 public key must be 32 bytes".to_string()))?;
    let key = ed25519_dalek::VerifyingKey::from_bytes(key_bytes)
        .map_err(|e| Error::MalformedKey(format!("Ed25519 public key: {e}")))?;
    let sig_bytes: &[u8; 64] = signature
        .try_into()
        .map_err(|_| Error::MalformedSignature("Ed25519 signature must be 64 bytes".to_string()))?;
    let sig = ed25519_dalek::Signature::from_bytes(sig_bytes);
    Ok(key.verify(data, &sig).is_ok())
}
