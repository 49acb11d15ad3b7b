//! # `SubjectPublicKeyInfo` Handling
//!
//! Strict decode of X.509 `SubjectPublicKeyInfo` for ECDSA verification
//! keys: the `AlgorithmIdentifier` must name `id-ecPublicKey`, the
//! parameters must be the named-curve OID for the algorithm the caller
//! requested, and the `subjectPublicKey` BIT STRING must have no unused
//! bits. There is deliberately no auto-detection of key types here.

use der::Decode as _;
use der::asn1::ObjectIdentifier;
use spki::SubjectPublicKeyInfoRef;

use super::{Algorithm, Error, encoding};

/// `id-ecPublicKey` per RFC 5480.
const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");
const SECP256K1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.10");

/// The named-curve OID for an ECDSA algorithm.
pub(super) fn curve_oid(algorithm: Algorithm) -> Result<ObjectIdentifier, Error> {
    match algorithm {
        Algorithm::P256 => Ok(SECP256R1),
        Algorithm::P384 => Ok(SECP384R1),
        Algorithm::P521 => Ok(SECP521R1),
        Algorithm::Secp256k1 => Ok(SECP256K1),
        _ => Err(Error::UnsupportedAlgorithm { algorithm, operation: "named-curve lookup" }),
    }
}

/// Decode an EC point from `SubjectPublicKeyInfo` DER, checking that the
/// named curve matches `algorithm`.
pub(super) fn decode_ec_point<'a>(
    algorithm: Algorithm, spki_der: &'a [u8],
) -> Result<&'a [u8], Error> {
    let info = SubjectPublicKeyInfoRef::from_der(spki_der)
        .map_err(|e| Error::MalformedKey(format!("SubjectPublicKeyInfo does not parse: {e}")))?;

    if info.algorithm.oid != ID_EC_PUBLIC_KEY {
        return Err(Error::MalformedKey(format!(
            "algorithm {} is not id-ecPublicKey",
            info.algorithm.oid
        )));
    }

    let named_curve = info
        .algorithm
        .parameters_oid()
        .map_err(|_| Error::MalformedKey("named-curve parameters missing".to_string()))?;
    let expected = curve_oid(algorithm)?;
    if named_curve != expected {
        return Err(Error::MalformedKey(format!(
            "named curve {named_curve} does not match requested {expected}"
        )));
    }

    info.subject_public_key
        .as_bytes()
        .ok_or_else(|| Error::MalformedKey("public key BIT STRING has unused bits".to_string()))
}

/// Encode an EC point as `SubjectPublicKeyInfo` DER for `algorithm`.
///
/// Accepts the compressed point emitted by [`generate`](super::generate) as
/// well as an uncompressed SEC1 point.
///
/// # Errors
///
/// Returns [`Error::UnsupportedAlgorithm`] for non-ECDSA algorithms.
pub fn ec_subject_public_key_info(
    algorithm: Algorithm, point: &[u8],
) -> Result<Vec<u8>, Error> {
    let named_curve = curve_oid(algorithm)?;
    Ok(encoding::subject_public_key_info(&ID_EC_PUBLIC_KEY, &named_curve, point))
}

#[cfg(test)]
mod tests {
    use super::*;

    // SubjectPublicKeyInfo for a P-256 point, assembled by the encoder and
    // re-parsed by the strict decoder.
    #[test]
    fn encode_then_decode() {
        let point = [0x02_u8; 33];
        let spki_der =
            ec_subject_public_key_info(Algorithm::P256, &point).expect("should encode");
        let decoded = decode_ec_point(Algorithm::P256, &spki_der).expect("should decode");
        assert_eq!(decoded, &point);
    }

    #[test]
    fn rejects_curve_mismatch() {
        let point = [0x02_u8; 33];
        let spki_der =
            ec_subject_public_key_info(Algorithm::P256, &point).expect("should encode");
        let err = decode_ec_point(Algorithm::P384, &spki_der).expect_err("should reject");
        assert!(matches!(err, Error::MalformedKey(_)));
    }

    #[test]
    fn rejects_non_ec_algorithm_identifier() {
        // RSA OID in place of id-ecPublicKey
        let rsa_oid = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
        let spki_der = encoding::subject_public_key_info(&rsa_oid, &SECP256R1, &[0x02; 33]);
        let err = decode_ec_point(Algorithm::P256, &spki_der).expect_err("should reject");
        assert!(matches!(err, Error::MalformedKey(_)));
    }

    #[test]
    fn rejects_garbage() {
        let err = decode_ec_point(Algorithm::P256, &[0xDE, 0xAD]).expect_err("should reject");
        assert!(matches!(err, Error::MalformedKey(_)));
    }

    #[test]
    fn no_curve_for_ed25519() {
        let err = curve_oid(Algorithm::Ed25519).expect_err("should reject");
        assert!(matches!(err, Error::UnsupportedAlgorithm { .. }));
    }
}
