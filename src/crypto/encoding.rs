//! # DER Assembly
//!
//! Minimal DER construction for the handful of structures this crate emits
//! itself: the `SubjectPublicKeyInfo` envelope for EC points and the
//! DID-compatible RSA public key (`RSAPublicKey ::= SEQUENCE { modulus,
//! publicExponent }`). Parsing stays with the `der`/`spki` crates; only the
//! write path is hand-assembled.

use der::asn1::ObjectIdentifier;

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OBJECT_IDENTIFIER: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

/// The default RSA public exponent, 65537.
const F4: [u8; 3] = [0x01, 0x00, 0x01];

/// Append a definite length in DER form (short or long).
fn push_len(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(u8::try_from(len).expect("< 0x80"));
        return;
    }
    let bytes = len.to_be_bytes();
    let significant: Vec<u8> = bytes.iter().copied().skip_while(|&b| b == 0).collect();
    out.push(0x80 | u8::try_from(significant.len()).expect("length of length fits"));
    out.extend_from_slice(&significant);
}

/// Append one tag-length-value triple.
fn push_tlv(out: &mut Vec<u8>, tag: u8, content: &[u8]) {
    out.push(tag);
    push_len(out, content.len());
    out.extend_from_slice(content);
}

/// Encode an unsigned big-endian integer as a DER INTEGER: leading zero
/// octets stripped, a zero octet prepended when the high bit is set.
fn integer(unsigned: &[u8]) -> Vec<u8> {
    let trimmed: &[u8] = {
        let start = unsigned.iter().position(|&b| b != 0).unwrap_or(unsigned.len() - 1);
        &unsigned[start..]
    };
    let mut content = Vec::with_capacity(trimmed.len() + 1);
    if trimmed.first().is_some_and(|&b| b & 0x80 != 0) {
        content.push(0x00);
    }
    content.extend_from_slice(trimmed);

    let mut out = Vec::with_capacity(content.len() + 4);
    push_tlv(&mut out, TAG_INTEGER, &content);
    out
}

/// Encode an unsigned big-endian value pair as a raw ASN.1 DER integer
/// sequence. Used for wrapping raw ECDSA `r‖s` signatures.
#[must_use]
pub fn ecdsa_der_signature(r: &[u8], s: &[u8]) -> Vec<u8> {
    let mut body = integer(r);
    body.extend_from_slice(&integer(s));

    let mut out = Vec::with_capacity(body.len() + 4);
    push_tlv(&mut out, TAG_SEQUENCE, &body);
    out
}

/// Encode `RSAPublicKey ::= SEQUENCE { modulus INTEGER, publicExponent
/// INTEGER }` from a big-endian modulus, with the conventional exponent
/// 65537. This is the DID-compatible public encoding of an RSA key.
#[must_use]
pub fn rsa_public_key_der(modulus: &[u8]) -> Vec<u8> {
    let mut body = integer(modulus);
    body.extend_from_slice(&integer(&F4));

    let mut out = Vec::with_capacity(body.len() + 4);
    push_tlv(&mut out, TAG_SEQUENCE, &body);
    out
}

/// Assemble `SubjectPublicKeyInfo` DER from an algorithm OID, a parameters
/// OID, and the raw public key bytes (no unused bits).
#[must_use]
pub(super) fn subject_public_key_info(
    algorithm: &ObjectIdentifier, parameters: &ObjectIdentifier, public_key: &[u8],
) -> Vec<u8> {
    let mut alg_body = Vec::new();
    push_tlv(&mut alg_body, TAG_OBJECT_IDENTIFIER, algorithm.as_bytes());
    push_tlv(&mut alg_body, TAG_OBJECT_IDENTIFIER, parameters.as_bytes());

    let mut body = Vec::new();
    push_tlv(&mut body, TAG_SEQUENCE, &alg_body);

    // BIT STRING: one leading octet for the unused-bit count
    let mut bits = Vec::with_capacity(public_key.len() + 1);
    bits.push(0x00);
    bits.extend_from_slice(public_key);
    push_tlv(&mut body, TAG_BIT_STRING, &bits);

    let mut out = Vec::new();
    push_tlv(&mut out, TAG_SEQUENCE, &body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_integer() {
        assert_eq!(integer(&[0x05]), vec![0x02, 0x01, 0x05]);
    }

    #[test]
    fn high_bit_gets_zero_prefix() {
        assert_eq!(integer(&[0x80]), vec![0x02, 0x02, 0x00, 0x80]);
    }

    #[test]
    fn leading_zeros_stripped() {
        assert_eq!(integer(&[0x00, 0x00, 0x7F]), vec![0x02, 0x01, 0x7F]);
    }

    #[test]
    fn zero_is_one_octet() {
        assert_eq!(integer(&[0x00, 0x00]), vec![0x02, 0x01, 0x00]);
    }

    #[test]
    fn long_form_length() {
        let modulus = [0x7F_u8; 200];
        let der = rsa_public_key_der(&modulus);
        // SEQUENCE with long-form length: 0x30 0x81 len
        assert_eq!(der[0], 0x30);
        assert_eq!(der[1], 0x81);
        // INTEGER n (200 bytes, long form), INTEGER e (3 bytes)
        assert_eq!(&der[3..7], &[0x02, 0x81, 0xC8, 0x7F]);
        assert_eq!(&der[der.len() - 5..], &[0x02, 0x03, 0x01, 0x00, 0x01]);
    }

    #[test]
    fn der_signature_wraps_raw() {
        let r = [0x01_u8; 32];
        let s = [0xFF_u8; 32];
        let der = ecdsa_der_signature(&r, &s);
        assert_eq!(der[0], 0x30);
        // r keeps 32 octets, s gains a zero prefix for the high bit
        assert_eq!(der[2..4], [0x02, 0x20]);
        assert_eq!(der[36..39], [0x02, 0x21, 0x00]);
    }
}
