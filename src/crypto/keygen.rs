//! # Key Generation
//!
//! Key-pair generation keyed by [`Algorithm`]. Every pair comes back as two
//! pooled [`SecretBuffer`](crate::sensitive::SecretBuffer)s in the canonical
//! encoding for the algorithm:
//!
//! - ECDSA: fixed-width big-endian scalar (left-padded with zero when the
//!   underlying integer is short) and a compressed SEC1 point.
//! - Ed25519 / X25519: raw 32-byte encodings.
//! - RSA: DID-compatible DER of the modulus for the public half, PKCS#1
//!   `RSAPrivateKey` DER for the private half.
//! - ML-DSA / ML-KEM: the raw FIPS 204 / FIPS 203 encodings.

use zeroize::Zeroize as _;

use crate::sensitive::{KeyPair, SensitivePool, Tag};

use super::{Algorithm, Error, encoding};

macro_rules! ecdsa_generate {
    ($curve:ident, $pool:expr, $public_tag:expr, $private_tag:expr) => {{
        let key = $curve::ecdsa::SigningKey::random(&mut rand_core::OsRng);
        let verifying_key = $curve::ecdsa::VerifyingKey::from(&key);
        let point = verifying_key.to_encoded_point(true);
        let public_key = $pool.from_slice($public_tag, point.as_bytes())?;
        let mut scalar = key.to_bytes();
        let private_key = $pool.from_slice($private_tag, &scalar)?;
        scalar.as_mut_slice().zeroize();
        Ok(KeyPair { public_key, private_key })
    }};
}

macro_rules! mldsa_generate {
    ($set:ident, $pool:expr, $public_tag:expr, $private_tag:expr) => {{
        use pqcrypto_traits::sign::{PublicKey as _, SecretKey as _};

        let (pk, sk) = pqcrypto_mldsa::$set::keypair();
        let public_key = $pool.from_slice($public_tag, pk.as_bytes())?;
        let private_key = $pool.from_slice($private_tag, sk.as_bytes())?;
        Ok(KeyPair { public_key, private_key })
    }};
}

macro_rules! mlkem_generate {
    ($set:ident, $pool:expr, $public_tag:expr, $private_tag:expr) => {{
        use pqcrypto_traits::kem::{PublicKey as _, SecretKey as _};

        let (pk, sk) = pqcrypto_mlkem::$set::keypair();
        let public_key = $pool.from_slice($public_tag, pk.as_bytes())?;
        let private_key = $pool.from_slice($private_tag, sk.as_bytes())?;
        Ok(KeyPair { public_key, private_key })
    }};
}

/// Generate a key pair for `algorithm`, renting both halves from `pool`.
///
/// # Errors
///
/// Returns [`Error::KeyGeneration`] if the underlying primitive fails
/// (effectively only reachable for RSA) and propagates pool length
/// invariants.
pub fn generate(pool: &SensitivePool, algorithm: Algorithm) -> Result<KeyPair, Error> {
    match algorithm {
        Algorithm::P256 => {
            ecdsa_generate!(p256, pool, Tag::P256PublicKey, Tag::P256PrivateKey)
        }
        Algorithm::P384 => {
            ecdsa_generate!(p384, pool, Tag::P384PublicKey, Tag::P384PrivateKey)
        }
        Algorithm::P521 => {
            ecdsa_generate!(p521, pool, Tag::P521PublicKey, Tag::P521PrivateKey)
        }
        Algorithm::Secp256k1 => {
            ecdsa_generate!(k256, pool, Tag::Secp256k1PublicKey, Tag::Secp256k1PrivateKey)
        }
        Algorithm::Ed25519 => generate_ed25519(pool),
        Algorithm::X25519 => generate_x25519(pool),
        Algorithm::Rsa2048 => {
            generate_rsa(pool, 2048, Tag::Rsa2048PublicKey, Tag::Rsa2048PrivateKey)
        }
        Algorithm::Rsa4096 => {
            generate_rsa(pool, 4096, Tag::Rsa4096PublicKey, Tag::Rsa4096PrivateKey)
        }
        Algorithm::MlDsa44 => {
            mldsa_generate!(mldsa44, pool, Tag::MlDsa44PublicKey, Tag::MlDsa44PrivateKey)
        }
        Algorithm::MlDsa65 => {
            mldsa_generate!(mldsa65, pool, Tag::MlDsa65PublicKey, Tag::MlDsa65PrivateKey)
        }
        Algorithm::MlDsa87 => {
            mldsa_generate!(mldsa87, pool, Tag::MlDsa87PublicKey, Tag::MlDsa87PrivateKey)
        }
        Algorithm::MlKem512 => {
            mlkem_generate!(mlkem512, pool, Tag::MlKem512PublicKey, Tag::MlKem512PrivateKey)
        }
        Algorithm::MlKem768 => {
            mlkem_generate!(mlkem768, pool, Tag::MlKem768PublicKey, Tag::MlKem768PrivateKey)
        }
        Algorithm::MlKem1024 => {
            mlkem_generate!(mlkem1024, pool, Tag::MlKem1024PublicKey, Tag::MlKem1024PrivateKey)
        }
    }
}

fn generate_ed25519(pool: &SensitivePool) -> Result<KeyPair, Error> {
    let key = ed25519_dalek::SigningKey::generate(&mut rand_core::OsRng);
    let public_key = pool.from_slice(Tag::Ed25519PublicKey, key.verifying_key().as_bytes())?;
    let mut seed = key.to_bytes();
    let private_key = pool.from_slice(Tag::Ed25519PrivateKey, &seed)?;
    seed.zeroize();
    Ok(KeyPair { public_key, private_key })
}

fn generate_x25519(pool: &SensitivePool) -> Result<KeyPair, Error> {
    let secret = x25519_dalek::StaticSecret::random_from_rng(rand_core::OsRng);
    let public = x25519_dalek::PublicKey::from(&secret);
    let public_key = pool.from_slice(Tag::X25519PublicKey, public.as_bytes())?;
    let mut raw = secret.to_bytes();
    let private_key = pool.from_slice(Tag::X25519PrivateKey, &raw)?;
    raw.zeroize();
    Ok(KeyPair { public_key, private_key })
}

fn generate_rsa(
    pool: &SensitivePool, bits: usize, public_tag: Tag, private_tag: Tag,
) -> Result<KeyPair, Error> {
    use rsa::pkcs1::EncodeRsaPrivateKey as _;
    use rsa::traits::PublicKeyParts as _;

    let key = rsa::RsaPrivateKey::new(&mut rand_core::OsRng, bits)
        .map_err(|e| Error::KeyGeneration(format!("RSA-{bits}: {e}")))?;

    let modulus = key.n().to_bytes_be();
    let public_key = pool.from_slice(public_tag, &encoding::rsa_public_key_der(&modulus))?;

    // SecretDocument zeroizes the PKCS#1 bytes on drop.
    let document =
        key.to_pkcs1_der().map_err(|e| Error::KeyGeneration(format!("PKCS#1 encode: {e}")))?;
    let private_key = pool.from_slice(private_tag, document.as_bytes())?;
    Ok(KeyPair { public_key, private_key })
}
