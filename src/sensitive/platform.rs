//! # Platform Encryption at Rest
//!
//! Wraps a long-lived secret in a platform keystore cipher (DPAPI and
//! equivalents) so the plaintext exists only inside a scoped closure. The
//! cipher itself is a narrow collaborator trait; this module owns the
//! lifetime discipline, not the platform call.

use zeroize::Zeroizing;

use super::{Error, SecretBuffer, SensitivePool, Tag};

/// A platform data-protection cipher.
///
/// Implementations wrap an OS keystore facility (Windows DPAPI, macOS
/// Keychain, Linux Secret Service). `seal` and `open` must be inverses for
/// the same platform principal.
pub trait PlatformCipher {
    /// Encrypt `plaintext` under the platform principal's key.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform facility rejects the request.
    fn seal(&self, plaintext: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Decrypt `ciphertext` previously produced by [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// Returns an error if the ciphertext is not openable by this principal.
    fn open(&self, ciphertext: &[u8]) -> anyhow::Result<Vec<u8>>;
}

/// A secret held encrypted at rest.
///
/// The encrypted form stays in place across decrypt calls; each
/// [`with_decrypted`](Self::with_decrypted) produces a transient plaintext
/// buffer that is zeroized when the closure returns.
#[derive(Debug)]
pub struct PlatformEncryptedSecret {
    encrypted: SecretBuffer,
    inner_tag: Tag,
}

impl PlatformEncryptedSecret {
    /// Seal `secret` with `cipher`, consuming the plaintext buffer.
    ///
    /// The plaintext buffer is dropped (and thereby zeroized) before this
    /// function returns, on success and failure alike.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Platform`] if the cipher rejects the plaintext.
    pub fn seal(
        pool: &SensitivePool, cipher: &impl PlatformCipher, secret: SecretBuffer,
    ) -> Result<Self, Error> {
        let inner_tag = secret.tag();
        let sealed = secret.expose(|plaintext| cipher.seal(plaintext)).map_err(Error::Platform)?;
        let encrypted = pool.from_slice(Tag::WindowsPlatformEncrypted, &sealed)?;
        Ok(Self { encrypted, inner_tag })
    }

    /// The tag of the secret held inside the encrypted envelope.
    #[must_use]
    pub const fn inner_tag(&self) -> Tag {
        self.inner_tag
    }

    /// Length of the encrypted form.
    #[must_use]
    pub fn encrypted_len(&self) -> usize {
        self.encrypted.len()
    }

    /// Decrypt into a transient buffer, hand it to `f`, and zeroize it on
    /// exit. The encrypted form remains in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Platform`] if the cipher cannot open the envelope.
    pub fn with_decrypted<R>(
        &self, pool: &SensitivePool, cipher: &impl PlatformCipher,
        f: impl FnOnce(&SecretBuffer) -> R,
    ) -> Result<R, Error> {
        let plaintext = Zeroizing::new(
            self.encrypted.expose(|ciphertext| cipher.open(ciphertext)).map_err(Error::Platform)?,
        );
        let transient = pool.from_slice(self.inner_tag, &plaintext)?;
        Ok(f(&transient))
    }
}
