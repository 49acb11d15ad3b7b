//! # Secret Buffer
//!
//! The universal owned secret type. A [`SecretBuffer`] holds exactly one
//! byte region rented from a [`SensitivePool`](super::SensitivePool), carries
//! the [`Tag`] naming its role, and can only be read through a scoped
//! accessor. It is move-only; dropping it zeroizes the region and returns it
//! to the pool.

use std::fmt;
use std::sync::Weak;

use zeroize::Zeroize;

use super::Tag;
use super::pool::PoolInner;

/// An owned, tagged region of sensitive bytes.
///
/// There is no `Clone` and no way to obtain a long-lived reference to the
/// contents; transfers of the buffer move ownership.
pub struct SecretBuffer {
    region: Option<Box<[u8]>>,
    tag: Tag,
    pool: Weak<PoolInner>,
}

impl SecretBuffer {
    pub(super) fn from_parts(region: Box<[u8]>, tag: Tag, pool: Weak<PoolInner>) -> Self {
        Self { region: Some(region), tag, pool }
    }

    /// The role of the bytes held here.
    #[must_use]
    pub const fn tag(&self) -> Tag {
        self.tag
    }

    /// Length of the byte region.
    #[must_use]
    pub fn len(&self) -> usize {
        self.region.as_ref().map_or(0, |region| region.len())
    }

    /// Whether the region is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the contents inside a closure.
    ///
    /// The closure receives a read-only view that must not escape; any copy
    /// made inside is the closure's responsibility to zeroize.
    pub fn expose<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.region.as_deref().unwrap_or(&[]))
    }

    /// Mutable access for in-crate producers (key generation, signing).
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        self.region.as_deref_mut().unwrap_or(&mut [])
    }
}

/// Contents are never printed; only the tag and length are observable.
impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBuffer").field("tag", &self.tag).field("len", &self.len()).finish()
    }
}

impl Drop for SecretBuffer {
    fn drop(&mut self) {
        if let Some(mut region) = self.region.take() {
            region.zeroize();
            if let Some(pool) = self.pool.upgrade() {
                pool.put_back(region);
            }
            // If the pool is gone the zeroized region falls to the allocator.
        }
    }
}

/// A generated key pair. Both halves are owned [`SecretBuffer`]s in the
/// canonical encoding for their algorithm.
#[derive(Debug)]
pub struct KeyPair {
    /// The public half.
    pub public_key: SecretBuffer,
    /// The private half.
    pub private_key: SecretBuffer,
}
