//! # Sensitive Pool
//!
//! A size-segregated allocator for secret byte regions. Regions are handed
//! out in [`SecretBuffer`]s and come back through `Drop`, already zeroized,
//! onto a per-size free list. Allocation happens in slab batches so repeated
//! key operations do not hit the system allocator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use super::{Error, SecretBuffer, Tag};

/// Segments allocated per slab for a given region size. Small regions are
/// batched generously; large post-quantum keys in fours.
const fn segments_for(size: usize) -> usize {
    match size {
        0..=128 => 32,
        129..=1024 => 16,
        1025..=4096 => 8,
        _ => 4,
    }
}

#[derive(Default)]
struct Bucket {
    free: Vec<Box<[u8]>>,
    slabs: usize,
}

#[derive(Default)]
pub(super) struct PoolInner {
    buckets: Mutex<HashMap<usize, Bucket>>,
}

impl PoolInner {
    /// Take a zeroed region of exactly `size` bytes, allocating a fresh slab
    /// batch when the free list is empty.
    fn take(&self, size: usize) -> Box<[u8]> {
        let mut buckets = self.buckets.lock().expect("pool mutex poisoned");
        let bucket = buckets.entry(size).or_default();

        if bucket.free.is_empty() {
            for _ in 0..segments_for(size) {
                bucket.free.push(vec![0_u8; size].into_boxed_slice());
            }
            bucket.slabs += 1;
        }

        let region = bucket.free.pop().expect("slab was just filled");
        // A wrong-sized region here is a programming error in the pool, not
        // recoverable state.
        assert_eq!(region.len(), size, "pool returned region of wrong length");
        region
    }

    /// Accept a region back. The caller must have zeroized it already.
    pub(super) fn put_back(&self, region: Box<[u8]>) {
        let mut buckets = self.buckets.lock().expect("pool mutex poisoned");
        buckets.entry(region.len()).or_default().free.push(region);
    }
}

/// A process-wide or per-subsystem pool of sensitive byte regions.
///
/// All operations serialize on a single internal mutex; two concurrent
/// [`rent`](Self::rent) calls return disjoint regions.
#[derive(Clone, Default)]
pub struct SensitivePool {
    inner: Arc<PoolInner>,
}

impl SensitivePool {
    /// Create an isolated pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default shared pool for the process.
    #[must_use]
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<SensitivePool> = OnceLock::new();
        SHARED.get_or_init(SensitivePool::new)
    }

    /// Rent a zeroed buffer of exactly `len` bytes carrying `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthInvariant`] if the tag has a canonical encoding
    /// length and `len` differs from it.
    pub fn rent(&self, tag: Tag, len: usize) -> Result<SecretBuffer, Error> {
        if let Some(expected) = tag.canonical_len() {
            if expected != len {
                return Err(Error::LengthInvariant { tag, expected, actual: len });
            }
        }
        let region = self.inner.take(len);
        Ok(SecretBuffer::from_parts(region, tag, Arc::downgrade(&self.inner)))
    }

    /// Rent a buffer carrying `tag` and copy `secret` into it.
    ///
    /// The caller keeps responsibility for its own copy of the bytes; copies
    /// this crate makes on the way into external libraries are zeroized after
    /// use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthInvariant`] if the tag has a canonical encoding
    /// length and `secret.len()` differs from it.
    pub fn from_slice(&self, tag: Tag, secret: &[u8]) -> Result<SecretBuffer, Error> {
        let mut buffer = self.rent(tag, secret.len())?;
        buffer.as_mut_slice().copy_from_slice(secret);
        Ok(buffer)
    }

    /// Release unused segments back to the system allocator. Regions still
    /// owned by live buffers are untouched and return to the pool when
    /// their buffers drop.
    pub fn trim_excess(&self) {
        let mut buckets = self.inner.buckets.lock().expect("pool mutex poisoned");
        for bucket in buckets.values_mut() {
            bucket.free.clear();
            bucket.free.shrink_to_fit();
            bucket.slabs = 0;
        }
    }

    /// Number of free segments currently pooled for `size`-byte regions.
    #[must_use]
    pub fn available_segments(&self, size: usize) -> usize {
        let buckets = self.inner.buckets.lock().expect("pool mutex poisoned");
        buckets.get(&size).map_or(0, |bucket| bucket.free.len())
    }

    /// Number of slab batches allocated for `size`-byte regions.
    #[must_use]
    pub fn slab_count(&self, size: usize) -> usize {
        let buckets = self.inner.buckets.lock().expect("pool mutex poisoned");
        buckets.get(&size).map_or(0, |bucket| bucket.slabs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rent_exact_length() {
        let pool = SensitivePool::new();
        let buffer = pool.rent(Tag::Ed25519PrivateKey, 32).expect("should rent");
        assert_eq!(buffer.len(), 32);
        assert_eq!(buffer.tag(), Tag::Ed25519PrivateKey);
        buffer.expose(|bytes| assert!(bytes.iter().all(|&b| b == 0)));
    }

    #[test]
    fn rejects_non_canonical_length() {
        let pool = SensitivePool::new();
        let err = pool.rent(Tag::Ed25519PrivateKey, 31).expect_err("should reject");
        assert!(matches!(err, Error::LengthInvariant { expected: 32, actual: 31, .. }));
    }

    #[test]
    fn released_region_is_zero() {
        let pool = SensitivePool::new();
        {
            let mut buffer = pool.rent(Tag::X25519SharedSecret, 32).expect("should rent");
            buffer.as_mut_slice().fill(0xFF);
        }
        // The region went back onto the free list; the next rent at this size
        // must observe zeroed memory without a fresh allocation.
        let free_before = pool.available_segments(32);
        let buffer = pool.rent(Tag::X25519SharedSecret, 32).expect("should rent");
        assert_eq!(pool.available_segments(32), free_before - 1);
        buffer.expose(|bytes| assert!(bytes.iter().all(|&b| b == 0)));
    }

    #[test]
    fn slab_batching() {
        let pool = SensitivePool::new();
        let _a = pool.rent(Tag::MlKemSharedSecret, 32).expect("should rent");
        assert_eq!(pool.slab_count(32), 1);
        // 31 free segments remain from the first slab of 32
        assert_eq!(pool.available_segments(32), 31);
    }

    #[test]
    fn trim_releases_free_segments() {
        let pool = SensitivePool::new();
        drop(pool.rent(Tag::MlKemSharedSecret, 32).expect("should rent"));
        assert!(pool.available_segments(32) > 0);
        pool.trim_excess();
        assert_eq!(pool.available_segments(32), 0);
    }

    #[test]
    fn disjoint_regions() {
        let pool = SensitivePool::new();
        let mut a = pool.rent(Tag::MlKemSharedSecret, 32).expect("should rent");
        let b = pool.rent(Tag::MlKemSharedSecret, 32).expect("should rent");
        a.as_mut_slice().fill(0xAA);
        b.expose(|bytes| assert!(bytes.iter().all(|&byte| byte == 0)));
    }
}
