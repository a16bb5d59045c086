//! # Key Fingerprinting
//!
//! Purpose: Provide the fingerprint function shared by lookups and stored
//! entries.
//!
//! ## Design Principles
//! 1. **One Hasher, One Store**: A `KeyHasher` is owned by a single store
//!    instance so every fingerprint it produces is comparable to every other;
//!    two different `KeyHasher`s are not interchangeable.
//! 2. **Fingerprint Plus Full Equality**: A fingerprint collision is always
//!    possible; the primary index never trusts the fingerprint alone; see
//!    `kv-store::primary_index`.

use std::hash::{BuildHasher, Hasher};

/// Computes 64-bit key fingerprints for one store instance.
///
/// Wraps `ahash`, matching this workspace's existing choice (the sharded
/// engine's shard-selection hasher) for fast, non-cryptographic hashing of
/// short byte strings.
#[derive(Debug, Clone)]
pub struct KeyHasher(ahash::RandomState);

impl KeyHasher {
    /// Creates a hasher with a process-local random seed.
    pub fn new() -> Self {
        KeyHasher(ahash::RandomState::new())
    }

    /// Computes the 64-bit fingerprint of `bytes`.
    pub fn fingerprint(&self, bytes: &[u8]) -> u64 {
        let mut hasher = self.0.build_hasher();
        hasher.write(bytes);
        hasher.finish()
    }
}

impl Default for KeyHasher {
    fn default() -> Self {
        Self::new()
    }
}
