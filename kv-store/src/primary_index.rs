//! # Primary Index
//!
//! Purpose: Own every live entry in a chained hash index keyed by
//! `key_hash mod bucket_count` plus full-key equality, with synchronous
//! power-of-two rehashing.
//!
//! ## Design Principles
//! 1. **Intrusive Chaining**: Each bucket is a singly-linked chain threaded
//!    through `Entry::primary_link`; no bucket allocates a `Vec` of its own.
//! 2. **Caller Resolves Duplicates**: `insert` does not check for an
//!    existing entry under the same key; the facade looks up and removes any
//!    prior entry before calling `insert` (see `facade::Store::replace`).
//! 3. **One-Shot Rehash**: Crossing the load factor triggers one synchronous
//!    doubling and full redistribution, not an amortized incremental scheme.
//! 4. **Never Shrinks**: Erasing entries lowers `len` but never lowers
//!    `bucket_count`.

use kv_common::{StoreError, StoreResult};

use crate::alloc::{EntryHandle, Slab};
use crate::entry::Entry;

/// Chained hash index over live entries, keyed by `key_hash` and full-key
/// equality.
pub struct PrimaryIndex {
    buckets: Vec<Option<EntryHandle>>,
    len: usize,
    load_factor: f64,
}

impl PrimaryIndex {
    /// Creates an index with `initial_buckets` buckets (rounded up to a
    /// power of two) and the given load factor threshold.
    pub fn new(initial_buckets: usize, load_factor: f64) -> Self {
        let bucket_count = initial_buckets.max(1).next_power_of_two();
        PrimaryIndex {
            buckets: vec![None; bucket_count],
            len: 0,
            load_factor,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count. Always a power of two.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_of(&self, key_hash: u64) -> usize {
        (key_hash as usize) & (self.buckets.len() - 1)
    }

    /// Looks up the entry matching `key`/`key_hash`, if present.
    pub fn lookup(&self, slab: &Slab<Entry>, key: &[u8], key_hash: u64) -> Option<EntryHandle> {
        let mut cursor = self.buckets[self.bucket_of(key_hash)];
        while let Some(handle) = cursor {
            let entry = slab.get(handle).expect("primary index handle is stale");
            if entry.key_hash() == key_hash && entry.key() == key {
                return Some(handle);
            }
            cursor = entry.primary_link;
        }
        None
    }

    /// Links `handle` into its bucket. Does not check for a duplicate key;
    /// the caller must have already removed any prior entry under the same
    /// key (see module docs).
    pub fn insert(&mut self, slab: &mut Slab<Entry>, handle: EntryHandle) {
        let key_hash = slab.get(handle).expect("handle must be live").key_hash();
        let bucket = self.bucket_of(key_hash);
        let old_head = self.buckets[bucket];
        slab.get_mut(handle).expect("handle must be live").primary_link = old_head;
        self.buckets[bucket] = Some(handle);
        self.len += 1;
    }

    /// Unlinks the entry matching `key`/`key_hash`, if present, and returns
    /// its handle. The caller is responsible for removing the handle from
    /// the expiration index (if a member) before freeing it from the slab.
    pub fn remove(&mut self, slab: &mut Slab<Entry>, key: &[u8], key_hash: u64) -> Option<EntryHandle> {
        let bucket = self.bucket_of(key_hash);
        let mut cursor = self.buckets[bucket];
        let mut prev: Option<EntryHandle> = None;

        while let Some(handle) = cursor {
            let (matches, next) = {
                let entry = slab.get(handle).expect("primary index handle is stale");
                (entry.key_hash() == key_hash && entry.key() == key, entry.primary_link)
            };

            if matches {
                match prev {
                    Some(prev_handle) => {
                        slab.get_mut(prev_handle).expect("handle must be live").primary_link = next;
                    }
                    None => self.buckets[bucket] = next,
                }
                slab.get_mut(handle).expect("handle must be live").primary_link = None;
                self.len -= 1;
                return Some(handle);
            }

            prev = Some(handle);
            cursor = next;
        }
        None
    }

    /// True if an insertion should trigger `rehash` (load factor threshold
    /// reached or exceeded).
    pub fn needs_rehash(&self) -> bool {
        (self.len as f64) >= self.load_factor * (self.buckets.len() as f64)
    }

    /// Doubles the bucket count and redistributes every live entry.
    ///
    /// Best-effort: if growing the bucket storage fails, the index is left
    /// untouched at its old capacity and `AllocationFailure` is returned; a
    /// later insertion will retry. This never undoes an insertion that has
    /// already succeeded.
    pub fn rehash(&mut self, slab: &mut Slab<Entry>) -> StoreResult<()> {
        let new_count = self.buckets.len() * 2;
        let mut new_buckets: Vec<Option<EntryHandle>> = Vec::new();
        new_buckets
            .try_reserve_exact(new_count)
            .map_err(|_| StoreError::AllocationFailure {
                reason: "failed to grow primary index buckets",
            })?;
        new_buckets.resize(new_count, None);

        let mask = new_count - 1;
        for bucket in self.buckets.drain(..) {
            let mut cursor = bucket;
            while let Some(handle) = cursor {
                let key_hash = slab_key_hash(slab, handle);
                let new_bucket = (key_hash as usize) & mask;
                cursor = link_into(slab, handle, &mut new_buckets, new_bucket);
            }
        }

        self.buckets = new_buckets;
        Ok(())
    }
}

fn slab_key_hash(slab: &Slab<Entry>, handle: EntryHandle) -> u64 {
    slab.get(handle).expect("primary index handle is stale").key_hash()
}

/// Reads `handle`'s current `primary_link` (the next entry in its *old*
/// chain), then rewrites it to point at the new bucket's current head and
/// makes `handle` that head, returning the old-chain successor so the
/// caller's traversal can continue.
fn link_into(
    slab: &mut Slab<Entry>,
    handle: EntryHandle,
    new_buckets: &mut [Option<EntryHandle>],
    new_bucket: usize,
) -> Option<EntryHandle> {
    let entry = slab.get_mut(handle).expect("primary index handle is stale");
    let next = entry.primary_link;
    entry.primary_link = new_buckets[new_bucket];
    new_buckets[new_bucket] = Some(handle);
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(bytes: &[u8]) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        bytes.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn insert_then_lookup_finds_entry() {
        let mut slab = Slab::new();
        let mut index = PrimaryIndex::new(4, 0.75);
        let h = slab.insert(Entry::new_int64(b"foo".to_vec(), hash(b"foo"), 1)).unwrap();
        index.insert(&mut slab, h);

        let found = index.lookup(&slab, b"foo", hash(b"foo"));
        assert_eq!(found, Some(h));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn remove_unlinks_and_lookup_then_misses() {
        let mut slab = Slab::new();
        let mut index = PrimaryIndex::new(4, 0.75);
        let h = slab.insert(Entry::new_int64(b"foo".to_vec(), hash(b"foo"), 1)).unwrap();
        index.insert(&mut slab, h);

        let removed = index.remove(&mut slab, b"foo", hash(b"foo"));
        assert_eq!(removed, Some(h));
        assert_eq!(index.lookup(&slab, b"foo", hash(b"foo")), None);
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn chained_keys_in_same_bucket_are_distinguished() {
        let mut slab = Slab::new();
        let mut index = PrimaryIndex::new(1, 10.0); // force everything into bucket 0
        let ha = slab.insert(Entry::new_int64(b"a".to_vec(), hash(b"a"), 1)).unwrap();
        let hb = slab.insert(Entry::new_int64(b"b".to_vec(), hash(b"b"), 2)).unwrap();
        index.insert(&mut slab, ha);
        index.insert(&mut slab, hb);

        assert_eq!(index.lookup(&slab, b"a", hash(b"a")), Some(ha));
        assert_eq!(index.lookup(&slab, b"b", hash(b"b")), Some(hb));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn rehash_preserves_every_key() {
        let mut slab = Slab::new();
        let mut index = PrimaryIndex::new(2, 0.75);
        let mut handles = Vec::new();
        for i in 0..10u32 {
            let key = format!("key-{i}").into_bytes();
            let h = slab.insert(Entry::new_int64(key.clone(), hash(&key), i as i64)).unwrap();
            index.insert(&mut slab, h);
            if index.needs_rehash() {
                index.rehash(&mut slab).unwrap();
            }
            handles.push((key, h));
        }

        assert_eq!(index.len(), 10);
        for (key, h) in handles {
            assert_eq!(index.lookup(&slab, &key, hash(&key)), Some(h));
        }
    }
}
