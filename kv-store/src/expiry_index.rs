//! # Expiration Index
//!
//! Purpose: Track the subset of live entries with a finite deadline, bucketed
//! by deadline (a "time-wheel style" index per the data model), and support
//! draining everything due by `now` plus reporting the next pending deadline.
//!
//! ## Design Principles
//! 1. **Reference, Never Owns**: Entries are referenced by `EntryHandle`;
//!    this index never constructs or drops an `Entry`. Removing an entry
//!    from the primary index must happen only after (or as part of the same
//!    operation as) removing it here if it was a member.
//! 2. **Intrusive Per-Bucket Chaining**: Entries sharing an exact deadline
//!    are chained through `Entry::expiry_link`'s `prev`/`next` pair, giving
//!    O(1) removal given just a handle and its deadline: no bucket scans an
//!    owned `Vec`.
//! 3. **O(1) Live Count**: `size` is a maintained counter, not a recount over
//!    buckets, so `expiring_size() <= size()` can be checked cheaply by
//!    callers on every operation.

use std::collections::BTreeMap;

use kv_common::Deadline;

use crate::alloc::{EntryHandle, Slab};
use crate::entry::Entry;

#[derive(Default)]
struct Bucket {
    head: Option<EntryHandle>,
}

/// Timer-bucketed set over entries with a finite deadline.
pub struct ExpiryIndex {
    buckets: BTreeMap<Deadline, Bucket>,
    size: usize,
}

impl ExpiryIndex {
    /// Creates an empty expiration index.
    pub fn new() -> Self {
        ExpiryIndex {
            buckets: BTreeMap::new(),
            size: 0,
        }
    }

    /// Number of entries currently tracked (O(1)).
    pub fn size(&self) -> usize {
        self.size
    }

    /// True if no entries are tracked.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The earliest deadline still pending, or `None` if empty.
    pub fn next_timeout(&self) -> Option<Deadline> {
        self.buckets.keys().next().copied()
    }

    /// Links `handle` into the bucket for `deadline`.
    ///
    /// Returns `true` if this insertion lowered the earliest pending
    /// deadline (i.e. the caller must re-arm the timer). `deadline` must not
    /// be `Deadline::NEVER`; the facade is responsible for only calling this
    /// when an entry has a finite expiry.
    pub fn insert(&mut self, slab: &mut Slab<Entry>, handle: EntryHandle, deadline: Deadline) -> bool {
        debug_assert!(!deadline.is_never());
        let prior_min = self.next_timeout();

        let bucket = self.buckets.entry(deadline).or_default();
        let old_head = bucket.head;
        if let Some(old_head_handle) = old_head {
            if let Some(old_head_entry) = slab.get_mut(old_head_handle) {
                old_head_entry.expiry_link.prev = Some(handle);
            }
        }
        if let Some(entry) = slab.get_mut(handle) {
            entry.expiry_link.prev = None;
            entry.expiry_link.next = old_head;
        }
        bucket.head = Some(handle);
        self.size += 1;

        match prior_min {
            None => true,
            Some(min) => deadline < min,
        }
    }

    /// Unlinks `handle` from the bucket for `deadline`, if it is a member.
    /// Returns `true` if it was present.
    pub fn remove(&mut self, slab: &mut Slab<Entry>, handle: EntryHandle, deadline: Deadline) -> bool {
        let Some(bucket) = self.buckets.get_mut(&deadline) else {
            return false;
        };

        let (prev, next) = match slab.get(handle) {
            Some(entry) => (entry.expiry_link.prev, entry.expiry_link.next),
            None => return false,
        };

        match prev {
            Some(prev_handle) => {
                if let Some(prev_entry) = slab.get_mut(prev_handle) {
                    prev_entry.expiry_link.next = next;
                }
            }
            None => bucket.head = next,
        }
        if let Some(next_handle) = next {
            if let Some(next_entry) = slab.get_mut(next_handle) {
                next_entry.expiry_link.prev = prev;
            }
        }

        if self.buckets.get(&deadline).map(|b| b.head.is_none()).unwrap_or(false) {
            self.buckets.remove(&deadline);
        }

        if let Some(entry) = slab.get_mut(handle) {
            entry.expiry_link.prev = None;
            entry.expiry_link.next = None;
        }
        self.size -= 1;
        true
    }

    /// Drains every entry whose deadline is `<= now`, unlinking each from
    /// this index (but not from the primary index or the slab: the caller,
    /// `facade::Store::sweep`, hands each handle to the registered releaser,
    /// which is responsible for that).
    pub fn expire(&mut self, slab: &mut Slab<Entry>, now: Deadline) -> Vec<EntryHandle> {
        let mut drained = Vec::new();

        loop {
            let Some((&deadline, _)) = self.buckets.iter().next() else {
                break;
            };
            if deadline > now {
                break;
            }

            let bucket = self.buckets.remove(&deadline).expect("just peeked this key");
            let mut cursor = bucket.head;
            while let Some(handle) = cursor {
                let next = slab.get(handle).map(|e| e.expiry_link.next).unwrap_or(None);
                if let Some(entry) = slab.get_mut(handle) {
                    entry.expiry_link.prev = None;
                    entry.expiry_link.next = None;
                }
                drained.push(handle);
                cursor = next;
            }
        }

        self.size -= drained.len();
        drained
    }
}

impl Default for ExpiryIndex {
    fn default() -> Self {
        Self::new()
    }
}
