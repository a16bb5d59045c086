//! # Entry and Tagged Value
//!
//! Purpose: Hold exactly one typed value alongside the key, expiry, and the
//! two index-linkage slots the primary and expiration indices use to chain
//! entries without either index owning the entry.
//!
//! ## Design Principles
//! 1. **Discriminant-Checked Access**: `kind` is fixed at construction; every
//!    payload accessor checks it first and fails with `WrongKind` rather than
//!    exposing the wrong variant.
//! 2. **Two Linkage Slots, Two Owners**: `primary_link` is read and written
//!    only by `primary_index`; `expiry_link` only by `expiry_index`. Neither
//!    index may reach into the other's slot.
//! 3. **No Structural Mutation From Outside**: the facade never exposes a
//!    mutable `Entry` handle that lets a caller change `key_hash` or `kind`
//!    after construction; only `payload` and `expiry` mutate in place.

use kv_common::{Deadline, StoreError, StoreResult};
use kv_containers::{Blob, HashDict, HashSetContainer, OrderedSortedSet, VecList};

use crate::alloc::EntryHandle;

/// Discriminant selecting which `Payload` variant is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Int64,
    Bytes,
    List,
    Hash,
    Set,
    SortedSet,
    Hll,
}

/// The tagged value a store entry owns. The active variant always matches
/// the entry's `kind`; the others are never observable.
#[derive(Debug)]
pub enum Payload {
    Float(f64),
    Int64(i64),
    Bytes(Blob),
    List(VecList),
    Hash(HashDict),
    Set(HashSetContainer),
    SortedSet(OrderedSortedSet),
    Hll(Blob),
}

impl Payload {
    fn kind(&self) -> ValueKind {
        match self {
            Payload::Float(_) => ValueKind::Float,
            Payload::Int64(_) => ValueKind::Int64,
            Payload::Bytes(_) => ValueKind::Bytes,
            Payload::List(_) => ValueKind::List,
            Payload::Hash(_) => ValueKind::Hash,
            Payload::Set(_) => ValueKind::Set,
            Payload::SortedSet(_) => ValueKind::SortedSet,
            Payload::Hll(_) => ValueKind::Hll,
        }
    }
}

/// Next-in-bucket-chain link used exclusively by `primary_index`.
pub(crate) type PrimaryLink = Option<EntryHandle>;

/// Intrusive links within one expiration-deadline bucket, used exclusively
/// by `expiry_index`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ExpiryLink {
    pub prev: Option<EntryHandle>,
    pub next: Option<EntryHandle>,
}

/// A single keyed record owned by the store.
#[derive(Debug)]
pub struct Entry {
    key: Vec<u8>,
    key_hash: u64,
    payload: Payload,
    expiry: Deadline,
    pub(crate) primary_link: PrimaryLink,
    pub(crate) expiry_link: ExpiryLink,
}

macro_rules! accessor {
    ($as_ref:ident, $as_mut:ident, $variant:ident, $ty:ty) => {
        /// Borrows the payload as
        #[doc = stringify!($variant)]
        /// , failing with `WrongKind` if the entry holds a different kind.
        pub fn $as_ref(&self) -> StoreResult<&$ty> {
            match &self.payload {
                Payload::$variant(value) => Ok(value),
                _ => Err(StoreError::WrongKind),
            }
        }

        /// Mutably borrows the payload as
        #[doc = stringify!($variant)]
        /// , failing with `WrongKind` if the entry holds a different kind.
        pub fn $as_mut(&mut self) -> StoreResult<&mut $ty> {
            match &mut self.payload {
                Payload::$variant(value) => Ok(value),
                _ => Err(StoreError::WrongKind),
            }
        }
    };
}

impl Entry {
    fn new(key: Vec<u8>, key_hash: u64, payload: Payload) -> Self {
        Entry {
            key,
            key_hash,
            payload,
            expiry: Deadline::NEVER,
            primary_link: None,
            expiry_link: ExpiryLink::default(),
        }
    }

    /// Creates a new `Int64` entry.
    pub fn new_int64(key: Vec<u8>, key_hash: u64, value: i64) -> Self {
        Entry::new(key, key_hash, Payload::Int64(value))
    }

    /// Creates a new `Float` entry.
    pub fn new_float(key: Vec<u8>, key_hash: u64, value: f64) -> Self {
        Entry::new(key, key_hash, Payload::Float(value))
    }

    /// Creates a new `Bytes` entry from existing bytes.
    pub fn new_bytes(key: Vec<u8>, key_hash: u64, data: Vec<u8>) -> Self {
        Entry::new(key, key_hash, Payload::Bytes(Blob::new(data)))
    }

    /// Creates a new `Bytes` entry, zero-filled to `len`.
    pub fn new_bytes_zeroed(key: Vec<u8>, key_hash: u64, len: usize) -> Self {
        Entry::new(key, key_hash, Payload::Bytes(Blob::new_zeroed(len)))
    }

    /// Creates a new, empty `List` entry.
    pub fn new_list(key: Vec<u8>, key_hash: u64) -> Self {
        Entry::new(key, key_hash, Payload::List(VecList::default()))
    }

    /// Creates a new, empty `Hash` entry.
    pub fn new_hash(key: Vec<u8>, key_hash: u64) -> Self {
        Entry::new(key, key_hash, Payload::Hash(HashDict::default()))
    }

    /// Creates a new, empty `Set` entry.
    pub fn new_set(key: Vec<u8>, key_hash: u64) -> Self {
        Entry::new(key, key_hash, Payload::Set(HashSetContainer::default()))
    }

    /// Creates a new, empty `SortedSet` entry.
    pub fn new_sorted_set(key: Vec<u8>, key_hash: u64) -> Self {
        Entry::new(key, key_hash, Payload::SortedSet(OrderedSortedSet::default()))
    }

    /// Creates a new `HLL` entry: a fixed-length, zero-filled register buffer.
    pub fn new_hll(key: Vec<u8>, key_hash: u64, hll_bytes_size: usize) -> Self {
        Entry::new(
            key,
            key_hash,
            Payload::Hll(Blob::new_zeroed(hll_bytes_size)),
        )
    }

    /// The entry's key bytes.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The entry's precomputed fingerprint. Immutable for the entry's
    /// lifetime.
    pub fn key_hash(&self) -> u64 {
        self.key_hash
    }

    /// The entry's discriminant. Immutable for the entry's lifetime.
    pub fn kind(&self) -> ValueKind {
        self.payload.kind()
    }

    /// The entry's current expiration deadline, or `Deadline::NEVER`.
    pub fn expiry(&self) -> Deadline {
        self.expiry
    }

    pub(crate) fn set_expiry(&mut self, expiry: Deadline) {
        self.expiry = expiry;
    }

    accessor!(as_int64, as_int64_mut, Int64, i64);
    accessor!(as_float, as_float_mut, Float, f64);
    accessor!(as_bytes, as_bytes_mut, Bytes, Blob);
    accessor!(as_list, as_list_mut, List, VecList);
    accessor!(as_hash, as_hash_mut, Hash, HashDict);
    accessor!(as_set, as_set_mut, Set, HashSetContainer);
    accessor!(as_sorted_set, as_sorted_set_mut, SortedSet, OrderedSortedSet);
    accessor!(as_hll, as_hll_mut, Hll, Blob);

    /// Increments an `Int64` payload by `delta`, wrapping on overflow.
    pub fn increment_int64(&mut self, delta: i64) -> StoreResult<i64> {
        let value = self.as_int64_mut()?;
        *value = value.wrapping_add(delta);
        Ok(*value)
    }

    /// Increments a `Float` payload by `delta`, using IEEE-754 arithmetic.
    pub fn increment_float(&mut self, delta: f64) -> StoreResult<f64> {
        let value = self.as_float_mut()?;
        *value += delta;
        Ok(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int64_increment_wraps_on_overflow() {
        let mut entry = Entry::new_int64(b"k".to_vec(), 1, i64::MAX);
        let value = entry.increment_int64(1).unwrap();
        assert_eq!(value, i64::MIN);
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let entry = Entry::new_list(b"k".to_vec(), 1);
        assert_eq!(entry.as_int64(), Err(StoreError::WrongKind));
    }

    #[test]
    fn new_entries_never_expire_by_default() {
        let entry = Entry::new_int64(b"k".to_vec(), 1, 0);
        assert!(entry.expiry().is_never());
    }

    #[test]
    fn hll_enforces_fixed_length() {
        let entry = Entry::new_hll(b"k".to_vec(), 1, 12_288);
        assert_eq!(entry.as_hll().unwrap().len(), 12_288);
    }
}
