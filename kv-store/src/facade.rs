//! # Store Facade
//!
//! Purpose: Expose the public operations: lookup, conditional insert,
//! replace, erase, expire, flush, size accounting, and own the rehash and
//! expiry-sweep policies. This is the one type external collaborators (the
//! demo binary, the benchmark harness, and in a full serving engine the
//! command-dispatch layer) are meant to hold.
//!
//! ## Design Principles
//! 1. **Single-Threaded, Cooperative**: Every method here runs to completion
//!    with no internal suspension point; nothing here spawns a thread or
//!    holds a lock. Mutual exclusion between operations is the caller's
//!    responsibility (the scheduler pins one store to one execution context).
//! 2. **No Partial State**: Mutating operations either fully apply or leave
//!    the store exactly as it was; `insert_if`'s predicate check happens
//!    before any mutation.
//! 3. **Take-Call-Putback for Re-Entrancy**: `sweep` takes the registered
//!    releaser out of `self` before invoking it, so the releaser's callback
//!    may itself call back into any `Store` method (including `erase`)
//!    without the borrow checker or a runtime lock getting in the way, then
//!    puts it back once every due entry has been released.

use tracing::{debug, error, warn};

use kv_common::{Clock, Deadline, KeyHasher, StoreConfig, StoreError, StoreResult, SystemClock};

use crate::alloc::{EntryHandle, Slab};
use crate::entry::Entry;
use crate::expiry_index::ExpiryIndex;
use crate::primary_index::PrimaryIndex;
use crate::timer::{Timer, TrackingTimer};

/// Callback invoked once per entry drained by `sweep`. Registered exactly
/// once via `register_releaser`; responsible for unlinking the entry from
/// the primary index and destroying it (see `Store::release`).
type Releaser<C, T> = Box<dyn FnMut(&mut Store<C, T>, EntryHandle)>;

/// The keyed value store core.
///
/// Generic over its clock and timer collaborators so tests can substitute a
/// deterministic clock/timer pair; production code uses the defaults
/// (`SystemClock`, `TrackingTimer`) via [`Store::new`].
pub struct Store<C: Clock = SystemClock, T: Timer = TrackingTimer> {
    slab: Slab<Entry>,
    primary: PrimaryIndex,
    expiry: ExpiryIndex,
    hasher: KeyHasher,
    clock: C,
    timer: T,
    config: StoreConfig,
    releaser: Option<Releaser<C, T>>,
}

impl Store<SystemClock, TrackingTimer> {
    /// Creates a store with the default `SystemClock`/`TrackingTimer` pair.
    pub fn new(config: StoreConfig) -> Self {
        Store::with_collaborators(config, SystemClock::new(), TrackingTimer::new())
    }
}

impl Default for Store<SystemClock, TrackingTimer> {
    fn default() -> Self {
        Store::new(StoreConfig::default())
    }
}

impl<C: Clock, T: Timer> Store<C, T> {
    /// Creates a store with explicit clock and timer collaborators.
    pub fn with_collaborators(config: StoreConfig, clock: C, timer: T) -> Self {
        Store {
            slab: Slab::new(),
            primary: PrimaryIndex::new(config.initial_buckets, config.load_factor),
            expiry: ExpiryIndex::new(),
            hasher: KeyHasher::new(),
            clock,
            timer,
            config,
            releaser: None,
        }
    }

    /// Registers the expired-entry releaser. A later call replaces any
    /// previously registered releaser. `sweep` fails with
    /// `StoreError::MissingReleaser` until one is registered.
    pub fn register_releaser(&mut self, releaser: impl FnMut(&mut Self, EntryHandle) + 'static) {
        self.releaser = Some(Box::new(releaser));
    }

    /// Computes the fingerprint `key` would use for a lookup or insertion.
    pub fn fingerprint(&self, key: &[u8]) -> u64 {
        self.hasher.fingerprint(key)
    }

    /// True if an entry with this key is present.
    pub fn exists(&self, key: &[u8]) -> bool {
        let key_hash = self.hasher.fingerprint(key);
        self.primary.lookup(&self.slab, key, key_hash).is_some()
    }

    /// Invokes `f` with the matching entry, or `None` if absent. Never
    /// fails: absence is not an error.
    pub fn get<R>(&self, key: &[u8], f: impl FnOnce(Option<&Entry>) -> R) -> R {
        let key_hash = self.hasher.fingerprint(key);
        let handle = self.primary.lookup(&self.slab, key, key_hash);
        f(handle.and_then(|h| self.slab.get(h)))
    }

    /// Mutable counterpart of `get`, for value-type-specific mutation
    /// (container pushes, numeric increments) routed through the entry's
    /// payload accessors.
    pub fn get_mut<R>(&mut self, key: &[u8], f: impl FnOnce(Option<&mut Entry>) -> R) -> R {
        let key_hash = self.hasher.fingerprint(key);
        let handle = self.primary.lookup(&self.slab, key, key_hash);
        f(handle.and_then(move |h| self.slab.get_mut(h)))
    }

    /// Removes the entry matching `key`, if present. Also removes it from
    /// the expiration index if it was a member.
    pub fn erase(&mut self, key: &[u8]) -> bool {
        let key_hash = self.hasher.fingerprint(key);
        match self.primary.remove(&mut self.slab, key, key_hash) {
            Some(handle) => {
                self.destroy_entry(handle);
                true
            }
            None => false,
        }
    }

    /// `insert_if` predicate state machine (see the facade's predicate
    /// semantics). Returns whether an insertion actually happened.
    pub fn insert_if(&mut self, entry: Entry, ttl_ms: u64, nx: bool, xx: bool) -> StoreResult<bool> {
        if nx && xx {
            return Err(StoreError::InvalidPredicate);
        }

        let key = entry.key().to_vec();
        let key_hash = entry.key_hash();
        let present = self.primary.lookup(&self.slab, &key, key_hash).is_some();

        let should_insert = if nx {
            !present
        } else if xx {
            present
        } else {
            true
        };
        if !should_insert {
            return Ok(false);
        }

        if present {
            if let Some(old) = self.primary.remove(&mut self.slab, &key, key_hash) {
                self.destroy_entry(old);
            }
        }

        self.insert_entry(entry, ttl_ms)?;
        self.maybe_rehash();
        Ok(true)
    }

    /// Single-argument `replace`: unconditionally installs `entry`, removing
    /// any prior entry under the same key first. Returns `true` if the key
    /// was previously absent, `false` if a prior entry was overwritten.
    pub fn replace(&mut self, entry: Entry) -> StoreResult<bool> {
        let key = entry.key().to_vec();
        let key_hash = entry.key_hash();
        let was_absent = match self.primary.remove(&mut self.slab, &key, key_hash) {
            Some(old) => {
                self.destroy_entry(old);
                false
            }
            None => true,
        };

        self.insert_entry(entry, 0)?;
        self.maybe_rehash();
        Ok(was_absent)
    }

    /// Two-argument `replace`: equivalent to
    /// `insert_if(entry, ttl_ms, nx=false, xx=false)`. Unlike the
    /// single-argument form, this always returns `true` on success.
    pub fn replace_with_ttl(&mut self, entry: Entry, ttl_ms: u64) -> StoreResult<bool> {
        self.insert_if(entry, ttl_ms, false, false)
    }

    /// Sets (or refreshes) `key`'s expiration to `now() + ttl_ms`. A
    /// `ttl_ms` of zero is equivalent to `persist`. Returns `false` if `key`
    /// is absent.
    pub fn expire(&mut self, key: &[u8], ttl_ms: u64) -> StoreResult<bool> {
        let key_hash = self.hasher.fingerprint(key);
        let handle = match self.primary.lookup(&self.slab, key, key_hash) {
            Some(handle) => handle,
            None => return Ok(false),
        };

        if ttl_ms == 0 {
            return Ok(self.persist(key));
        }

        let deadline = Deadline::from_ttl_ms(self.clock.now_ms(), ttl_ms);
        let old_expiry = self.slab.get(handle).expect("handle from lookup is live").expiry();
        if !old_expiry.is_never() {
            self.expiry.remove(&mut self.slab, handle, old_expiry);
        }
        self.slab
            .get_mut(handle)
            .expect("handle from lookup is live")
            .set_expiry(deadline);
        self.expiry.insert(&mut self.slab, handle, deadline);
        self.rearm_or_disarm();
        Ok(true)
    }

    /// Clears `key`'s expiration, if any, removing it from the expiration
    /// index. Returns `false` if `key` is absent or already persistent.
    pub fn persist(&mut self, key: &[u8]) -> bool {
        let key_hash = self.hasher.fingerprint(key);
        let handle = match self.primary.lookup(&self.slab, key, key_hash) {
            Some(handle) => handle,
            None => return false,
        };

        let expiry = self.slab.get(handle).expect("handle from lookup is live").expiry();
        if expiry.is_never() {
            return false;
        }

        self.expiry.remove(&mut self.slab, handle, expiry);
        self.slab
            .get_mut(handle)
            .expect("handle from lookup is live")
            .set_expiry(Deadline::NEVER);
        self.rearm_or_disarm();
        true
    }

    /// Empties both indices, releasing every entry and disarming the timer.
    pub fn flush_all(&mut self) {
        self.slab = Slab::new();
        self.primary = PrimaryIndex::new(self.config.initial_buckets, self.config.load_factor);
        self.expiry = ExpiryIndex::new();
        self.timer.disarm();
        debug!("store flushed");
    }

    /// Number of live entries.
    pub fn size(&self) -> usize {
        self.primary.len()
    }

    /// True if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    /// Number of entries with a finite expiration.
    pub fn expiring_size(&self) -> usize {
        self.expiry.size()
    }

    /// The deadline the timer is currently armed at, if any.
    pub fn next_timeout(&self) -> Option<Deadline> {
        self.timer.current_deadline()
    }

    /// Drains every entry due by `now()`, invoking the registered releaser
    /// once per entry, then re-arms (or disarms) the timer. Fails with
    /// `MissingReleaser` if none is registered. Returns the number of
    /// entries released.
    pub fn sweep(&mut self) -> StoreResult<usize> {
        if self.releaser.is_none() {
            error!("sweep invoked without a registered releaser");
            return Err(StoreError::MissingReleaser);
        }

        let now = self.clock.now();
        let due = self.expiry.expire(&mut self.slab, now);
        let count = due.len();

        if count > 0 {
            let mut releaser = self.releaser.take().expect("checked for Some above");
            for handle in due {
                releaser(self, handle);
            }
            self.releaser = Some(releaser);
        }

        self.rearm_or_disarm();
        debug!(released = count, "sweep completed");
        Ok(count)
    }

    /// Returns a copy of `handle`'s key, if it still refers to a live entry.
    /// Meant for a releaser that needs to report what was released (e.g. a
    /// keyspace-notification event) before calling `release`.
    pub fn entry_key(&self, handle: EntryHandle) -> Option<Vec<u8>> {
        self.slab.get(handle).map(|entry| entry.key().to_vec())
    }

    /// Unlinks `handle` from the primary index and frees it from the
    /// allocator. Intended to be called by a releaser callback during
    /// `sweep`, where the handle has already been removed from the
    /// expiration index by `expire`.
    pub fn release(&mut self, handle: EntryHandle) {
        if let Some(entry) = self.slab.get(handle) {
            let key = entry.key().to_vec();
            let key_hash = entry.key_hash();
            self.primary.remove(&mut self.slab, &key, key_hash);
        }
        self.slab.remove(handle);
    }

    fn insert_entry(&mut self, mut entry: Entry, ttl_ms: u64) -> StoreResult<EntryHandle> {
        if ttl_ms > 0 {
            let deadline = Deadline::from_ttl_ms(self.clock.now_ms(), ttl_ms);
            entry.set_expiry(deadline);
        }

        let handle = self.slab.insert(entry).map_err(|err| {
            warn!(%err, "entry allocation failed");
            err
        })?;
        self.primary.insert(&mut self.slab, handle);

        if ttl_ms > 0 {
            let deadline = self.slab.get(handle).expect("just inserted").expiry();
            if self.expiry.insert(&mut self.slab, handle, deadline) {
                self.timer.rearm(deadline);
            }
        }

        Ok(handle)
    }

    /// Unlinks `handle` from the expiration index (if a member) and frees it
    /// from the allocator. Used when a prior entry is displaced by
    /// `replace`/`insert_if`/`erase`, where `handle` has already been
    /// unlinked from the primary index by the caller.
    fn destroy_entry(&mut self, handle: EntryHandle) {
        if let Some(entry) = self.slab.get(handle) {
            let expiry = entry.expiry();
            if !expiry.is_never() {
                self.expiry.remove(&mut self.slab, handle, expiry);
            }
        }
        self.slab.remove(handle);
    }

    fn rearm_or_disarm(&mut self) {
        match self.expiry.next_timeout() {
            Some(deadline) => self.timer.rearm(deadline),
            None => self.timer.disarm(),
        }
    }

    fn maybe_rehash(&mut self) {
        if !self.primary.needs_rehash() {
            return;
        }
        match self.primary.rehash(&mut self.slab) {
            Ok(()) => debug!(buckets = self.primary.bucket_count(), "primary index rehashed"),
            Err(err) => warn!(%err, "rehash failed, continuing at old bucket count"),
        }
    }
}
