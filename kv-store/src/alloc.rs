//! # Entry Allocator (Slab Arena)
//!
//! Purpose: Provide stable handles for entries so the primary index and the
//! expiration index can both reference one entity without either owning it
//! twice.
//!
//! ## Design Principles
//! 1. **Generational Handles**: Every slot carries a generation counter so a
//!    handle to a freed-and-reused slot is detected rather than silently
//!    aliasing an unrelated entry.
//! 2. **Fallible Growth**: Growing the slab's backing storage goes through
//!    `Vec::try_reserve`, so an allocation failure surfaces as
//!    `StoreError::AllocationFailure` and leaves the slab untouched, rather
//!    than aborting the process the way an infallible `Vec::push` would on
//!    overcommit failure.
//! 3. **Free-List Recycling**: Removed slots are pushed onto a free list and
//!    reused by later inserts, keeping the slab dense under churn.

use kv_common::{StoreError, StoreResult};

/// Stable handle to an entry stored in a `Slab`. Cheap to copy, compare, and
/// hash; carries a generation so a stale handle (pointing at a slot that has
/// since been freed and reused) is detected instead of aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    index: u32,
    generation: u32,
}

enum Slot<T> {
    Occupied { value: T, generation: u32 },
    Vacant { next_free: Option<u32>, generation: u32 },
}

/// Generational arena used as the store's entry allocator.
pub struct Slab<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Slab<T> {
    /// Creates an empty slab.
    pub fn new() -> Self {
        Slab {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the slab holds no occupied slots.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `value`, allocating a new slot if the free list is empty.
    ///
    /// Returns `AllocationFailure` (and leaves the slab unchanged) only when
    /// growing the backing `Vec` fails; reusing a free-list slot never fails.
    pub fn insert(&mut self, value: T) -> StoreResult<EntryHandle> {
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            let generation = match slot {
                Slot::Vacant { generation, .. } => *generation,
                Slot::Occupied { .. } => unreachable!("free list points at occupied slot"),
            };
            let next_free = match slot {
                Slot::Vacant { next_free, .. } => *next_free,
                Slot::Occupied { .. } => unreachable!(),
            };
            self.free_head = next_free;
            *slot = Slot::Occupied { value, generation };
            self.len += 1;
            return Ok(EntryHandle { index, generation });
        }

        self.slots.try_reserve(1).map_err(|_| StoreError::AllocationFailure {
            reason: "failed to grow entry slab",
        })?;
        let index = self.slots.len() as u32;
        self.slots.push(Slot::Occupied { value, generation: 0 });
        self.len += 1;
        Ok(EntryHandle { index, generation: 0 })
    }

    /// Removes and returns the value at `handle`, if the handle is current.
    pub fn remove(&mut self, handle: EntryHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == handle.generation => {
                let next_generation = generation.wrapping_add(1);
                let prior_free = self.free_head;
                let Slot::Occupied { value, .. } = std::mem::replace(
                    slot,
                    Slot::Vacant {
                        next_free: prior_free,
                        generation: next_generation,
                    },
                ) else {
                    unreachable!()
                };
                self.free_head = Some(handle.index);
                self.len -= 1;
                Some(value)
            }
            _ => None,
        }
    }

    /// Borrows the value at `handle`, if the handle is current.
    pub fn get(&self, handle: EntryHandle) -> Option<&T> {
        match self.slots.get(handle.index as usize) {
            Some(Slot::Occupied { value, generation }) if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Mutably borrows the value at `handle`, if the handle is current.
    pub fn get_mut(&mut self, handle: EntryHandle) -> Option<&mut T> {
        match self.slots.get_mut(handle.index as usize) {
            Some(Slot::Occupied { value, generation }) if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// True if `handle` still refers to an occupied slot.
    pub fn contains(&self, handle: EntryHandle) -> bool {
        self.get(handle).is_some()
    }
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}
