// kv-store - The in-memory keyed value store core.
//
// Five cooperating pieces, leaves first: the generational entry allocator
// (`alloc`), the tagged-value entry type (`entry`), the chained primary hash
// index (`primary_index`), the timer-bucketed expiration index
// (`expiry_index`), and the single-threaded facade (`facade`) that ties them
// together and owns the rehash/sweep policies.

pub mod alloc;
pub mod entry;
pub mod expiry_index;
pub mod facade;
pub mod primary_index;
pub mod timer;

pub use alloc::{EntryHandle, Slab};
pub use entry::{Entry, Payload, ValueKind};
pub use expiry_index::ExpiryIndex;
pub use facade::Store;
pub use primary_index::PrimaryIndex;
pub use timer::{Timer, TrackingTimer};
