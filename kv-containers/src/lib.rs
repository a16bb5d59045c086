//! # Value Containers
//!
//! Purpose: Provide the container collaborators the store core's `List`,
//! `Hash`, `Set`, `SortedSet`, and `Bytes`/`HLL` payload kinds are built on.
//!
//! ## Design Principles
//! 1. **Capability Contracts, Not a Fixed Implementation**: Each container is
//!    specified as a trait (construct-empty, size, and the mutation
//!    primitives the store requires); the store's `Entry`/`Payload` types are
//!    written against these traits. This crate ships exactly one baseline
//!    implementation per contract so the core is concretely usable end to
//!    end, without pretending a richer backend (e.g. a skip list or a
//!    log-structured arena) isn't a valid substitute.
//! 2. **Byte Strings Everywhere**: Members, fields, and elements are raw
//!    byte strings; no UTF-8 assumption is made anywhere in this crate.
//! 3. **No Enumeration Surface of Its Own**: These containers expose the
//!    primitives the command layer needs; iteration order for `Dict`/`Set` is
//!    unspecified, matching a plain hash-based backend.

pub mod blob;
pub mod dict;
pub mod list;
pub mod set;
pub mod sorted_set;

pub use blob::Blob;
pub use dict::{Dict, HashDict};
pub use list::{List, VecList};
pub use set::{HashSetContainer, Set};
pub use sorted_set::{OrderedSortedSet, SortedSet};
