//! # Error Taxonomy
//!
//! Purpose: Define the small, closed set of failure modes the store core can
//! surface to callers.
//!
//! ## Design Principles
//! 1. **Closed Taxonomy**: Every variant maps to exactly one documented
//!    failure mode; callers match exhaustively instead of string-sniffing.
//! 2. **No Partial State**: Every mutating operation either fully applies or
//!    returns an error with the store unchanged (see `StoreError` docs below).
//! 3. **Programming Errors Are Errors, Not Panics**: `WrongKind` and
//!    `InvalidPredicate` are caller mistakes, but they are routed back to the
//!    command layer as values rather than aborting the process. `MissingReleaser`
//!    is the one variant that is fatal by design; see its docs.

use thiserror::Error;

/// Result alias used throughout the store core.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure modes raised by the store core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// A payload accessor was called against an entry whose discriminant
    /// does not match the requested variant.
    #[error("wrong kind: entry does not hold the requested value type")]
    WrongKind,

    /// `insert_if` was called with both `nx` and `xx` set, which is
    /// contradictory (insert-if-absent and insert-if-present at once).
    #[error("invalid predicate: nx and xx cannot both be set")]
    InvalidPredicate,

    /// The allocation collaborator could not grow to hold a new entry or a
    /// larger bucket array. Rehash failures are swallowed by the facade
    /// (the store keeps serving at the old capacity); only entry-allocation
    /// failures reach the caller, and when they do the attempted operation
    /// has had no effect.
    #[error("allocation failure: {reason}")]
    AllocationFailure {
        /// Human-readable description of what allocation step failed.
        reason: &'static str,
    },

    /// `sweep` was invoked before a releaser callback was registered.
    /// This is a setup bug, not a runtime condition: the facade requires a
    /// releaser before any sweep may run.
    #[error("sweep invoked without a registered releaser")]
    MissingReleaser,

    /// A key exceeded a caller-enforced length bound. The core itself places
    /// no bound on key length (see the data model: "arbitrary length ≥ 1"),
    /// but this variant exists for command-layer callers that choose to
    /// enforce one (mirroring the bounded-size discipline used elsewhere in
    /// this workspace's wire-level types).
    #[error("key exceeds the caller-enforced maximum length")]
    KeyTooLong,

    /// A `Bytes`/`HLL` payload exceeded a caller-enforced length bound.
    #[error("value exceeds the caller-enforced maximum length")]
    ValueTooLong,
}
