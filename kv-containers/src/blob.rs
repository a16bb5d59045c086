//! # Blob Container
//!
//! Purpose: Back the `Bytes` and `HLL` payload kinds: an owned, growable
//! byte buffer. `HLL` payloads additionally enforce a fixed length at
//! construction (see `Blob::new_fixed`).

use kv_common::{StoreError, StoreResult};

/// Owned byte buffer backing `Bytes` and `HLL` payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob(Vec<u8>);

impl Blob {
    /// Creates a blob from existing bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Blob(data)
    }

    /// Creates a zero-filled blob of exactly `len` bytes.
    pub fn new_zeroed(len: usize) -> Self {
        Blob(vec![0u8; len])
    }

    /// Creates a zero-filled blob whose length must equal `expected_len`.
    /// Used for `HLL` payloads, whose register layout fixes their size.
    pub fn new_fixed(expected_len: usize, data: Vec<u8>) -> StoreResult<Self> {
        if data.len() != expected_len {
            return Err(StoreError::ValueTooLong);
        }
        Ok(Blob(data))
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the blob holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the blob's contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Mutably borrows the blob's contents.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Replaces the blob's contents wholesale.
    pub fn set(&mut self, data: Vec<u8>) {
        self.0 = data;
    }

    /// Appends `data` to the end of the blob.
    pub fn append(&mut self, data: &[u8]) {
        self.0.extend_from_slice(data);
    }
}
