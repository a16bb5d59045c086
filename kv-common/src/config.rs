//! # Store Configuration
//!
//! Purpose: Group the store's tunables into a plain struct with a documented
//! default, following this workspace's existing `ClientConfig`/`PoolConfig`
//! pattern for grouping knobs instead of scattering bare constants.

/// Initial primary-index bucket count. Must be a power of two.
pub const DEFAULT_INITIAL_SIZE: usize = 1 << 20;

/// Load factor threshold that triggers a synchronous rehash.
pub const LOAD_FACTOR: f64 = 0.75;

/// Register count of the dense HyperLogLog representation this store uses
/// for `Hll` payloads.
pub const HLL_REGISTERS: usize = 16_384;

/// Bits per HyperLogLog register in the dense representation.
pub const HLL_BITS_PER_REGISTER: usize = 6;

/// Fixed byte length of an `Hll` payload: `HLL_REGISTERS * HLL_BITS_PER_REGISTER / 8`.
pub const HLL_BYTES_SIZE: usize = HLL_REGISTERS * HLL_BITS_PER_REGISTER / 8;

/// Store tunables, grouped so construction sites read as configuration
/// rather than a scattering of magic numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreConfig {
    /// Initial primary-index bucket count (must be a power of two).
    pub initial_buckets: usize,
    /// Load factor threshold; rehash triggers when `len >= load_factor * buckets`.
    pub load_factor: f64,
}

impl StoreConfig {
    /// Builds a config, rounding `initial_buckets` up to a power of two.
    pub fn new(initial_buckets: usize, load_factor: f64) -> Self {
        StoreConfig {
            initial_buckets: initial_buckets.max(1).next_power_of_two(),
            load_factor,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            initial_buckets: DEFAULT_INITIAL_SIZE,
            load_factor: LOAD_FACTOR,
        }
    }
}
