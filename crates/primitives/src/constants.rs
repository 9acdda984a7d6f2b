//! Constants for magic numbers used across the transition crates.

/// Blob gas consumed by a single blob.
pub const GAS_PER_BLOB: u64 = 1 << 17;

/// Ceiling on the blob gas a single block may consume.
pub const MAX_BLOB_GAS_PER_BLOCK: u64 = 6 * GAS_PER_BLOB;

/// Transaction type byte for EIP-2930 access list transactions.
pub const ACCESS_LIST_TX_TYPE: u8 = 0x01;

/// Transaction type byte for EIP-1559 dynamic fee transactions.
pub const DYNAMIC_FEE_TX_TYPE: u8 = 0x02;

/// Transaction type byte for EIP-4844 blob transactions.
pub const BLOB_TX_TYPE: u8 = 0x03;
