use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Malformed pre-state for the target revision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("account {0} has nonce at max value")]
    NonceMaxValue(Address),

    #[error("account {0} has zero-valued storage slot {1}")]
    ZeroStorageValue(Address, U256),

    #[error("account {0} has code with reserved 0xef prefix")]
    ReservedCodePrefix(Address),
}
