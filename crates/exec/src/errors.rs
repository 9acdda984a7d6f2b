use alloy_primitives::Address;
use thiserror::Error;

/// Reasons an applier refuses a transaction.
///
/// These are never fatal to the block, the display text is recorded verbatim
/// in the rejected list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxRejection {
    #[error("transaction type not supported")]
    TxTypeNotSupported,

    #[error("gas limit reached")]
    GasLimitReached,

    #[error("blob gas limit exceeded")]
    BlobGasLimitExceeded,

    #[error("empty blob hashes list")]
    EmptyBlobHashes,

    #[error("invalid blob hash version")]
    InvalidBlobHashVersion,

    #[error("blob transaction must not be a create transaction")]
    CreateBlobTx,

    #[error("max priority fee per gas higher than max fee per gas")]
    TipGtFeeCap,

    #[error("max fee per gas less than block base fee")]
    FeeCapLessThanBlocks,

    #[error("max blob fee per gas less than block base fee")]
    BlobFeeCapLessThanBlocks,

    #[error("sender not an eoa: {0}")]
    SenderNotEoa(Address),

    #[error("nonce has max value: {0}")]
    NonceHasMaxValue(Address),

    #[error("nonce too low")]
    NonceTooLow,

    #[error("nonce too high")]
    NonceTooHigh,

    #[error("max initcode size exceeded")]
    InitCodeSizeLimitExceeded,

    #[error("intrinsic gas too low")]
    IntrinsicGasTooLow,

    #[error("insufficient funds for gas * price + value")]
    InsufficientFunds,

    /// Reason from an applier this crate doesn't know about.
    #[error("{0}")]
    Other(String),
}

/// Block reward or withdrawal processing failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalizeError {
    #[error("block reward {0} not divisible by 32")]
    RewardNotDivisible(u64),

    #[error("ommer delta {0} out of range 1..=7")]
    InvalidOmmerDelta(u64),

    #[error("balance overflow crediting {0}")]
    BalanceOverflow(Address),
}

/// Block-level system call could not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemCallError {
    #[error("missing hash of block {0}")]
    MissingBlockHash(u64),
}
