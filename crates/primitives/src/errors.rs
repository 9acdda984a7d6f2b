//! Errors during parsing/handling/conversion of primitives.

use alloy_primitives::U256;
use thiserror::Error;

use crate::tx::TxType;

/// Errors resolving a protocol revision token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevisionError {
    #[error("unknown revision: {0}")]
    Unknown(String),
}

/// A transaction that has no canonical envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("{field} {value} does not fit in 128 bits")]
    FeeTooLarge { field: &'static str, value: U256 },

    #[error("signature v {v} invalid for {kind:?} transaction")]
    InvalidV { v: U256, kind: TxType },

    #[error("blob transaction without recipient")]
    BlobCreate,
}
