use std::{io, path::PathBuf};

use alloy_primitives::B256;
use t8n_exec::{FinalizeError, SystemCallError};
use t8n_primitives::errors::TxError;
use thiserror::Error;

/// Faults that abort the whole block transition.
///
/// Once one of these is returned after state mutation has started, none of
/// the outputs can be trusted.
#[derive(Debug, Error)]
pub enum TsnError {
    #[error("transaction hash mismatched: computed {computed}, expected {expected} (index {index})")]
    TxHashMismatch {
        index: usize,
        computed: B256,
        expected: B256,
    },

    #[error("encode tx {index}: {source}")]
    TxEncoding {
        index: usize,
        #[source]
        source: TxError,
    },

    #[error("system call: {0}")]
    SystemCall(#[from] SystemCallError),

    #[error("finalize: {0}")]
    Finalize(#[from] FinalizeError),

    /// The applier accepted a transaction that didn't fit the block.
    #[error("applier overran block budget at tx {index} (gas {gas}, blob gas {blob_gas})")]
    BudgetOverrun { index: usize, gas: u64, blob_gas: u64 },

    #[error("open trace file {0:?}: {1}")]
    Trace(PathBuf, #[source] io::Error),
}
