//! Receipts, logs and rejection records.

use alloy_consensus::{Eip658Value, ReceiptEnvelope, ReceiptWithBloom};
use alloy_primitives::{Address, Bloom, Bytes, B256};
use alloy_rlp::RlpEncodable;
use serde::Serialize;

use crate::tx::TxType;

/// A log emitted during transaction execution.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpEncodable, Serialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl Log {
    fn to_consensus(&self) -> alloy_primitives::Log {
        alloy_primitives::Log::new_unchecked(self.address, self.topics.clone(), self.data.clone())
    }
}

/// Receipt of an accepted transaction.
///
/// The applier fills everything but `cumulative_gas_used` and `post_state`,
/// which only the driver knows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Receipt {
    pub kind: TxType,
    pub success: bool,
    pub gas_used: u64,
    pub cumulative_gas_used: u64,
    pub logs: Vec<Log>,
    pub logs_bloom: Bloom,

    /// Intermediate state root, only for revisions before status receipts.
    pub post_state: Option<B256>,
}

impl Receipt {
    /// Creates a receipt for `gas_used` with the bloom computed from `logs`.
    pub fn new(kind: TxType, success: bool, gas_used: u64, logs: Vec<Log>) -> Self {
        let logs_bloom = logs_bloom(&logs);
        Self {
            kind,
            success,
            gas_used,
            cumulative_gas_used: 0,
            logs,
            logs_bloom,
            post_state: None,
        }
    }

    /// The receipt as the receipts root commits to it.  The status field
    /// carries the intermediate state root when there is one.
    pub fn envelope(&self) -> ReceiptEnvelope {
        let status = match self.post_state {
            Some(root) => Eip658Value::PostState(root),
            None => Eip658Value::Eip658(self.success),
        };
        let receipt = ReceiptWithBloom {
            receipt: alloy_consensus::Receipt {
                status,
                cumulative_gas_used: self.cumulative_gas_used.into(),
                logs: self.logs.iter().map(Log::to_consensus).collect(),
            },
            logs_bloom: self.logs_bloom,
        };
        match self.kind {
            TxType::Legacy => ReceiptEnvelope::Legacy(receipt),
            TxType::AccessList => ReceiptEnvelope::Eip2930(receipt),
            TxType::DynamicFee => ReceiptEnvelope::Eip1559(receipt),
            TxType::Blob => ReceiptEnvelope::Eip4844(receipt),
        }
    }
}

/// A transaction the applier refused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedTx {
    pub hash: B256,

    /// Position in the original input list.
    pub index: usize,

    /// Human-readable reason.
    #[serde(rename = "error")]
    pub reason: String,
}

/// Computes the bloom filter over a set of logs.
pub fn logs_bloom<'a>(logs: impl IntoIterator<Item = &'a Log>) -> Bloom {
    let mut bloom = Bloom::ZERO;
    for log in logs {
        bloom.accrue_raw_log(log.address, &log.topics);
    }
    bloom
}

/// Combines per-receipt blooms into the block bloom.
pub fn receipts_bloom<'a>(receipts: impl IntoIterator<Item = &'a Receipt>) -> Bloom {
    let mut bloom = Bloom::ZERO;
    for receipt in receipts {
        bloom.accrue_bloom(&receipt.logs_bloom);
    }
    bloom
}
