//! Block-closing aggregation into the result record.

use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, Bloom, Bytes, B256, U256};
use alloy_rlp::Encodable;
use serde::Serialize;
use sha2::{Digest, Sha256};
use t8n_mpt::{keccak, ordered_root};
use t8n_primitives::{
    constants::MAX_BLOB_GAS_PER_BLOCK,
    prelude::*,
    receipt::receipts_bloom,
};
use t8n_state::WorldState;

use crate::transition::{AcceptedTx, BlockExecution};

/// Request categories committed to by the requests hash, in commitment order.
const REQUEST_TYPES: [u8; 3] = [
    0x00, // withdrawal requests
    0x01, // deposit requests
    0x02, // consolidation requests
];

/// Receipt as reported in the result record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRecord {
    pub transaction_hash: B256,
    #[serde(with = "alloy_serde::quantity")]
    pub gas_used: u64,
    #[serde(with = "alloy_serde::quantity")]
    pub cumulative_gas_used: u64,
    pub block_hash: B256,
    pub contract_address: Address,
    pub logs_bloom: Bloom,
    pub logs: Vec<Log>,

    /// Intermediate state root before status receipts, empty otherwise.
    pub root: String,
    #[serde(with = "alloy_serde::quantity")]
    pub status: u64,

    /// Index in the input list, rejected transactions included.
    #[serde(with = "alloy_serde::quantity")]
    pub transaction_index: u64,
}

impl ReceiptRecord {
    fn new(accepted: &AcceptedTx) -> Self {
        let AcceptedTx {
            index,
            hash,
            tx,
            receipt,
            ..
        } = accepted;

        let contract_address = if tx.is_create() {
            tx.sender.create(tx.nonce)
        } else {
            Address::ZERO
        };

        Self {
            transaction_hash: *hash,
            gas_used: receipt.gas_used,
            cumulative_gas_used: receipt.cumulative_gas_used,
            block_hash: B256::ZERO,
            contract_address,
            logs_bloom: receipt.logs_bloom,
            logs: receipt.logs.clone(),
            root: receipt
                .post_state
                .map(|root| root.to_string())
                .unwrap_or_default(),
            status: receipt.success as u64,
            transaction_index: *index as u64,
        }
    }
}

/// Aggregate outputs of a block transition.
///
/// Revision-gated fields are `None` below their activation and are left out
/// of the serialized form.  So are the transaction-derived fields when no
/// transaction list was given at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub current_difficulty: U256,
    #[serde(with = "alloy_serde::quantity")]
    pub current_base_fee: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipts: Option<Vec<ReceiptRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<Vec<RejectedTx>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs_hash: Option<B256>,
    pub state_root: B256,
    pub logs_bloom: Bloom,
    pub receipts_root: B256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawals_root: Option<B256>,
    pub tx_root: B256,
    #[serde(with = "alloy_serde::quantity")]
    pub gas_used: u64,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub blob_gas_used: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub current_excess_blob_gas: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<Vec<Bytes>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_hash: Option<B256>,
}

/// Hash of the logs emitted by a block, `keccak(rlp(logs))`.
pub fn logs_hash(logs: &[Log]) -> B256 {
    let mut out = Vec::new();
    alloy_rlp::encode_list::<_, Log>(logs, &mut out);
    keccak(out)
}

/// EIP-7685 requests hash over the given per-type request data.
///
/// Each category is hashed as its type byte followed by its data, the digests
/// are then hashed again in category order.
pub fn requests_hash(requests: &[(u8, &[u8])]) -> B256 {
    let mut outer = Sha256::new();
    for (ty, data) in requests {
        let inner = Sha256::new().chain_update([*ty]).chain_update(data).finalize();
        outer.update(inner);
    }
    B256::from_slice(&outer.finalize())
}

/// Requests hash of a block that produced no requests.
pub fn empty_requests_hash() -> B256 {
    let empty = REQUEST_TYPES.map(|ty| (ty, &[] as &[u8]));
    requests_hash(&empty)
}

/// Builds the result record from the post-finalization state and the
/// transaction outcomes.  `exec` is `None` when no transaction list was given.
pub fn aggregate(
    exec: Option<&BlockExecution>,
    state: &WorldState,
    block: &BlockInfo,
    rev: Revision,
) -> ResultRecord {
    let accepted = exec.map(|e| e.accepted.as_slice()).unwrap_or_default();
    let receipts = accepted.iter().map(|a| &a.receipt).collect::<Vec<_>>();
    let envelopes = accepted.iter().map(|a| &a.envelope).collect::<Vec<_>>();

    let blob_gas_left = exec.map_or(MAX_BLOB_GAS_PER_BLOCK, |e| e.budgets.blob_gas_left);

    let prague = rev.is_enabled_in(Revision::REQUESTS);
    let cancun = rev.is_enabled_in(Revision::BLOBS);

    ResultRecord {
        current_difficulty: block.difficulty,
        current_base_fee: block.base_fee,
        receipts: exec.map(|e| e.accepted.iter().map(ReceiptRecord::new).collect()),
        rejected: exec.map(|e| e.rejected.clone()),
        logs_hash: exec.map(|e| logs_hash(&e.logs)),
        state_root: state.state_root(),
        logs_bloom: receipts_bloom(receipts.iter().copied()),
        receipts_root: ordered_root(&receipts, |r, buf| r.envelope().encode_2718(buf)),
        withdrawals_root: rev
            .is_enabled_in(Revision::WITHDRAWALS)
            .then(|| ordered_root(&block.withdrawals, |w, buf| w.encode(buf))),
        tx_root: ordered_root(&envelopes, |e, buf| e.encode_2718(buf)),
        gas_used: exec.map_or(0, |e| e.gas_used),
        blob_gas_used: cancun.then_some(MAX_BLOB_GAS_PER_BLOCK - blob_gas_left),
        current_excess_blob_gas: cancun.then_some(block.excess_blob_gas),
        requests: prague.then(|| vec![Bytes::new(); REQUEST_TYPES.len()]),
        requests_hash: prague.then(empty_requests_hash),
    }
}

/// RLP list of the accepted transactions, as the block body carries them:
/// legacy ones inline, typed ones as a string holding the envelope.
pub fn encode_body(exec: Option<&BlockExecution>) -> Vec<u8> {
    let envelopes = exec
        .map(|e| e.accepted.iter().map(|a| a.envelope.clone()).collect::<Vec<_>>())
        .unwrap_or_default();
    alloy_rlp::encode(envelopes)
}
