//! Block context handed to the driver and its collaborators.

use std::collections::BTreeMap;

use alloy_consensus::constants::GWEI_TO_WEI;
use alloy_primitives::{Address, B256, U256};
use alloy_rlp::RlpEncodable;

/// Environment of the block being built.
///
/// The driver only writes to this while resolving difficulty, before the
/// first transaction is applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub coinbase: Address,

    /// Current difficulty, zero if it should be computed.
    pub difficulty: U256,

    /// Previous RANDAO mix, observed by the `PREVRANDAO` opcode post-merge.
    pub prev_randao: B256,
    pub base_fee: u64,
    pub excess_blob_gas: u64,
    pub parent_beacon_block_root: B256,

    pub parent_difficulty: U256,
    pub parent_timestamp: u64,

    /// Whether the parent block carried ommers, feeds the difficulty formula.
    pub parent_has_ommers: bool,

    pub ommers: Vec<Ommer>,
    pub withdrawals: Vec<Withdrawal>,
}

/// An ommer (uncle) header reference, as much of it as block rewards need.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ommer {
    pub beneficiary: Address,

    /// Distance between the including block and the ommer, `1..=7`.
    pub delta: u64,
}

/// A beacon chain withdrawal credited during finalization.
#[derive(Copy, Clone, Debug, PartialEq, Eq, RlpEncodable)]
pub struct Withdrawal {
    pub index: u64,
    pub validator_index: u64,
    pub address: Address,

    /// Amount in gwei.
    pub amount: u64,
}

impl Withdrawal {
    /// Withdrawal amount in wei.
    pub fn amount_wei(&self) -> U256 {
        U256::from(self.amount) * U256::from(GWEI_TO_WEI)
    }
}

/// Historical block hashes, keyed by block number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockHashes {
    hashes: BTreeMap<u64, B256>,
}

impl BlockHashes {
    pub fn insert(&mut self, number: u64, hash: B256) {
        self.hashes.insert(number, hash);
    }

    /// Returns the hash of block `number`, if the oracle knows it.
    pub fn get(&self, number: u64) -> Option<B256> {
        self.hashes.get(&number).copied()
    }
}
