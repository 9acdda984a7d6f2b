pub use alloy_primitives::{Address, Bloom, Bytes, B256, U256};

pub use crate::{
    block::{BlockHashes, BlockInfo, Ommer, Withdrawal},
    receipt::{Log, Receipt, RejectedTx},
    revision::Revision,
    tx::{AccessListItem, Transaction, TxEntry, TxType},
};
