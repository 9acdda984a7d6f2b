//! JSON fixture formats: pre/post-state alloc, block environment and
//! transaction list.

use std::{collections::BTreeMap, fs, path::Path};

use alloy_consensus::constants::EMPTY_OMMER_ROOT_HASH;
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use t8n_primitives::prelude::*;
use t8n_state::{Account, WorldState};

use crate::errors::InitError;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InitError> {
    let raw = fs::read_to_string(path).map_err(|e| InitError::ReadFile(path.to_owned(), e))?;
    serde_json::from_str(&raw).map_err(|e| InitError::ParseFixture(path.to_owned(), e))
}

/// Parses a block number key, hex with `0x` or decimal.
fn parse_number(s: &str) -> Result<u64, InitError> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| InitError::InvalidFixture(format!("bad block number {s:?}")))
}

/// An account in an alloc file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocAccount {
    #[serde(default, with = "alloy_serde::quantity")]
    pub nonce: u64,
    #[serde(default)]
    pub balance: U256,
    #[serde(default, skip_serializing_if = "is_empty_code")]
    pub code: Bytes,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub storage: BTreeMap<U256, U256>,
}

impl From<AllocAccount> for Account {
    fn from(a: AllocAccount) -> Self {
        // zero slots are kept as is so that validation can flag them
        Self {
            nonce: a.nonce,
            balance: a.balance,
            code: a.code,
            storage: a.storage,
        }
    }
}

impl From<&Account> for AllocAccount {
    fn from(a: &Account) -> Self {
        Self {
            nonce: a.nonce,
            balance: a.balance,
            code: a.code.clone(),
            storage: a.storage.clone(),
        }
    }
}

fn is_empty_code(code: &Bytes) -> bool {
    code.is_empty()
}

pub type Alloc = BTreeMap<Address, AllocAccount>;

pub fn alloc_to_state(alloc: Alloc) -> WorldState {
    WorldState::new(alloc.into_iter().map(|(addr, a)| (addr, a.into())).collect())
}

pub fn state_to_alloc(state: &WorldState) -> Alloc {
    state
        .iter()
        .map(|(addr, acct)| (*addr, AllocAccount::from(acct)))
        .collect()
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvOmmer {
    address: Address,
    #[serde(with = "alloy_serde::quantity")]
    delta: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvWithdrawal {
    #[serde(with = "alloy_serde::quantity")]
    index: u64,
    #[serde(with = "alloy_serde::quantity")]
    validator_index: u64,
    address: Address,
    #[serde(with = "alloy_serde::quantity")]
    amount: u64,
}

/// Block environment file.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Env {
    current_coinbase: Address,
    #[serde(with = "alloy_serde::quantity")]
    current_gas_limit: u64,
    #[serde(with = "alloy_serde::quantity")]
    current_number: u64,
    #[serde(with = "alloy_serde::quantity")]
    current_timestamp: u64,
    #[serde(default)]
    current_difficulty: Option<U256>,
    #[serde(default)]
    current_random: Option<B256>,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    current_base_fee: Option<u64>,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    current_excess_blob_gas: Option<u64>,
    #[serde(default)]
    parent_difficulty: Option<U256>,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    parent_timestamp: Option<u64>,
    #[serde(default)]
    parent_uncle_hash: Option<B256>,
    #[serde(default)]
    parent_beacon_block_root: Option<B256>,
    #[serde(default)]
    ommers: Vec<EnvOmmer>,
    #[serde(default)]
    withdrawals: Vec<EnvWithdrawal>,
    #[serde(default)]
    block_hashes: BTreeMap<String, B256>,
}

impl Env {
    pub fn into_block(self) -> Result<(BlockInfo, BlockHashes), InitError> {
        let mut hashes = BlockHashes::default();
        for (number, hash) in &self.block_hashes {
            hashes.insert(parse_number(number)?, *hash);
        }

        let block = BlockInfo {
            number: self.current_number,
            timestamp: self.current_timestamp,
            gas_limit: self.current_gas_limit,
            coinbase: self.current_coinbase,
            difficulty: self.current_difficulty.unwrap_or_default(),
            prev_randao: self.current_random.unwrap_or_default(),
            base_fee: self.current_base_fee.unwrap_or_default(),
            excess_blob_gas: self.current_excess_blob_gas.unwrap_or_default(),
            parent_beacon_block_root: self.parent_beacon_block_root.unwrap_or_default(),
            parent_difficulty: self.parent_difficulty.unwrap_or_default(),
            parent_timestamp: self.parent_timestamp.unwrap_or_default(),
            parent_has_ommers: self
                .parent_uncle_hash
                .is_some_and(|h| h != EMPTY_OMMER_ROOT_HASH),
            ommers: self
                .ommers
                .into_iter()
                .map(|o| Ommer {
                    beneficiary: o.address,
                    delta: o.delta,
                })
                .collect(),
            withdrawals: self
                .withdrawals
                .into_iter()
                .map(|w| Withdrawal {
                    index: w.index,
                    validator_index: w.validator_index,
                    address: w.address,
                    amount: w.amount,
                })
                .collect(),
        };
        Ok((block, hashes))
    }
}

/// Treats both `null` and `""` as a missing recipient.
fn deserialize_to<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Address>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureAccessListItem {
    address: Address,
    #[serde(default)]
    storage_keys: Vec<B256>,
}

/// One entry of a transactions file.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureTx {
    #[serde(default, rename = "type", with = "alloy_serde::quantity::opt")]
    kind: Option<u8>,
    #[serde(default, with = "alloy_serde::quantity")]
    nonce: u64,
    sender: Address,
    #[serde(default, deserialize_with = "deserialize_to")]
    to: Option<Address>,
    #[serde(default)]
    value: U256,
    #[serde(default, alias = "data")]
    input: Bytes,
    #[serde(alias = "gasLimit", with = "alloy_serde::quantity")]
    gas: u64,
    #[serde(default)]
    gas_price: Option<U256>,
    #[serde(default)]
    max_fee_per_gas: Option<U256>,
    #[serde(default)]
    max_priority_fee_per_gas: Option<U256>,
    #[serde(default)]
    max_fee_per_blob_gas: Option<U256>,
    #[serde(default)]
    access_list: Option<Vec<FixtureAccessListItem>>,
    #[serde(default)]
    blob_versioned_hashes: Option<Vec<B256>>,
    #[serde(default)]
    v: U256,
    #[serde(default)]
    r: U256,
    #[serde(default)]
    s: U256,
    #[serde(default)]
    hash: Option<B256>,
}

impl FixtureTx {
    fn tx_type(&self) -> Result<TxType, InitError> {
        match self.kind {
            Some(b) => TxType::from_type_byte(b)
                .ok_or_else(|| InitError::InvalidFixture(format!("unknown tx type {b}"))),
            None if self.blob_versioned_hashes.is_some() => Ok(TxType::Blob),
            None if self.max_fee_per_gas.is_some() => Ok(TxType::DynamicFee),
            None if self.access_list.is_some() => Ok(TxType::AccessList),
            None => Ok(TxType::Legacy),
        }
    }

    /// Converts into a transaction entry.  The chain id is left at zero, the
    /// driver stamps the configured one.
    pub fn into_entry(self) -> Result<TxEntry, InitError> {
        let kind = self.tx_type()?;

        let (max_gas_price, max_priority_gas_price) = match kind {
            TxType::Legacy | TxType::AccessList => {
                let price = self.gas_price.ok_or_else(|| {
                    InitError::InvalidFixture("missing gasPrice".to_string())
                })?;
                (price, price)
            }
            TxType::DynamicFee | TxType::Blob => {
                let missing = || InitError::InvalidFixture("missing 1559 fee fields".to_string());
                (
                    self.max_fee_per_gas.ok_or_else(missing)?,
                    self.max_priority_fee_per_gas.ok_or_else(missing)?,
                )
            }
        };

        let tx = Transaction {
            kind,
            chain_id: 0,
            nonce: self.nonce,
            sender: self.sender,
            to: self.to,
            value: self.value,
            data: self.input,
            gas_limit: self.gas,
            max_gas_price,
            max_priority_gas_price,
            max_blob_gas_price: self.max_fee_per_blob_gas.unwrap_or_default(),
            access_list: self
                .access_list
                .unwrap_or_default()
                .into_iter()
                .map(|item| AccessListItem {
                    address: item.address,
                    storage_keys: item.storage_keys,
                })
                .collect(),
            blob_hashes: self.blob_versioned_hashes.unwrap_or_default(),
            v: self.v,
            r: self.r,
            s: self.s,
        };
        Ok(TxEntry::new(tx, self.hash))
    }
}

pub fn load_alloc(path: &Path) -> Result<WorldState, InitError> {
    read_json::<Alloc>(path).map(alloc_to_state)
}

pub fn load_env(path: &Path) -> Result<(BlockInfo, BlockHashes), InitError> {
    read_json::<Env>(path)?.into_block()
}

pub fn load_txs(path: &Path) -> Result<Vec<TxEntry>, InitError> {
    read_json::<Vec<FixtureTx>>(path)?
        .into_iter()
        .map(FixtureTx::into_entry)
        .collect()
}
