use std::collections::BTreeMap;

use alloy_primitives::{Bytes, B256, U256};
use alloy_rlp::{Encodable, RlpEncodable};
use t8n_mpt::{hashed_key_root, keccak};

/// An account in the world state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    pub code: Bytes,

    /// Storage slots, zero values are never kept.
    pub storage: BTreeMap<U256, U256>,
}

impl Account {
    /// Empty in the EIP-161 sense: no nonce, no balance, no code.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code.is_empty()
    }

    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }

    pub fn code_hash(&self) -> B256 {
        keccak(&self.code)
    }

    /// Reads a storage slot, absent slots read as zero.
    pub fn storage_value(&self, key: &U256) -> U256 {
        self.storage.get(key).copied().unwrap_or_default()
    }

    /// Writes a storage slot, writing zero clears it.
    pub fn set_storage(&mut self, key: U256, value: U256) {
        if value.is_zero() {
            self.storage.remove(&key);
        } else {
            self.storage.insert(key, value);
        }
    }

    pub fn storage_root(&self) -> B256 {
        hashed_key_root(self.storage.iter().map(|(k, v)| {
            let mut buf = Vec::with_capacity(33);
            v.encode(&mut buf);
            (k.to_be_bytes::<32>(), buf)
        }))
    }

    /// RLP of the account as stored in the state trie.
    pub(crate) fn trie_encoding(&self) -> Vec<u8> {
        let sa = StateAccount {
            nonce: self.nonce,
            balance: self.balance,
            storage_root: self.storage_root(),
            code_hash: self.code_hash(),
        };
        let mut buf = Vec::with_capacity(sa.length());
        sa.encode(&mut buf);
        buf
    }
}

/// Account leaf of the state trie.
#[derive(RlpEncodable)]
struct StateAccount {
    nonce: u64,
    balance: U256,
    storage_root: B256,
    code_hash: B256,
}

#[cfg(test)]
mod tests {
    use t8n_mpt::EMPTY_ROOT_HASH;

    use super::*;

    #[test]
    fn test_empty_account() {
        let acct = Account::default();
        assert!(acct.is_empty());
        assert_eq!(acct.storage_root(), EMPTY_ROOT_HASH);
        assert_eq!(acct.code_hash(), keccak(b""));
    }

    #[test]
    fn test_zero_write_clears_slot() {
        let mut acct = Account::default();
        acct.set_storage(U256::from(1), U256::from(5));
        assert_eq!(acct.storage_value(&U256::from(1)), U256::from(5));
        let root = acct.storage_root();
        assert_ne!(root, EMPTY_ROOT_HASH);

        acct.set_storage(U256::from(1), U256::ZERO);
        assert!(acct.storage.is_empty());
        assert_eq!(acct.storage_root(), EMPTY_ROOT_HASH);
    }

    #[test]
    fn test_balance_makes_nonempty() {
        let acct = Account {
            balance: U256::from(1),
            ..Default::default()
        };
        assert!(!acct.is_empty());
    }
}
