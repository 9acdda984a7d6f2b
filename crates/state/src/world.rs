use std::collections::{btree_map, BTreeMap, BTreeSet};

use alloy_primitives::{Address, B256};
use t8n_mpt::hashed_key_root;
use t8n_primitives::revision::Revision;
use tracing::*;

use crate::account::Account;

/// The set of accounts a block transition mutates in place.
///
/// Accounts handed out through [`Self::touch`] are remembered until the next
/// call to [`Self::clear_empty_touched`], which drops the empty ones on
/// revisions that delete them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldState {
    accounts: BTreeMap<Address, Account>,
    touched: BTreeSet<Address>,
}

impl WorldState {
    pub fn new(accounts: BTreeMap<Address, Account>) -> Self {
        Self {
            accounts,
            touched: BTreeSet::new(),
        }
    }

    pub fn get(&self, addr: &Address) -> Option<&Account> {
        self.accounts.get(addr)
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.accounts.contains_key(addr)
    }

    /// Returns the account for writing, creating it if missing, and marks it
    /// touched.
    pub fn touch(&mut self, addr: Address) -> &mut Account {
        self.touched.insert(addr);
        self.accounts.entry(addr).or_default()
    }

    /// Inserts an account without marking it touched.
    pub fn insert(&mut self, addr: Address, account: Account) {
        self.accounts.insert(addr, account);
    }

    /// Forgets the touched set, deleting the touched accounts that are empty
    /// if `rev` follows EIP-161.
    pub fn clear_empty_touched(&mut self, rev: Revision) {
        let touched = std::mem::take(&mut self.touched);
        if !rev.is_enabled_in(Revision::SpuriousDragon) {
            return;
        }

        for addr in touched {
            if let btree_map::Entry::Occupied(e) = self.accounts.entry(addr) {
                if e.get().is_empty() {
                    trace!(%addr, "deleting empty touched account");
                    e.remove();
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Account)> + '_ {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Root of the state trie over all accounts.
    pub fn state_root(&self) -> B256 {
        hashed_key_root(
            self.accounts
                .iter()
                .map(|(addr, acct)| (*addr, acct.trie_encoding())),
        )
    }
}
