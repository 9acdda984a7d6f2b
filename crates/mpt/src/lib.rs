//! Trie root helpers.
//!
//! Two shapes of collection get committed to: ordered lists, keyed by the RLP
//! encoding of the item index (transactions, receipts, withdrawals), and keyed
//! maps whose keys are hashed before insertion (accounts, storage).

use std::collections::BTreeMap;

use alloy_primitives::{keccak256, B256};
use alloy_trie::{root::ordered_trie_root_with_encoder, HashBuilder, Nibbles};

pub use alloy_trie::EMPTY_ROOT_HASH;

/// Computes keccak256 of the given data.
pub fn keccak(data: impl AsRef<[u8]>) -> B256 {
    keccak256(data)
}

/// Root of an index-keyed trie over `items`, each leaf value produced by
/// `encode`.
pub fn ordered_root<T, F>(items: &[T], encode: F) -> B256
where
    F: FnMut(&T, &mut Vec<u8>),
{
    ordered_trie_root_with_encoder(items, encode)
}

/// Root of a trie whose leaves are keyed by `keccak(key)`.
///
/// Entries may arrive in any order, they are sorted by hashed key before
/// insertion so the root only depends on the set of entries.
pub fn hashed_key_root<K, I>(entries: I) -> B256
where
    K: AsRef<[u8]>,
    I: IntoIterator<Item = (K, Vec<u8>)>,
{
    let sorted = entries
        .into_iter()
        .map(|(k, v)| (keccak(k), v))
        .collect::<BTreeMap<_, _>>();

    let mut hb = HashBuilder::default();
    for (key, value) in &sorted {
        hb.add_leaf(Nibbles::unpack(key), value);
    }
    hb.root()
}
