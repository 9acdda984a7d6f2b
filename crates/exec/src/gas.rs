//! Gas schedule pieces the reference applier needs.

use alloy_primitives::U256;
use t8n_primitives::{revision::Revision, tx::Transaction};

pub const TX_GAS: u64 = 21_000;
pub const TX_CREATE_GAS: u64 = 32_000;
pub const TX_DATA_ZERO_GAS: u64 = 4;
pub const TX_DATA_NONZERO_GAS_FRONTIER: u64 = 68;
pub const TX_DATA_NONZERO_GAS_ISTANBUL: u64 = 16;
pub const ACCESS_LIST_ADDRESS_GAS: u64 = 2_400;
pub const ACCESS_LIST_STORAGE_KEY_GAS: u64 = 1_900;
pub const INITCODE_WORD_GAS: u64 = 2;

/// EIP-3860 limit on init code length.
pub const MAX_INITCODE_SIZE: usize = 2 * 24_576;

pub const MIN_BLOB_GASPRICE: u64 = 1;
/// EIP-4844 update fraction, paired with the six blob ceiling.
pub const BLOB_BASE_FEE_UPDATE_FRACTION: u64 = 3_338_477;
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

/// Gas charged before any execution happens.
pub fn intrinsic_gas(tx: &Transaction, rev: Revision) -> u64 {
    let mut gas = TX_GAS;

    if tx.is_create() && rev.is_enabled_in(Revision::Homestead) {
        gas += TX_CREATE_GAS;
    }

    let nonzero_cost = if rev.is_enabled_in(Revision::Istanbul) {
        TX_DATA_NONZERO_GAS_ISTANBUL
    } else {
        TX_DATA_NONZERO_GAS_FRONTIER
    };
    let zeros = tx.data.iter().filter(|b| **b == 0).count() as u64;
    let nonzeros = tx.data.len() as u64 - zeros;
    gas += zeros * TX_DATA_ZERO_GAS + nonzeros * nonzero_cost;

    for item in &tx.access_list {
        gas += ACCESS_LIST_ADDRESS_GAS;
        gas += item.storage_keys.len() as u64 * ACCESS_LIST_STORAGE_KEY_GAS;
    }

    if tx.is_create() && rev.is_enabled_in(Revision::Shanghai) {
        gas += tx.data.len().div_ceil(32) as u64 * INITCODE_WORD_GAS;
    }

    gas
}

/// Price of one unit of blob gas given the block's excess blob gas.
///
/// One schedule applies to every blob-enabled revision.
pub fn blob_base_fee(excess_blob_gas: u64) -> U256 {
    fake_exponential(
        U256::from(MIN_BLOB_GASPRICE),
        U256::from(excess_blob_gas),
        U256::from(BLOB_BASE_FEE_UPDATE_FRACTION),
    )
}

/// Approximates `factor * e ** (numerator / denominator)` by Taylor expansion.
///
/// Saturates at `U256::MAX` instead of overflowing.
fn fake_exponential(factor: U256, numerator: U256, denominator: U256) -> U256 {
    let mut i = U256::from(1);
    let mut output = U256::ZERO;
    let Some(mut accum) = factor.checked_mul(denominator) else {
        return U256::MAX;
    };
    while !accum.is_zero() {
        output = output.saturating_add(accum);
        accum = match accum.checked_mul(numerator) {
            Some(product) => product / (denominator * i),
            None => return U256::MAX,
        };
        i += U256::from(1);
    }
    output / denominator
}
