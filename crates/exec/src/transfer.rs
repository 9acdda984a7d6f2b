//! Reference transaction applier.
//!
//! Validates transactions the way a full client would before execution, then
//! performs the value transfer and fee accounting without running any
//! bytecode.  Every accepted transaction uses exactly its intrinsic gas.

use alloy_primitives::{Address, U256};
use t8n_primitives::{constants::MAX_BLOB_GAS_PER_BLOCK, prelude::*};
use t8n_state::{Account, WorldState};
use tracing::*;

use crate::{
    errors::{SystemCallError, TxRejection},
    gas::{blob_base_fee, intrinsic_gas, MAX_INITCODE_SIZE, VERSIONED_HASH_VERSION_KZG},
    system::apply_system_updates,
    traits::{BlockEnv, Budgets, TxApplier, TxOutcome},
};

/// Code prefix of an EIP-7702 delegation designator.
const DELEGATION_PREFIX: [u8; 3] = [0xef, 0x01, 0x00];

#[derive(Copy, Clone, Debug, Default)]
pub struct TransferApplier;

/// Prices a transaction pays per unit of gas.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct GasPrices {
    effective: U256,
    coinbase_tip: U256,
}

fn type_supported(kind: TxType, rev: Revision) -> bool {
    match kind {
        TxType::Legacy => true,
        TxType::AccessList => rev.is_enabled_in(Revision::Berlin),
        TxType::DynamicFee => rev.is_enabled_in(Revision::London),
        TxType::Blob => rev.is_enabled_in(Revision::BLOBS),
    }
}

fn is_eoa(acct: &Account, rev: Revision) -> bool {
    !acct.has_code()
        || (rev.is_enabled_in(Revision::Prague) && acct.code.starts_with(&DELEGATION_PREFIX))
}

/// Upper bound the sender must be able to pay up front.
fn max_cost(tx: &Transaction) -> Option<U256> {
    let gas = U256::from(tx.gas_limit).checked_mul(tx.max_gas_price)?;
    let blob = U256::from(tx.blob_gas_used()).checked_mul(tx.max_blob_gas_price)?;
    gas.checked_add(tx.value)?.checked_add(blob)
}

/// Checks everything that doesn't depend on execution.  Returns the intrinsic
/// gas and prices to charge.
fn validate(
    state: &WorldState,
    env: BlockEnv<'_>,
    tx: &Transaction,
    budgets: Budgets,
) -> Result<(u64, GasPrices), TxRejection> {
    let rev = env.rev;

    if !type_supported(tx.kind, rev) {
        return Err(TxRejection::TxTypeNotSupported);
    }

    if tx.gas_limit > budgets.gas_left {
        return Err(TxRejection::GasLimitReached);
    }

    let blob_gas = tx.blob_gas_used();
    if blob_gas > budgets.blob_gas_left || blob_gas > MAX_BLOB_GAS_PER_BLOCK {
        return Err(TxRejection::BlobGasLimitExceeded);
    }

    if tx.kind == TxType::Blob {
        if tx.blob_hashes.is_empty() {
            return Err(TxRejection::EmptyBlobHashes);
        }
        if tx.blob_hashes.iter().any(|h| h[0] != VERSIONED_HASH_VERSION_KZG) {
            return Err(TxRejection::InvalidBlobHashVersion);
        }
        if tx.is_create() {
            return Err(TxRejection::CreateBlobTx);
        }
    }

    let base_fee = U256::from(env.block.base_fee);
    let prices = if rev.is_enabled_in(Revision::London) {
        if tx.max_priority_gas_price > tx.max_gas_price {
            return Err(TxRejection::TipGtFeeCap);
        }
        if tx.max_gas_price < base_fee {
            return Err(TxRejection::FeeCapLessThanBlocks);
        }
        let effective = tx
            .max_gas_price
            .min(base_fee.saturating_add(tx.max_priority_gas_price));
        GasPrices {
            effective,
            coinbase_tip: effective - base_fee,
        }
    } else {
        GasPrices {
            effective: tx.max_gas_price,
            coinbase_tip: tx.max_gas_price,
        }
    };

    if tx.kind == TxType::Blob
        && tx.max_blob_gas_price < blob_base_fee(env.block.excess_blob_gas)
    {
        return Err(TxRejection::BlobFeeCapLessThanBlocks);
    }

    let sender = state.get(&tx.sender).cloned().unwrap_or_default();
    if !is_eoa(&sender, rev) {
        return Err(TxRejection::SenderNotEoa(tx.sender));
    }
    if sender.nonce == u64::MAX {
        return Err(TxRejection::NonceHasMaxValue(tx.sender));
    }
    if tx.nonce < sender.nonce {
        return Err(TxRejection::NonceTooLow);
    }
    if tx.nonce > sender.nonce {
        return Err(TxRejection::NonceTooHigh);
    }

    if tx.is_create() && rev.is_enabled_in(Revision::Shanghai) && tx.data.len() > MAX_INITCODE_SIZE
    {
        return Err(TxRejection::InitCodeSizeLimitExceeded);
    }

    let intrinsic = intrinsic_gas(tx, rev);
    if intrinsic > tx.gas_limit {
        return Err(TxRejection::IntrinsicGasTooLow);
    }

    match max_cost(tx) {
        Some(cost) if cost <= sender.balance => {}
        _ => return Err(TxRejection::InsufficientFunds),
    }

    Ok((intrinsic, prices))
}

/// Whether a contract can be deployed at `addr`.
fn create_collides(state: &WorldState, addr: &Address) -> bool {
    state
        .get(addr)
        .is_some_and(|a| a.nonce != 0 || a.has_code() || !a.storage.is_empty())
}

impl TxApplier for TransferApplier {
    fn system_call(
        &mut self,
        state: &mut WorldState,
        env: BlockEnv<'_>,
    ) -> Result<(), SystemCallError> {
        apply_system_updates(state, env)?;
        state.clear_empty_touched(env.rev);
        Ok(())
    }

    fn apply(
        &mut self,
        state: &mut WorldState,
        env: BlockEnv<'_>,
        tx: &Transaction,
        budgets: Budgets,
    ) -> TxOutcome {
        let (intrinsic, prices) = match validate(state, env, tx, budgets) {
            Ok(v) => v,
            Err(e) => return TxOutcome::Rejected(e),
        };
        trace!(sender = %tx.sender, nonce = tx.nonce, %intrinsic, "transaction valid");

        let rev = env.rev;
        let blob_fee = if tx.kind == TxType::Blob {
            let price = blob_base_fee(env.block.excess_blob_gas);
            U256::from(tx.blob_gas_used()).saturating_mul(price)
        } else {
            U256::ZERO
        };

        let (success, gas_used) = match tx.to {
            Some(to) => {
                transfer(state, tx.sender, to, tx.value);
                trace!(%to, value = %tx.value, "transferred value");
                (true, intrinsic)
            }
            None => {
                let created = tx.sender.create(tx.nonce);
                if create_collides(state, &created) {
                    trace!(%created, "contract address collision");
                    (false, tx.gas_limit)
                } else {
                    transfer(state, tx.sender, created, tx.value);
                    if rev.is_enabled_in(Revision::SpuriousDragon) {
                        state.touch(created).nonce = 1;
                    }
                    trace!(%created, value = %tx.value, "created account");
                    (true, intrinsic)
                }
            }
        };

        let fee = U256::from(gas_used) * prices.effective + blob_fee;
        let sender = state.touch(tx.sender);
        sender.nonce += 1;
        sender.balance = sender.balance.saturating_sub(fee);
        trace!(%fee, "charged sender");

        let tip = U256::from(gas_used) * prices.coinbase_tip;
        let coinbase = state.touch(env.block.coinbase);
        coinbase.balance = coinbase.balance.saturating_add(tip);
        trace!(coinbase = %env.block.coinbase, %tip, "paid coinbase");

        state.clear_empty_touched(rev);
        TxOutcome::Applied(Receipt::new(tx.kind, success, gas_used, Vec::new()))
    }
}

fn transfer(state: &mut WorldState, from: Address, to: Address, value: U256) {
    let sender = state.touch(from);
    sender.balance = sender.balance.saturating_sub(value);
    let recipient = state.touch(to);
    recipient.balance = recipient.balance.saturating_add(value);
}
