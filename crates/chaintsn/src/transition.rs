//! Block state transition logic.
//!
//! Plays a list of transactions out on top of a pre-state, one at a time and
//! in input order, then closes the block and aggregates the results.

use std::path::Path;

use alloy_consensus::TxEnvelope;
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{keccak256, B256, U256};
use t8n_exec::{calculate_difficulty, BlockEnv, BlockFinalizer, Budgets, TxApplier, TxOutcome};
use t8n_primitives::{constants::MAX_BLOB_GAS_PER_BLOCK, prelude::*};
use t8n_state::WorldState;
use tracing::*;

use crate::{
    aggregate::{aggregate, encode_body, ResultRecord},
    errors::TsnError,
    trace::TraceScope,
};

/// Per-run knobs of the transition.
#[derive(Copy, Clone, Debug)]
pub struct TransitionParams<'a> {
    pub rev: Revision,

    /// Chain id every transaction is re-stamped with before hashing.
    pub chain_id: u64,

    /// Block reward override, `None` for no reward.
    pub reward: Option<u64>,

    /// Where per-transaction traces go, `None` disables tracing.
    pub trace_dir: Option<&'a Path>,
}

/// A chain-id-stamped transaction together with its signed encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedTx {
    pub hash: B256,
    pub tx: Transaction,
    pub envelope: TxEnvelope,
}

/// A transaction the applier accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptedTx {
    /// Position in the input list.
    pub index: usize,
    pub hash: B256,
    pub tx: Transaction,
    pub envelope: TxEnvelope,
    pub receipt: Receipt,
}

/// Outcome of playing out a transaction list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockExecution {
    pub accepted: Vec<AcceptedTx>,
    pub rejected: Vec<RejectedTx>,

    /// Logs of all accepted transactions, in acceptance order.
    pub logs: Vec<Log>,
    pub gas_used: u64,

    /// Budgets left after the last transaction.
    pub budgets: Budgets,
}

/// Everything a block transition produces besides the mutated state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionOutput {
    pub result: ResultRecord,

    /// `None` if no transaction list was given.
    pub execution: Option<BlockExecution>,
}

impl TransitionOutput {
    /// RLP list of the accepted transactions in their network form.
    pub fn encoded_body(&self) -> Vec<u8> {
        encode_body(self.execution.as_ref())
    }
}

/// Settles the block difficulty.
///
/// A nonzero difficulty in the block is taken as given.  Otherwise it is
/// computed from the parent and written back, and before the merge the
/// randao field is replaced with it so that reading it yields the difficulty.
pub fn resolve_difficulty(block: &mut BlockInfo, rev: Revision) -> U256 {
    if !block.difficulty.is_zero() {
        return block.difficulty;
    }

    let difficulty = calculate_difficulty(
        block.parent_difficulty,
        block.parent_has_ommers,
        block.parent_timestamp,
        block.timestamp,
        block.number,
        rev,
    );
    block.difficulty = difficulty;

    if !rev.is_enabled_in(Revision::MERGE) {
        block.prev_randao = B256::from(difficulty.to_be_bytes::<32>());
    }

    debug!(%difficulty, "computed block difficulty");
    difficulty
}

/// Stamps the configured chain id on each transaction, then checks each
/// computed hash against the one its fixture declared.
///
/// A transaction that has no valid signed encoding is as fatal as a hash
/// mismatch, and both are caught before anything is applied.
pub fn prepare_txs(entries: Vec<TxEntry>, chain_id: u64) -> Result<Vec<PreparedTx>, TsnError> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, TxEntry { mut tx, declared_hash })| {
            tx.chain_id = chain_id;
            let envelope = tx
                .envelope()
                .map_err(|source| TsnError::TxEncoding { index, source })?;
            let computed = keccak256(envelope.encoded_2718());
            match declared_hash {
                Some(expected) if expected != computed => Err(TsnError::TxHashMismatch {
                    index,
                    computed,
                    expected,
                }),
                _ => Ok(PreparedTx {
                    hash: computed,
                    tx,
                    envelope,
                }),
            }
        })
        .collect()
}

/// Applies transactions in order, partitioning them into accepted and
/// rejected.
///
/// Budgets only ever shrink on acceptance.  Rejections are logged and
/// recorded but never abort the block.
pub fn execute_txs(
    state: &mut WorldState,
    block: &BlockInfo,
    hashes: &BlockHashes,
    txs: Vec<PreparedTx>,
    params: &TransitionParams<'_>,
    applier: &mut impl TxApplier,
) -> Result<BlockExecution, TsnError> {
    let env = BlockEnv::new(block, hashes, params.rev);
    let mut exec = BlockExecution {
        accepted: Vec::new(),
        rejected: Vec::new(),
        logs: Vec::new(),
        gas_used: 0,
        budgets: Budgets::new(block.gas_limit, MAX_BLOB_GAS_PER_BLOCK),
    };

    applier.system_call(state, env)?;

    for (index, PreparedTx { hash, tx, envelope }) in txs.into_iter().enumerate() {
        debug!(%index, %hash, "applying transaction");

        let outcome = {
            let _trace = params
                .trace_dir
                .map(|dir| TraceScope::enter(dir, index, &hash))
                .transpose()?;
            applier.apply(state, env, &tx, exec.budgets)
        };

        let mut receipt = match outcome {
            TxOutcome::Applied(receipt) => receipt,
            TxOutcome::Rejected(reason) => {
                warn!(%index, %hash, %reason, "rejected transaction");
                exec.rejected.push(RejectedTx {
                    hash,
                    index,
                    reason: reason.to_string(),
                });
                continue;
            }
        };

        let blob_gas = tx.blob_gas_used();
        if exec.budgets.charge(receipt.gas_used, blob_gas).is_none() {
            return Err(TsnError::BudgetOverrun {
                index,
                gas: receipt.gas_used,
                blob_gas,
            });
        }

        exec.gas_used += receipt.gas_used;
        receipt.cumulative_gas_used = exec.gas_used;
        if !params.rev.is_enabled_in(Revision::STATUS_RECEIPTS) {
            receipt.post_state = Some(state.state_root());
        }

        exec.logs.extend(receipt.logs.iter().cloned());
        exec.accepted.push(AcceptedTx {
            index,
            hash,
            tx,
            envelope,
            receipt,
        });
    }

    info!(
        accepted = exec.accepted.len(),
        rejected = exec.rejected.len(),
        gas_used = exec.gas_used,
        "applied transactions"
    );
    Ok(exec)
}

/// Processes a block, mutating the provided state in place.
///
/// Without a transaction list (as opposed to an empty one) only the
/// difficulty is resolved: no system call, no finalization, and the result
/// leaves out every transaction-derived field.  Any error returned is fatal
/// and leaves the state in an unspecified condition.
pub fn process_block(
    state: &mut WorldState,
    block: &mut BlockInfo,
    hashes: &BlockHashes,
    txs: Option<Vec<TxEntry>>,
    params: &TransitionParams<'_>,
    applier: &mut impl TxApplier,
    finalizer: &impl BlockFinalizer,
) -> Result<TransitionOutput, TsnError> {
    resolve_difficulty(block, params.rev);

    let execution = match txs {
        Some(entries) => {
            let txs = prepare_txs(entries, params.chain_id)?;
            let exec = execute_txs(state, block, hashes, txs, params, applier)?;

            finalizer.finalize(
                state,
                params.rev,
                block.coinbase,
                params.reward,
                &block.ommers,
                &block.withdrawals,
            )?;
            Some(exec)
        }
        None => None,
    };

    let result = aggregate(execution.as_ref(), state, block, params.rev);
    info!(state_root = %result.state_root, rev = %params.rev, "block transition complete");

    Ok(TransitionOutput { result, execution })
}
