//! Contracts between the block driver and transaction execution.

use alloy_primitives::Address;
use t8n_primitives::prelude::*;
use t8n_state::WorldState;

use crate::errors::{FinalizeError, SystemCallError, TxRejection};

/// Read-only block environment a transaction is applied in.
#[derive(Copy, Clone, Debug)]
pub struct BlockEnv<'a> {
    pub block: &'a BlockInfo,
    pub hashes: &'a BlockHashes,
    pub rev: Revision,
}

impl<'a> BlockEnv<'a> {
    pub fn new(block: &'a BlockInfo, hashes: &'a BlockHashes, rev: Revision) -> Self {
        Self { block, hashes, rev }
    }
}

/// Gas and blob gas still available in the block.
///
/// Only ever decreases, and only when a transaction is accepted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Budgets {
    pub gas_left: u64,
    pub blob_gas_left: u64,
}

impl Budgets {
    pub fn new(gas_left: u64, blob_gas_left: u64) -> Self {
        Self {
            gas_left,
            blob_gas_left,
        }
    }

    /// Charges an accepted transaction.  Returns `None`, leaving the budgets
    /// unchanged, if either would go negative.
    pub fn charge(&mut self, gas: u64, blob_gas: u64) -> Option<()> {
        let gas_left = self.gas_left.checked_sub(gas)?;
        let blob_gas_left = self.blob_gas_left.checked_sub(blob_gas)?;
        self.gas_left = gas_left;
        self.blob_gas_left = blob_gas_left;
        Some(())
    }
}

/// Outcome of applying a single transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    Applied(Receipt),
    Rejected(TxRejection),
}

/// Applies transactions to the world state.
///
/// Implementations must leave the state untouched when they reject, and must
/// consume exactly the receipt's `gas_used` when they accept.  A transaction
/// that doesn't fit the given budgets has to be rejected.
pub trait TxApplier {
    /// Revision-specific setup run once per block before the first
    /// transaction.
    fn system_call(&mut self, state: &mut WorldState, env: BlockEnv<'_>)
        -> Result<(), SystemCallError>;

    /// Applies `tx` on top of `state`.
    fn apply(
        &mut self,
        state: &mut WorldState,
        env: BlockEnv<'_>,
        tx: &Transaction,
        budgets: Budgets,
    ) -> TxOutcome;
}

/// Applies block rewards and withdrawals once all transactions are done.
pub trait BlockFinalizer {
    fn finalize(
        &self,
        state: &mut WorldState,
        rev: Revision,
        coinbase: Address,
        reward: Option<u64>,
        ommers: &[Ommer],
        withdrawals: &[Withdrawal],
    ) -> Result<(), FinalizeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_charge() {
        let mut b = Budgets::new(100, 10);
        assert_eq!(b.charge(40, 10), Some(()));
        assert_eq!(b, Budgets::new(60, 0));
    }

    #[test]
    fn test_budget_overrun_leaves_budget_intact() {
        let mut b = Budgets::new(100, 10);
        assert_eq!(b.charge(101, 0), None);
        assert_eq!(b.charge(1, 11), None);
        assert_eq!(b, Budgets::new(100, 10));
    }
}
