//! Block rewards and withdrawals.

use alloy_primitives::{Address, U256};
use t8n_primitives::prelude::*;
use t8n_state::WorldState;
use tracing::*;

use crate::{errors::FinalizeError, traits::BlockFinalizer};

/// Credits the miner and ommer rewards, then the withdrawals.
#[derive(Copy, Clone, Debug, Default)]
pub struct RewardFinalizer;

fn credit(state: &mut WorldState, addr: Address, amount: U256) -> Result<(), FinalizeError> {
    let acct = state.touch(addr);
    acct.balance = acct
        .balance
        .checked_add(amount)
        .ok_or(FinalizeError::BalanceOverflow(addr))?;
    Ok(())
}

impl BlockFinalizer for RewardFinalizer {
    fn finalize(
        &self,
        state: &mut WorldState,
        rev: Revision,
        coinbase: Address,
        reward: Option<u64>,
        ommers: &[Ommer],
        withdrawals: &[Withdrawal],
    ) -> Result<(), FinalizeError> {
        if let Some(reward) = reward {
            if reward % 32 != 0 {
                return Err(FinalizeError::RewardNotDivisible(reward));
            }

            // Validate up front so a bad ommer leaves the state alone.
            if let Some(bad) = ommers.iter().find(|o| !(1..=7).contains(&o.delta)) {
                return Err(FinalizeError::InvalidOmmerDelta(bad.delta));
            }

            let reward = U256::from(reward);
            let miner_reward = reward + reward / U256::from(32) * U256::from(ommers.len());
            credit(state, coinbase, miner_reward)?;
            debug!(%coinbase, %miner_reward, "credited block reward");

            for ommer in ommers {
                let ommer_reward = reward / U256::from(8) * U256::from(8 - ommer.delta);
                credit(state, ommer.beneficiary, ommer_reward)?;
                trace!(beneficiary = %ommer.beneficiary, %ommer_reward, "credited ommer reward");
            }
        }

        for w in withdrawals {
            credit(state, w.address, w.amount_wei())?;
            trace!(index = w.index, address = %w.address, amount = w.amount, "applied withdrawal");
        }

        state.clear_empty_touched(rev);
        Ok(())
    }
}
