//! Block-level system contract updates.
//!
//! Stands in for the system calls a full client would make into the
//! beacon-roots (EIP-4788) and history-storage (EIP-2935) contracts.  Only the
//! storage writes those contracts perform are reproduced, and only when the
//! contract is deployed in the pre-state.

use alloy_primitives::{address, Address, B256, U256};
use t8n_primitives::revision::Revision;
use t8n_state::WorldState;
use tracing::*;

use crate::{errors::SystemCallError, traits::BlockEnv};

pub const BEACON_ROOTS_ADDRESS: Address = address!("000F3df6D732807Ef1319fB7B8bB8522d0Beac02");
pub const HISTORY_STORAGE_ADDRESS: Address = address!("0000F90827F1C53a10cb7A02335B175320002935");

/// Ring buffer length of the beacon-roots contract.
pub const HISTORY_BUFFER_LENGTH: u64 = 8191;

/// Ring buffer length of the history-storage contract.
pub const HISTORY_SERVE_WINDOW: u64 = 8191;

/// Runs the system updates enabled at `env.rev`.
pub fn apply_system_updates(
    state: &mut WorldState,
    env: BlockEnv<'_>,
) -> Result<(), SystemCallError> {
    if env.rev.is_enabled_in(Revision::Cancun) {
        store_beacon_root(state, env);
    }

    if env.rev.is_enabled_in(Revision::Prague) {
        store_parent_hash(state, env)?;
    }

    Ok(())
}

fn is_deployed(state: &WorldState, addr: &Address) -> bool {
    state.get(addr).is_some_and(|a| a.has_code())
}

fn word(hash: B256) -> U256 {
    U256::from_be_bytes(hash.0)
}

fn store_beacon_root(state: &mut WorldState, env: BlockEnv<'_>) {
    if !is_deployed(state, &BEACON_ROOTS_ADDRESS) {
        return;
    }

    let timestamp = env.block.timestamp;
    let root = env.block.parent_beacon_block_root;
    let slot = timestamp % HISTORY_BUFFER_LENGTH;

    let contract = state.touch(BEACON_ROOTS_ADDRESS);
    contract.set_storage(U256::from(slot), U256::from(timestamp));
    contract.set_storage(U256::from(slot + HISTORY_BUFFER_LENGTH), word(root));
    debug!(%timestamp, %root, "stored parent beacon root");
}

fn store_parent_hash(state: &mut WorldState, env: BlockEnv<'_>) -> Result<(), SystemCallError> {
    if env.block.number == 0 || !is_deployed(state, &HISTORY_STORAGE_ADDRESS) {
        return Ok(());
    }

    let parent_number = env.block.number - 1;
    let parent_hash = env
        .hashes
        .get(parent_number)
        .ok_or(SystemCallError::MissingBlockHash(parent_number))?;

    let slot = parent_number % HISTORY_SERVE_WINDOW;
    state
        .touch(HISTORY_STORAGE_ADDRESS)
        .set_storage(U256::from(slot), word(parent_hash));
    debug!(%parent_number, %parent_hash, "stored parent block hash");
    Ok(())
}
