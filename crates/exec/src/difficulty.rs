//! Ethash block difficulty, Yellow Paper section 4.3.4.

use alloy_primitives::U256;
use t8n_primitives::revision::Revision;

/// Lower bound on difficulty.
pub const MIN_DIFFICULTY: u64 = 0x20000;

const BOMB_PERIOD: u64 = 100_000;

/// Number of blocks the difficulty bomb is pushed back by at `rev`.
fn bomb_delay(rev: Revision) -> u64 {
    match rev {
        Revision::Byzantium => 3_000_000,
        Revision::Constantinople | Revision::Petersburg | Revision::Istanbul => 5_000_000,
        Revision::Berlin => 9_000_000,
        Revision::London => 9_700_000,
        _ => 0,
    }
}

/// Computes the difficulty of the block following a parent with the given
/// properties.  Always zero from the merge on.
///
/// A timestamp not after the parent's counts as a zero interval, which yields
/// the largest upward adjustment.
pub fn calculate_difficulty(
    parent_difficulty: U256,
    parent_has_ommers: bool,
    parent_timestamp: u64,
    current_timestamp: u64,
    block_number: u64,
    rev: Revision,
) -> U256 {
    if rev.is_enabled_in(Revision::MERGE) {
        return U256::ZERO;
    }

    let timestamp_diff = i64::try_from(current_timestamp.saturating_sub(parent_timestamp))
        .unwrap_or(i64::MAX);

    let sigma: i64 = if rev.is_enabled_in(Revision::Byzantium) {
        let y = if parent_has_ommers { 2 } else { 1 };
        (y - timestamp_diff / 9).max(-99)
    } else if rev.is_enabled_in(Revision::Homestead) {
        (1 - timestamp_diff / 10).max(-99)
    } else if timestamp_diff < 13 {
        1
    } else {
        -1
    };

    let x = parent_difficulty / U256::from(2048);
    let adjustment = x * U256::from(sigma.unsigned_abs());
    let adjusted = if sigma >= 0 {
        parent_difficulty.saturating_add(adjustment)
    } else {
        parent_difficulty.saturating_sub(adjustment)
    };

    let fake_block_number = block_number.saturating_sub(bomb_delay(rev));
    let period = fake_block_number / BOMB_PERIOD;
    let bomb = if period >= 2 {
        U256::from(1) << (period - 2) as usize
    } else {
        U256::ZERO
    };

    adjusted
        .saturating_add(bomb)
        .max(U256::from(MIN_DIFFICULTY))
}
