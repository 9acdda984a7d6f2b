//! Pre-state sanity checks run before a transition starts.

use t8n_primitives::revision::Revision;

use crate::{errors::StateError, world::WorldState};

/// Prefix reserved by EIP-3541.
const RESERVED_CODE_PREFIX: u8 = 0xef;

/// EIP-7702 delegation designator, the one allowed use of the prefix.
const DELEGATION_PREFIX: [u8; 3] = [0xef, 0x01, 0x00];

/// Checks the pre-state is well formed for `rev`.
pub fn validate_state(state: &WorldState, rev: Revision) -> Result<(), StateError> {
    for (addr, acct) in state.iter() {
        if acct.nonce == u64::MAX {
            return Err(StateError::NonceMaxValue(*addr));
        }

        if let Some((slot, _)) = acct.storage.iter().find(|(_, v)| v.is_zero()) {
            return Err(StateError::ZeroStorageValue(*addr, *slot));
        }

        if rev.is_enabled_in(Revision::London) && acct.code.first() == Some(&RESERVED_CODE_PREFIX) {
            let delegated =
                rev.is_enabled_in(Revision::Prague) && acct.code.starts_with(&DELEGATION_PREFIX);
            if !delegated {
                return Err(StateError::ReservedCodePrefix(*addr));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, Bytes, U256};

    use super::*;
    use crate::account::Account;

    fn state_with(acct: Account) -> (Address, WorldState) {
        let addr = Address::repeat_byte(0x42);
        let mut state = WorldState::default();
        state.insert(addr, acct);
        (addr, state)
    }

    #[test]
    fn test_valid_state() {
        let (_, state) = state_with(Account {
            nonce: 1,
            balance: U256::from(1),
            ..Default::default()
        });
        assert_eq!(validate_state(&state, Revision::Cancun), Ok(()));
    }

    #[test]
    fn test_nonce_max_rejected() {
        let (addr, state) = state_with(Account {
            nonce: u64::MAX,
            ..Default::default()
        });
        assert_eq!(
            validate_state(&state, Revision::Frontier),
            Err(StateError::NonceMaxValue(addr))
        );
    }

    #[test]
    fn test_zero_storage_rejected() {
        let mut acct = Account::default();
        acct.storage.insert(U256::from(7), U256::ZERO);
        let (addr, state) = state_with(acct);
        assert_eq!(
            validate_state(&state, Revision::Cancun),
            Err(StateError::ZeroStorageValue(addr, U256::from(7)))
        );
    }

    #[test]
    fn test_ef_code_gated_by_revision() {
        let (addr, state) = state_with(Account {
            code: Bytes::from_static(&[0xef, 0x00]),
            ..Default::default()
        });
        assert_eq!(validate_state(&state, Revision::Berlin), Ok(()));
        assert_eq!(
            validate_state(&state, Revision::London),
            Err(StateError::ReservedCodePrefix(addr))
        );
    }

    #[test]
    fn test_delegation_allowed_from_prague() {
        let mut code = DELEGATION_PREFIX.to_vec();
        code.extend_from_slice(&[0x11; 20]);
        let (_, state) = state_with(Account {
            code: code.into(),
            ..Default::default()
        });
        assert!(validate_state(&state, Revision::Cancun).is_err());
        assert_eq!(validate_state(&state, Revision::Prague), Ok(()));
    }
}
