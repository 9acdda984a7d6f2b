//! World state container the transition mutates.
//!
//! A plain ordered map of accounts, owned by whoever drives the block.  Root
//! computation is delegated to `t8n-mpt`.

pub mod account;
pub mod errors;
pub mod validation;
pub mod world;

pub use account::Account;
pub use errors::StateError;
pub use validation::validate_state;
pub use world::WorldState;
