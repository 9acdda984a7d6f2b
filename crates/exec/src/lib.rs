//! Execution collaborators of the block transition.
//!
//! The driver only sees the [`TxApplier`] and [`BlockFinalizer`] traits.  The
//! rest of this crate is a reference implementation of both that moves value
//! and charges intrinsic gas without interpreting bytecode, plus the ethash
//! difficulty formula used before the merge.

pub mod difficulty;
pub mod errors;
pub mod finalize;
pub mod gas;
pub mod system;
pub mod traits;
pub mod transfer;

pub use difficulty::calculate_difficulty;
pub use errors::{FinalizeError, SystemCallError, TxRejection};
pub use finalize::RewardFinalizer;
pub use traits::{BlockEnv, BlockFinalizer, Budgets, TxApplier, TxOutcome};
pub use transfer::TransferApplier;
