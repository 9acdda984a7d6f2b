//! Block transition driver.
//!
//! Applies a block's transactions through a [`t8n_exec::TxApplier`], closes
//! the block with a [`t8n_exec::BlockFinalizer`] and aggregates the roots,
//! bloom and hashes a block header commits to.

pub mod aggregate;
pub mod errors;
pub mod trace;
pub mod transition;

pub use aggregate::{ReceiptRecord, ResultRecord};
pub use errors::TsnError;
pub use transition::{process_block, BlockExecution, TransitionOutput, TransitionParams};
