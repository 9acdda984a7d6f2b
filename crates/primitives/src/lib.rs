//! Collection of protocol data types shared by the transition crates.
//!
//! Nothing in here executes anything.  These are the values the driver moves
//! between its collaborators: revisions, block context, transactions and the
//! receipts built from them.

pub mod block;
pub mod constants;
pub mod errors;
pub mod receipt;
pub mod revision;
pub mod tx;

pub mod prelude;
