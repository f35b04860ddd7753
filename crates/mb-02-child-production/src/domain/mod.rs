//! Child block assembly rules.

mod assembly;

pub use assembly::{assemble_block, select_transactions, transactions_root};
