//! In-memory stores. Each store owns its own synchronization and is the
//! single authority for its data within the process.

pub mod carts;
pub mod ledger;

pub use carts::CartStore;
pub use ledger::{CheckoutLedger, CheckoutOutcome};
