//! Node module - the ledger service over a block store

mod ledger;

pub use ledger::*;
