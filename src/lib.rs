//! BIMS Ledger Core Library
//!
//! An append-only, hash-linked transaction ledger that is the single source
//! of truth for an inventory. The current inventory ("world state") is never
//! stored; it is rebuilt by replaying the chain, either in full or up to a
//! point in time.

pub mod analytics;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod node;
pub mod state;
pub mod storage;
pub mod validation;

pub use chain::{create_block, create_genesis_block, is_chain_valid, Block};
pub use error::{LedgerError, Result};
pub use node::{Ledger, SubmitOutcome};
pub use state::{rebuild, rebuild_state_at, Inventory, Product, ReplayResult, Snapshot};
pub use validation::{
    process_transaction, validate_transaction, Rejection, Transaction, TxKind, ValidationOutcome,
};

/// Protocol constants - hard-coded, never configurable
pub mod constants {
    /// `previousHash` carried by the genesis block
    pub const GENESIS_PREVIOUS_HASH: &str = "0";

    /// Index of the genesis block
    pub const GENESIS_INDEX: u64 = 0;

    /// Category assigned when an item is created without one
    pub const DEFAULT_CATEGORY: &str = "Uncategorized";

    /// Anomaly rules: earliest and latest UTC hour considered normal
    pub const BUSINESS_HOURS_START: u32 = 6;
    pub const BUSINESS_HOURS_END: u32 = 22;

    /// Anomaly rules: standard deviations above the mean that flag an outlier
    pub const OUTLIER_SIGMA: f64 = 3.0;

    /// Anomaly rules: quantities at or below this are never outliers
    pub const OUTLIER_MIN_QUANTITY: u64 = 10;

    /// Location names used by the logistics anomaly rule
    pub const SUPPLIER_LOCATION: &str = "Supplier";
    pub const RETAILER_LOCATION: &str = "Retailer";
}
