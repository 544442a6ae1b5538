//! Storage module - where committed blocks live
//!
//! The chain's ordering guarantee rests on the store: an insert at an index
//! that is already taken, or whose predecessor is missing, must fail. That
//! is what lets two concurrent appenders race safely.

pub mod db;
pub mod memory;

pub use db::LedgerDb;
pub use memory::MemoryStore;

use crate::chain::Block;
use crate::error::Result;

/// Durable, index-ordered block storage
pub trait BlockStore {
    /// Every block, ascending by index
    fn load_chain(&self) -> Result<Vec<Block>>;

    /// A single block by index
    fn get_block(&self, index: u64) -> Result<Option<Block>>;

    /// Append a block. Fails with `IndexConflict` when the index is taken
    /// and with `OutOfOrder` when index - 1 is absent.
    fn insert_block(&self, block: &Block) -> Result<()>;

    /// Remove every block
    fn clear(&self) -> Result<()>;
}
