//! In-memory block store with the same ordering rules as the database

use std::sync::{Mutex, MutexGuard};

use super::BlockStore;
use crate::chain::Block;
use crate::error::{LedgerError, Result};

#[derive(Debug, Default)]
pub struct MemoryStore {
    blocks: Mutex<Vec<Block>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing chain, bypassing ordering checks
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks: Mutex::new(blocks),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Block>>> {
        self.blocks
            .lock()
            .map_err(|_| LedgerError::Storage("block store lock poisoned".into()))
    }
}

impl BlockStore for MemoryStore {
    fn load_chain(&self) -> Result<Vec<Block>> {
        Ok(self.lock()?.clone())
    }

    fn get_block(&self, index: u64) -> Result<Option<Block>> {
        Ok(self.lock()?.iter().find(|b| b.index == index).cloned())
    }

    fn insert_block(&self, block: &Block) -> Result<()> {
        let mut blocks = self.lock()?;
        let next = blocks.len() as u64;
        if block.index < next {
            return Err(LedgerError::IndexConflict(block.index));
        }
        if block.index > next {
            return Err(LedgerError::OutOfOrder { index: block.index });
        }
        blocks.push(block.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}
