//! Database persistence layer using Sled
//!
//! Blocks are stored as JSON under their big-endian index, so iterating the
//! tree yields the chain in order.

use log::debug;
use sled::transaction::{abort, TransactionError};
use sled::{Db, Tree};
use std::path::Path;

use super::BlockStore;
use crate::chain::Block;
use crate::error::{LedgerError, Result};

/// Database wrapper
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    blocks_tree: Tree,
}

const BLOCKS_TREE: &str = "blocks";

fn block_key(index: u64) -> [u8; 8] {
    index.to_be_bytes()
}

fn decode_block(bytes: &[u8]) -> Result<Block> {
    Ok(serde_json::from_slice(bytes)?)
}

impl LedgerDb {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        let blocks_tree = db.open_tree(BLOCKS_TREE)?;
        Ok(Self { db, blocks_tree })
    }

    /// Open a throwaway database that is removed when dropped
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        let blocks_tree = db.open_tree(BLOCKS_TREE)?;
        Ok(Self { db, blocks_tree })
    }

    /// Number of stored blocks
    pub fn len(&self) -> usize {
        self.blocks_tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks_tree.is_empty()
    }
}

impl BlockStore for LedgerDb {
    fn load_chain(&self) -> Result<Vec<Block>> {
        let mut blocks = Vec::with_capacity(self.blocks_tree.len());
        for item in self.blocks_tree.iter() {
            let (_, value) = item?;
            blocks.push(decode_block(&value)?);
        }
        Ok(blocks)
    }

    fn get_block(&self, index: u64) -> Result<Option<Block>> {
        match self.blocks_tree.get(block_key(index))? {
            Some(bytes) => Ok(Some(decode_block(&bytes)?)),
            None => Ok(None),
        }
    }

    fn insert_block(&self, block: &Block) -> Result<()> {
        let index = block.index;
        let key = block_key(index);
        let value = serde_json::to_vec(block)?;

        let outcome = self.blocks_tree.transaction(|tree| {
            if tree.get(&key[..])?.is_some() {
                return abort(LedgerError::IndexConflict(index));
            }
            if index > 0 && tree.get(&block_key(index - 1)[..])?.is_none() {
                return abort(LedgerError::OutOfOrder { index });
            }
            tree.insert(&key[..], value.as_slice())?;
            Ok(())
        });

        match outcome {
            Ok(()) => {}
            Err(TransactionError::Abort(e)) => return Err(e),
            Err(TransactionError::Storage(e)) => return Err(e.into()),
        }

        self.db.flush()?;
        debug!("Stored block {} ({} bytes)", index, value.len());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.blocks_tree.clear()?;
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{create_block, create_genesis_block};
    use crate::validation::Transaction;

    #[test]
    fn test_insert_and_load_in_order() {
        let db = LedgerDb::temporary().unwrap();
        let genesis = create_genesis_block().unwrap();
        let created = Transaction::create_item("SKU-1", "Widget", 1, "Warehouse");
        let b1 = create_block(1, created, &genesis.hash).unwrap();

        db.insert_block(&genesis).unwrap();
        db.insert_block(&b1).unwrap();

        let chain = db.load_chain().unwrap();
        assert_eq!(chain, vec![genesis.clone(), b1]);
        assert_eq!(db.get_block(0).unwrap(), Some(genesis));
        assert_eq!(db.get_block(7).unwrap(), None);
    }

    #[test]
    fn test_duplicate_index_conflicts() {
        let db = LedgerDb::temporary().unwrap();
        db.insert_block(&create_genesis_block().unwrap()).unwrap();
        let err = db.insert_block(&create_genesis_block().unwrap()).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_gap_is_refused() {
        let db = LedgerDb::temporary().unwrap();
        db.insert_block(&create_genesis_block().unwrap()).unwrap();
        let orphan = create_block(2, Transaction::stock_in("SKU-1", 1, "Warehouse"), "x").unwrap();
        assert!(matches!(
            db.insert_block(&orphan),
            Err(LedgerError::OutOfOrder { index: 2 })
        ));
    }

    #[test]
    fn test_clear_empties_the_tree() {
        let db = LedgerDb::temporary().unwrap();
        db.insert_block(&create_genesis_block().unwrap()).unwrap();
        db.clear().unwrap();
        assert!(db.is_empty());
        assert!(db.load_chain().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let genesis = create_genesis_block().unwrap();
        {
            let db = LedgerDb::open(dir.path()).unwrap();
            db.insert_block(&genesis).unwrap();
        }
        let db = LedgerDb::open(dir.path()).unwrap();
        assert_eq!(db.load_chain().unwrap(), vec![genesis]);
    }
}
