//! Block structure and block factory
//!
//! A block pairs one transaction with its position in the chain, the instant
//! it was created, the digest of its predecessor and its own digest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::timestamp::{self, format_timestamp};
use crate::constants::{GENESIS_INDEX, GENESIS_PREVIOUS_HASH};
use crate::crypto::{calculate_hash, canonicalize, Hash};
use crate::validation::Transaction;

/// An immutable, hash-linked ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Position in the chain; 0 is genesis
    pub index: u64,
    /// Creation instant, serialized in the exact form that was hashed
    #[serde(with = "timestamp::serde_millis")]
    pub timestamp: DateTime<Utc>,
    /// The operation this block commits
    pub transaction: Transaction,
    /// Hex digest of the predecessor, `"0"` for genesis
    pub previous_hash: String,
    /// Hex digest of this block's canonical data
    pub hash: String,
}

impl Block {
    /// Digest over `{index, previousHash, timestamp, transaction}` with the
    /// timestamp rendered canonically and the transaction key-sorted.
    pub fn compute_hash(
        index: u64,
        timestamp: &DateTime<Utc>,
        transaction: &Transaction,
        previous_hash: &str,
    ) -> Result<Hash, serde_json::Error> {
        let sorted_transaction = canonicalize(&transaction.to_value()?);
        let block_data = json!({
            "index": index,
            "timestamp": format_timestamp(timestamp),
            "transaction": sorted_transaction,
            "previousHash": previous_hash,
        });
        Ok(calculate_hash(&block_data))
    }

    /// Recompute this block's digest from its stored fields
    pub fn recompute_hash(&self) -> Result<Hash, serde_json::Error> {
        Self::compute_hash(self.index, &self.timestamp, &self.transaction, &self.previous_hash)
    }

    /// Check if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.index == GENESIS_INDEX
    }

    /// Canonical text of the timestamp
    pub fn timestamp_string(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// Build a block stamped with the current instant
pub fn create_block(
    index: u64,
    transaction: Transaction,
    previous_hash: &str,
) -> Result<Block, serde_json::Error> {
    create_block_at(index, timestamp::now(), transaction, previous_hash)
}

/// Build a block at an explicit instant.
///
/// The instant is truncated to milliseconds first, so the stored value and
/// the hashed text always agree.
pub fn create_block_at(
    index: u64,
    instant: DateTime<Utc>,
    transaction: Transaction,
    previous_hash: &str,
) -> Result<Block, serde_json::Error> {
    use chrono::SubsecRound;

    let instant = instant.trunc_subsecs(3);
    let hash = Block::compute_hash(index, &instant, &transaction, previous_hash)?;

    Ok(Block {
        index,
        timestamp: instant,
        transaction,
        previous_hash: previous_hash.to_string(),
        hash: hash.to_hex(),
    })
}

/// Create the genesis block
pub fn create_genesis_block() -> Result<Block, serde_json::Error> {
    create_block(GENESIS_INDEX, Transaction::genesis(), GENESIS_PREVIOUS_HASH)
}
