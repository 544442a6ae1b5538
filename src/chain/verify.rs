//! Chain integrity verification
//!
//! Pure functions that walk a block sequence checking the link to the
//! predecessor and the block's own digest. This is the only tamper
//! detection the ledger has; it can be re-run at any time against the full
//! persisted chain.

use log::error;
use thiserror::Error;

use crate::chain::Block;

/// First integrity violation found in a chain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainFault {
    #[error("previousHash mismatch at block {index}: expected {expected}, found {found}")]
    BrokenLink {
        index: u64,
        expected: String,
        found: String,
    },
    #[error("hash mismatch at block {index}: stored {stored}, recomputed {recomputed}")]
    DigestMismatch {
        index: u64,
        stored: String,
        recomputed: String,
    },
    #[error("block {index} could not be re-serialized: {reason}")]
    Unhashable { index: u64, reason: String },
}

/// Walk the chain from position 1 and report the first violation.
///
/// Stored digests are compared with incidental whitespace trimmed, since
/// storage round-trips may pad them.
pub fn verify_chain(blocks: &[Block]) -> Result<(), ChainFault> {
    for pair in blocks.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        if current.previous_hash.trim() != previous.hash.trim() {
            return Err(ChainFault::BrokenLink {
                index: current.index,
                expected: previous.hash.trim().to_string(),
                found: current.previous_hash.trim().to_string(),
            });
        }

        let recomputed = current
            .recompute_hash()
            .map_err(|e| ChainFault::Unhashable {
                index: current.index,
                reason: e.to_string(),
            })?
            .to_hex();

        if current.hash.trim() != recomputed {
            return Err(ChainFault::DigestMismatch {
                index: current.index,
                stored: current.hash.trim().to_string(),
                recomputed,
            });
        }
    }

    Ok(())
}

/// True only if every block after genesis passes both checks
pub fn is_chain_valid(blocks: &[Block]) -> bool {
    match verify_chain(blocks) {
        Ok(()) => true,
        Err(fault) => {
            error!("Chain invalid: {}", fault);
            false
        }
    }
}
