//! Fatal and structural errors
//!
//! Ordinary transaction rejections are not errors; they travel as data
//! (see [`crate::validation::Rejection`]). Everything here means the caller
//! cannot safely proceed with the current request.

use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Chain is empty")]
    EmptyChain,
    #[error("CRITICAL: block {0} is missing its hash. Chain is corrupt.")]
    MissingHash(u64),
    #[error("Block index {0} is already taken")]
    IndexConflict(u64),
    #[error("Block index {index} cannot be appended: predecessor is missing")]
    OutOfOrder { index: u64 },
    #[error("Gave up appending after {0} index conflicts")]
    AppendContention(u32),
}

impl LedgerError {
    /// Whether another writer got to the index first and the append may be retried
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::IndexConflict(_))
    }
}
