//! SHA-256 hashing over canonical JSON
//!
//! Every digest in the ledger is taken over a key-sorted, compact JSON
//! rendering so that two records with the same content hash identically
//! no matter in which order their fields were inserted.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// 32-byte SHA-256 output
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Convert to lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash arbitrary bytes using SHA-256
pub fn hash_bytes(data: &[u8]) -> Hash {
    Hash(Sha256::digest(data).into())
}

/// Rebuild a JSON value with object keys sorted at every depth.
///
/// Arrays keep their element order; scalars are copied as-is.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Compact canonical rendering of a JSON value
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

/// Digest of the canonical rendering of a JSON value
pub fn calculate_hash(value: &Value) -> Hash {
    hash_bytes(canonical_json(value).as_bytes())
}
