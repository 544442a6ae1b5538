//! Admission of new transactions
//!
//! The only gate before a transaction becomes a block. It must be handed the
//! full, freshly read chain every time. No projection is cached between
//! submissions.

use log::debug;
use serde::Serialize;

use crate::chain::Block;
use crate::state::rebuild;
use crate::validation::{apply_or_reject, Rejection, Transaction};

/// Outcome of validating a candidate transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl ValidationOutcome {
    pub fn accepted() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn rejected(rejection: &Rejection) -> Self {
        Self {
            success: false,
            error: Some(rejection.to_string()),
        }
    }
}

impl From<Result<(), Rejection>> for ValidationOutcome {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Self::accepted(),
            Err(rejection) => Self::rejected(&rejection),
        }
    }
}

/// Replay `existing_blocks` and apply the candidate strictly on top
pub fn check_transaction(tx: &Transaction, existing_blocks: &[Block]) -> Result<(), Rejection> {
    let mut inventory = rebuild(existing_blocks);
    let result = apply_or_reject(tx, &mut inventory);
    if let Err(rejection) = &result {
        debug!("Rejected {} against {} blocks: {}", tx.tx_type(), existing_blocks.len(), rejection);
    }
    result
}

/// [`check_transaction`] shaped as a `{ success, error }` record
pub fn validate_transaction(tx: &Transaction, existing_blocks: &[Block]) -> ValidationOutcome {
    check_transaction(tx, existing_blocks).into()
}
