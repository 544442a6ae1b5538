//! Transaction processor - the state-transition function
//!
//! Two entry points share one set of rules:
//! - [`apply_or_reject`] for transactions nobody has admitted yet
//! - [`apply_assume_valid`] for blocks already committed to the chain
//!
//! Neither panics or returns an error for an ordinary rejection.

use log::debug;
use thiserror::Error;

use crate::constants::DEFAULT_CATEGORY;
use crate::state::{Inventory, Product};
use crate::validation::{Transaction, TxKind};

/// Why a transaction was not applied. The display text is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Product {0} not found.")]
    UnknownProduct(String),
    #[error("Product SKU {0} already exists.")]
    DuplicateSku(String),
    #[error("Cannot move item to its current location.")]
    SameLocation,
    #[error("Insufficient stock at {location}. Only {available} available.")]
    InsufficientStock { location: String, available: u64 },
    #[error("Stock at {0} would exceed the maximum quantity.")]
    QuantityOverflow(String),
    #[error("Quantity must be a positive integer.")]
    NonPositiveQuantity,
    #[error("Price cannot be negative.")]
    NegativePrice,
    #[error("Genesis transactions cannot be submitted.")]
    GenesisNotAllowed,
}

/// How much a transaction is trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trust {
    /// Not yet on the chain: every rule is enforced
    Untrusted,
    /// Already committed: replayed leniently, never reported
    Committed,
}

/// Apply a candidate transaction, or explain why it cannot be applied.
/// The inventory is only mutated on `Ok`.
pub fn apply_or_reject(tx: &Transaction, inventory: &mut Inventory) -> Result<(), Rejection> {
    apply(tx, inventory, Trust::Untrusted)
}

/// Replay a committed transaction. Returns whether it changed the
/// inventory; a committed CREATE_ITEM for an existing SKU merges its
/// quantity instead of failing.
pub fn apply_assume_valid(tx: &Transaction, inventory: &mut Inventory) -> bool {
    match apply(tx, inventory, Trust::Committed) {
        Ok(()) => !tx.is_genesis(),
        Err(rejection) => {
            debug!("Skipping committed {} during replay: {}", tx.tx_type(), rejection);
            false
        }
    }
}

/// Callback-style entry point: returns true when applied; on rejection of
/// an untrusted transaction, hands the reason to `on_error`.
pub fn process_transaction<F>(
    tx: &Transaction,
    inventory: &mut Inventory,
    trust: Trust,
    mut on_error: F,
) -> bool
where
    F: FnMut(&Rejection),
{
    match trust {
        Trust::Committed => apply_assume_valid(tx, inventory),
        Trust::Untrusted => match apply_or_reject(tx, inventory) {
            Ok(()) => true,
            Err(rejection) => {
                on_error(&rejection);
                false
            }
        },
    }
}

fn apply(tx: &Transaction, inventory: &mut Inventory, trust: Trust) -> Result<(), Rejection> {
    let strict = trust == Trust::Untrusted;

    if strict {
        check_preconditions(tx)?;
    }

    match &tx.kind {
        TxKind::Genesis => Ok(()),

        TxKind::CreateItem {
            item_sku,
            item_name,
            quantity,
            to_location,
            price,
            category,
        } => {
            if strict && inventory.contains(item_sku) {
                return Err(Rejection::DuplicateSku(item_sku.clone()));
            }
            let category = category
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_CATEGORY);
            let product = Product::new(item_name, price.unwrap_or(0.0), category);
            // a fresh product always has room; only a committed merge can overflow
            if !inventory
                .get_or_insert(item_sku, product)
                .credit(to_location, *quantity)
            {
                return Err(Rejection::QuantityOverflow(to_location.clone()));
            }
            Ok(())
        }

        TxKind::StockIn {
            item_sku,
            quantity,
            location,
        } => {
            let product = existing(inventory, item_sku)?;
            if !product.credit(location, *quantity) {
                return Err(Rejection::QuantityOverflow(location.clone()));
            }
            Ok(())
        }

        TxKind::StockOut {
            item_sku,
            quantity,
            location,
        } => {
            let product = existing(inventory, item_sku)?;
            if !product.debit(location, *quantity) {
                return Err(Rejection::InsufficientStock {
                    location: location.clone(),
                    available: product.quantity_at(location),
                });
            }
            Ok(())
        }

        TxKind::Move {
            item_sku,
            quantity,
            from_location,
            to_location,
        } => {
            let product = existing(inventory, item_sku)?;
            if from_location == to_location {
                return Err(Rejection::SameLocation);
            }
            if !product.has_room(to_location, *quantity) {
                return Err(Rejection::QuantityOverflow(to_location.clone()));
            }
            if !product.debit(from_location, *quantity) {
                return Err(Rejection::InsufficientStock {
                    location: from_location.clone(),
                    available: product.quantity_at(from_location),
                });
            }
            product.credit(to_location, *quantity);
            Ok(())
        }
    }
}

/// Shape checks that only apply to untrusted input
fn check_preconditions(tx: &Transaction) -> Result<(), Rejection> {
    if tx.is_genesis() {
        return Err(Rejection::GenesisNotAllowed);
    }
    if tx.quantity() == Some(0) {
        return Err(Rejection::NonPositiveQuantity);
    }
    if let TxKind::CreateItem { price: Some(price), .. } = &tx.kind {
        if price.is_nan() || *price < 0.0 {
            return Err(Rejection::NegativePrice);
        }
    }
    Ok(())
}

fn existing<'a>(inventory: &'a mut Inventory, sku: &str) -> Result<&'a mut Product, Rejection> {
    inventory
        .get_mut(sku)
        .ok_or_else(|| Rejection::UnknownProduct(sku.to_string()))
}
