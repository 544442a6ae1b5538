//! Low-stock predictions
//!
//! Estimates how many days each item's stock will last from its recent
//! STOCK_OUT velocity.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::chain::Block;
use crate::state::rebuild_until;
use crate::validation::TxKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockPrediction {
    #[serde(rename = "id")]
    pub sku: String,
    pub name: String,
    pub stock: u64,
    pub days_to_empty: u64,
}

/// Items that will run out within `threshold_days` at the rate they left
/// stock over the last `window_days`. Soonest first.
pub fn low_stock_predictions(
    blocks: &[Block],
    now: &DateTime<Utc>,
    window_days: u32,
    threshold_days: u64,
) -> Vec<LowStockPrediction> {
    if blocks.len() <= 1 || window_days == 0 {
        return Vec::new();
    }

    let inventory = rebuild_until(blocks, now).inventory;
    let window_start = *now - Duration::days(i64::from(window_days));

    let mut stock_out: HashMap<&str, u64> = HashMap::new();
    let in_window = |b: &&Block| b.timestamp > window_start && b.timestamp <= *now;
    for block in blocks.iter().filter(in_window) {
        if let TxKind::StockOut {
            item_sku, quantity, ..
        } = &block.transaction.kind
        {
            let sold = stock_out.entry(item_sku.as_str()).or_insert(0);
            *sold = sold.saturating_add(*quantity);
        }
    }

    let mut predictions: Vec<LowStockPrediction> = inventory
        .iter()
        .filter_map(|(sku, product)| {
            let sold = *stock_out.get(sku.as_str())?;
            if sold == 0 {
                return None;
            }
            let stock = product.total_stock();
            // stock / (sold / window), kept in integers
            let days_to_empty = stock.saturating_mul(u64::from(window_days)) / sold;
            (days_to_empty <= threshold_days).then(|| LowStockPrediction {
                sku: sku.clone(),
                name: product.product_name.clone(),
                stock,
                days_to_empty,
            })
        })
        .collect();

    predictions.sort_by(|a, b| {
        a.days_to_empty
            .cmp(&b.days_to_empty)
            .then_with(|| a.sku.cmp(&b.sku))
    });
    predictions
}
