//! State replay
//!
//! Folds committed blocks into a fresh inventory, in index order, skipping
//! genesis. Replaying the same prefix always yields the same projection, and
//! the validator uses this same fold, so live validation and time travel
//! can never disagree.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chain::timestamp::{format_timestamp, parse_cutoff};
use crate::chain::Block;
use crate::error::{LedgerError, Result};
use crate::state::Inventory;
use crate::validation::apply_assume_valid;

/// Projection at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayResult {
    pub inventory: Inventory,
    /// Non-genesis blocks folded before the cutoff
    pub transaction_count: u64,
}

/// Rebuild the current inventory from the whole chain
pub fn rebuild(blocks: &[Block]) -> Inventory {
    let mut inventory = Inventory::new();
    for block in blocks.iter().filter(|b| !b.is_genesis()) {
        apply_assume_valid(&block.transaction, &mut inventory);
    }
    inventory
}

/// Rebuild the inventory as it stood at `cutoff`.
///
/// Stops at the first block stamped strictly after the cutoff; blocks are
/// expected in ascending index (and therefore time) order.
pub fn rebuild_until(blocks: &[Block], cutoff: &DateTime<Utc>) -> ReplayResult {
    let mut inventory = Inventory::new();
    let mut transaction_count = 0;

    for block in blocks.iter().filter(|b| !b.is_genesis()) {
        if block.timestamp > *cutoff {
            break;
        }
        apply_assume_valid(&block.transaction, &mut inventory);
        transaction_count += 1;
    }

    ReplayResult {
        inventory,
        transaction_count,
    }
}

/// [`rebuild_until`] with the cutoff given as text (RFC 3339 or `YYYY-MM-DD`)
pub fn rebuild_state_at(blocks: &[Block], cutoff: &str) -> Result<ReplayResult> {
    let instant =
        parse_cutoff(cutoff).ok_or_else(|| LedgerError::InvalidTimestamp(cutoff.to_string()))?;
    Ok(rebuild_until(blocks, &instant))
}

/// Headline figures of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotKpis {
    pub total_value: f64,
    pub total_units: u64,
    pub transaction_count: u64,
}

/// Time-travel view of the inventory, ready to serialize
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub snapshot_time: String,
    pub kpis: SnapshotKpis,
    pub inventory: Inventory,
}

impl Snapshot {
    pub fn at(blocks: &[Block], cutoff: &DateTime<Utc>) -> Self {
        let ReplayResult {
            inventory,
            transaction_count,
        } = rebuild_until(blocks, cutoff);

        Snapshot {
            snapshot_time: format_timestamp(cutoff),
            kpis: SnapshotKpis {
                total_value: inventory.total_value(),
                total_units: inventory.total_units(),
                transaction_count,
            },
            inventory,
        }
    }

    /// Snapshot for a cutoff given as text. `snapshot_time` echoes the
    /// caller's text rather than the normalized instant.
    pub fn requested(blocks: &[Block], cutoff: &str) -> Result<Self> {
        let instant = parse_cutoff(cutoff)
            .ok_or_else(|| LedgerError::InvalidTimestamp(cutoff.to_string()))?;
        Ok(Snapshot {
            snapshot_time: cutoff.to_string(),
            ..Snapshot::at(blocks, &instant)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{create_block_at, create_genesis_block};
    use crate::validation::Transaction;
    use chrono::{Duration, TimeZone};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn chain() -> Vec<Block> {
        let genesis = create_block_at(0, t(0), Transaction::genesis(), "0").unwrap();
        let b1 = create_block_at(
            1,
            t(10),
            Transaction::create_item("SKU-1", "Widget", 10, "Warehouse").with_price(3.0),
            &genesis.hash,
        )
        .unwrap();
        let b2 = create_block_at(
            2,
            t(20),
            Transaction::move_stock("SKU-1", 4, "Warehouse", "Retailer"),
            &b1.hash,
        )
        .unwrap();
        vec![genesis, b1, b2]
    }

    #[test]
    fn test_full_rebuild() {
        let inventory = rebuild(&chain());
        assert_eq!(inventory.quantity("SKU-1", "Warehouse"), 6);
        assert_eq!(inventory.quantity("SKU-1", "Retailer"), 4);
    }

    #[test]
    fn test_cutoff_between_blocks() {
        let result = rebuild_until(&chain(), &t(15));
        assert_eq!(result.transaction_count, 1);
        assert_eq!(result.inventory.quantity("SKU-1", "Warehouse"), 10);
        assert_eq!(result.inventory.quantity("SKU-1", "Retailer"), 0);
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let result = rebuild_until(&chain(), &t(20));
        assert_eq!(result.transaction_count, 2);
        assert_eq!(result.inventory, rebuild(&chain()));
    }

    #[test]
    fn test_cutoff_before_first_transaction() {
        let result = rebuild_until(&chain(), &t(5));
        assert_eq!(result.transaction_count, 0);
        assert!(result.inventory.is_empty());
    }

    #[test]
    fn test_genesis_content_is_ignored() {
        let mut blocks = chain();
        blocks[0].transaction = Transaction::create_item("SKU-X", "Ghost", 99, "Nowhere");
        assert_eq!(rebuild(&blocks), rebuild(&chain()));
    }

    #[test]
    fn test_text_cutoff() {
        let result = rebuild_state_at(&chain(), "2024-01-15T10:15:00.000Z").unwrap();
        assert_eq!(result.transaction_count, 1);

        let result = rebuild_state_at(&chain(), "2024-01-14").unwrap();
        assert_eq!(result.transaction_count, 0);

        assert!(matches!(
            rebuild_state_at(&chain(), "not a time"),
            Err(LedgerError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_genesis_only_chain() {
        let blocks = vec![create_genesis_block().unwrap()];
        assert!(rebuild(&blocks).is_empty());
        assert_eq!(rebuild_until(&blocks, &Utc::now()).transaction_count, 0);
    }

    #[test]
    fn test_snapshot_kpis() {
        let snapshot = Snapshot::at(&chain(), &t(30));
        assert_eq!(snapshot.snapshot_time, "2024-01-15T10:30:00.000Z");
        assert_eq!(snapshot.kpis.total_units, 10);
        assert_eq!(snapshot.kpis.transaction_count, 2);
        assert!((snapshot.kpis.total_value - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_requested_snapshot_echoes_cutoff_text() {
        let snapshot = Snapshot::requested(&chain(), "2024-01-15T12:30:00.000+02:00").unwrap();
        assert_eq!(snapshot.snapshot_time, "2024-01-15T12:30:00.000+02:00");
        assert_eq!(
            snapshot,
            Snapshot {
                snapshot_time: "2024-01-15T12:30:00.000+02:00".into(),
                ..Snapshot::at(&chain(), &t(30))
            }
        );
        assert!(Snapshot::requested(&chain(), "yesterday").is_err());
    }
}
