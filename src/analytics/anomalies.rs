//! Anomaly report
//!
//! Scans every committed transaction for three families of red flags:
//! business-rule violations, statistical outliers in quantity, and users
//! doing something their role has never done before.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::chain::Block;
use crate::constants::{
    BUSINESS_HOURS_END, BUSINESS_HOURS_START, OUTLIER_MIN_QUANTITY, OUTLIER_SIGMA,
    RETAILER_LOCATION, SUPPLIER_LOCATION,
};
use crate::validation::{TxKind, TxType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    #[serde(rename = "Inventory Manager")]
    InventoryManager,
    Auditor,
}

/// A user as known to the surrounding service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedBlock {
    pub block: Block,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalySummary {
    /// Distinct blocks flagged by any rule
    pub total_anomalies: usize,
    pub total_transactions: usize,
    pub percent_of_transactions_flagged: f64,
}

/// Flags per rule family, newest block first
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub summary: AnomalySummary,
    pub basic_anomalies: Vec<FlaggedBlock>,
    pub statistical_outliers: Vec<FlaggedBlock>,
    pub behavioral_anomalies: Vec<FlaggedBlock>,
}

#[derive(Debug, Clone, Copy)]
struct QuantityStats {
    mean: f64,
    std_dev: f64,
}

impl QuantityStats {
    fn of(values: &[u64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }

    fn threshold(&self) -> f64 {
        self.mean + OUTLIER_SIGMA * self.std_dev
    }
}

/// Run every rule over the non-genesis blocks of `blocks`
pub fn anomaly_report(blocks: &[Block], users: &[UserRecord]) -> AnomalyReport {
    let roles_by_name: HashMap<&str, Role> =
        users.iter().map(|u| (u.name.as_str(), u.role)).collect();
    let mut history: HashMap<u64, HashSet<TxType>> =
        users.iter().map(|u| (u.id, HashSet::new())).collect();

    let transactions: Vec<&Block> = blocks.iter().filter(|b| !b.is_genesis()).collect();

    let mut quantities: BTreeMap<TxType, Vec<u64>> = BTreeMap::new();
    for block in &transactions {
        if let Some(quantity) = block.transaction.quantity() {
            quantities
                .entry(block.transaction.tx_type())
                .or_default()
                .push(quantity);
        }
    }
    let stats: BTreeMap<TxType, QuantityStats> = quantities
        .iter()
        .filter_map(|(kind, values)| QuantityStats::of(values).map(|s| (*kind, s)))
        .collect();

    let mut basic_anomalies = Vec::new();
    let mut statistical_outliers = Vec::new();
    let mut behavioral_anomalies = Vec::new();

    for block in &transactions {
        let tx = &block.transaction;
        let tx_type = tx.tx_type();
        let role = tx
            .submitter
            .user_name
            .as_deref()
            .and_then(|name| roles_by_name.get(name).copied());

        let reasons = business_rule_reasons(block, role);
        if !reasons.is_empty() {
            basic_anomalies.push(FlaggedBlock {
                block: (*block).clone(),
                reasons,
            });
        }

        if let (Some(stat), Some(quantity)) = (stats.get(&tx_type), tx.quantity()) {
            if quantity as f64 > stat.threshold() && quantity > OUTLIER_MIN_QUANTITY {
                statistical_outliers.push(FlaggedBlock {
                    block: (*block).clone(),
                    reasons: vec![format!(
                        "Quantity ({quantity}) is a statistical outlier ( > 3x std. dev.) \
                         for {tx_type} transactions."
                    )],
                });
            }
        }

        let seen = tx.submitter.user_id.and_then(|id| history.get_mut(&id));
        if let Some(seen) = seen {
            if seen.insert(tx_type) && is_unusual_first(role, tx_type) {
                let user_name = tx.submitter.user_name.as_deref().unwrap_or("unknown");
                let role_name = role.map_or("unknown", role_label);
                behavioral_anomalies.push(FlaggedBlock {
                    block: (*block).clone(),
                    reasons: vec![format!(
                        "First time user '{user_name}' (Role: {role_name}) \
                         performed a '{tx_type}' action."
                    )],
                });
            }
        }
    }

    let flagged: HashSet<&str> = basic_anomalies
        .iter()
        .chain(&statistical_outliers)
        .chain(&behavioral_anomalies)
        .map(|f| f.block.hash.as_str())
        .collect();
    let total_anomalies = flagged.len();
    let total_transactions = transactions.len();
    let percent_of_transactions_flagged = if total_transactions == 0 {
        0.0
    } else {
        total_anomalies as f64 / total_transactions as f64 * 100.0
    };

    basic_anomalies.reverse();
    statistical_outliers.reverse();
    behavioral_anomalies.reverse();

    AnomalyReport {
        summary: AnomalySummary {
            total_anomalies,
            total_transactions,
            percent_of_transactions_flagged,
        },
        basic_anomalies,
        statistical_outliers,
        behavioral_anomalies,
    }
}

fn business_rule_reasons(block: &Block, role: Option<Role>) -> Vec<String> {
    let mut reasons = Vec::new();

    let hour = block.timestamp.hour();
    if !(BUSINESS_HOURS_START..=BUSINESS_HOURS_END).contains(&hour) {
        reasons.push(format!("Transaction occurred at an unusual time ({hour}:00 UTC)."));
    }

    if let TxKind::Move {
        from_location,
        to_location,
        ..
    } = &block.transaction.kind
    {
        if role == Some(Role::Admin) {
            reasons.push(
                "Logistics (MOVE) operation performed by an Admin, not a Manager.".to_string(),
            );
        }
        if from_location == SUPPLIER_LOCATION && to_location == RETAILER_LOCATION {
            reasons.push(
                "Logistics anomaly: Skipped Warehouse (Supplier -> Retailer).".to_string(),
            );
        }
    }

    reasons
}

/// Auditors should never transact; managers should never create items
fn is_unusual_first(role: Option<Role>, tx_type: TxType) -> bool {
    match role {
        Some(Role::Auditor) => true,
        Some(Role::InventoryManager) => tx_type == TxType::CreateItem,
        Some(Role::Admin) | None => false,
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Admin => "Admin",
        Role::InventoryManager => "Inventory Manager",
        Role::Auditor => "Auditor",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::create_block_at;
    use crate::validation::{Submitter, Transaction};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn users() -> Vec<UserRecord> {
        vec![
            UserRecord {
                id: 1,
                name: "Dr. Admin Ji".into(),
                role: Role::Admin,
            },
            UserRecord {
                id: 2,
                name: "Manager Babu".into(),
                role: Role::InventoryManager,
            },
            UserRecord {
                id: 3,
                name: "Auditor Saabji".into(),
                role: Role::Auditor,
            },
        ]
    }

    fn by(id: u64) -> Submitter {
        let user = users().into_iter().find(|u| u.id == id).unwrap();
        Submitter {
            user_id: Some(user.id),
            user_name: Some(user.name),
            employee_id: None,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn build(entries: Vec<(DateTime<Utc>, Transaction)>) -> Vec<Block> {
        let genesis_at = noon() - Duration::days(1);
        let mut blocks = vec![create_block_at(0, genesis_at, Transaction::genesis(), "0").unwrap()];
        for (i, (at, tx)) in entries.into_iter().enumerate() {
            let prev = blocks[i].hash.clone();
            blocks.push(create_block_at(i as u64 + 1, at, tx, &prev).unwrap());
        }
        blocks
    }

    #[test]
    fn test_clean_chain_has_no_anomalies() {
        let blocks = build(vec![
            (
                noon(),
                Transaction::create_item("SKU-1", "Widget", 10, "Supplier").submitted_by(by(1)),
            ),
            (
                noon(),
                Transaction::move_stock("SKU-1", 5, "Supplier", "Warehouse").submitted_by(by(2)),
            ),
        ]);
        let report = anomaly_report(&blocks, &users());
        assert_eq!(report.summary.total_anomalies, 0);
        assert_eq!(report.summary.total_transactions, 2);
        assert_eq!(report.summary.percent_of_transactions_flagged, 0.0);
    }

    #[test]
    fn test_business_rules() {
        let late = Utc.with_ymd_and_hms(2024, 5, 1, 23, 15, 0).unwrap();
        let blocks = build(vec![
            (late, Transaction::create_item("SKU-1", "Widget", 10, "Supplier").submitted_by(by(1))),
            (
                noon(),
                Transaction::move_stock("SKU-1", 5, "Supplier", "Retailer").submitted_by(by(1)),
            ),
        ]);
        let report = anomaly_report(&blocks, &users());

        assert_eq!(report.basic_anomalies.len(), 2);
        // newest first
        assert_eq!(report.basic_anomalies[0].block.index, 2);
        assert_eq!(
            report.basic_anomalies[0].reasons,
            vec![
                "Logistics (MOVE) operation performed by an Admin, not a Manager.".to_string(),
                "Logistics anomaly: Skipped Warehouse (Supplier -> Retailer).".to_string(),
            ]
        );
        assert_eq!(
            report.basic_anomalies[1].reasons,
            vec!["Transaction occurred at an unusual time (23:00 UTC).".to_string()]
        );
        assert_eq!(report.summary.total_anomalies, 2);
        assert_eq!(report.summary.percent_of_transactions_flagged, 100.0);
    }

    #[test]
    fn test_statistical_outlier() {
        let mut entries = vec![(
            noon(),
            Transaction::create_item("SKU-1", "Widget", 1, "Warehouse"),
        )];
        for _ in 0..15 {
            entries.push((noon(), Transaction::stock_in("SKU-1", 2, "Warehouse")));
        }
        entries.push((noon(), Transaction::stock_in("SKU-1", 500, "Warehouse")));

        let report = anomaly_report(&build(entries), &[]);
        assert_eq!(report.statistical_outliers.len(), 1);
        assert_eq!(report.statistical_outliers[0].block.index, 17);
        assert!(report.statistical_outliers[0].reasons[0].starts_with("Quantity (500)"));
        assert!(report.statistical_outliers[0].reasons[0].ends_with("for STOCK_IN transactions."));
    }

    #[test]
    fn test_small_quantities_are_never_outliers() {
        let mut entries = vec![(
            noon(),
            Transaction::create_item("SKU-1", "Widget", 1, "Warehouse"),
        )];
        for _ in 0..15 {
            entries.push((noon(), Transaction::stock_in("SKU-1", 1, "Warehouse")));
        }
        entries.push((noon(), Transaction::stock_in("SKU-1", 9, "Warehouse")));
        assert!(anomaly_report(&build(entries), &[]).statistical_outliers.is_empty());
    }

    #[test]
    fn test_behavioral_first_time_actions() {
        let blocks = build(vec![
            (
                noon(),
                Transaction::create_item("SKU-1", "Widget", 10, "Warehouse").submitted_by(by(2)),
            ),
            (
                noon(),
                Transaction::create_item("SKU-2", "Cable", 10, "Warehouse").submitted_by(by(2)),
            ),
            (noon(), Transaction::stock_out("SKU-1", 1, "Warehouse").submitted_by(by(3))),
            (noon(), Transaction::stock_out("SKU-2", 1, "Warehouse").submitted_by(by(2))),
        ]);
        let report = anomaly_report(&blocks, &users());

        let flagged: Vec<u64> = report.behavioral_anomalies.iter().map(|f| f.block.index).collect();
        assert_eq!(flagged, vec![3, 1]);
        assert_eq!(
            report.behavioral_anomalies[0].reasons[0],
            "First time user 'Auditor Saabji' (Role: Auditor) performed a 'STOCK_OUT' action."
        );
        assert_eq!(
            report.behavioral_anomalies[1].reasons[0],
            "First time user 'Manager Babu' (Role: Inventory Manager) \
             performed a 'CREATE_ITEM' action."
        );
    }

    #[test]
    fn test_empty_chain_report() {
        let blocks = build(vec![]);
        let report = anomaly_report(&blocks, &users());
        assert_eq!(report.summary.total_transactions, 0);
        assert_eq!(report.summary.percent_of_transactions_flagged, 0.0);
    }

    #[test]
    fn test_role_wire_names() {
        let text = r#"{"id":2,"name":"Manager Babu","role":"Inventory Manager"}"#;
        let user: UserRecord = serde_json::from_str(text).unwrap();
        assert_eq!(user.role, Role::InventoryManager);
    }
}
