//! Ledger service
//!
//! Glue between a [`BlockStore`] and the pure chain functions: creates the
//! genesis block on first use, admits and appends transactions, and serves
//! verification, snapshots and reports over the persisted chain.
//!
//! There is one logical writer path. Concurrent appenders are made safe by
//! re-reading the full chain before every validation and by the store
//! refusing a second block at the same index; the loser re-validates
//! against the longer chain and tries again.

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;

use crate::analytics::{
    anomaly_report, low_stock_predictions, AnomalyReport, LowStockPrediction, UserRecord,
};
use crate::chain::timestamp;
use crate::chain::{create_block, create_genesis_block, verify_chain, Block};
use crate::config::Config;
use crate::constants::GENESIS_INDEX;
use crate::error::{LedgerError, Result};
use crate::state::{rebuild, Inventory, Snapshot};
use crate::storage::BlockStore;
use crate::validation::{check_transaction, Transaction};

/// Result of submitting a transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitOutcome {
    /// Validated and persisted
    Appended(Block),
    /// Refused by validation; nothing was written
    Rejected { message: String },
}

pub struct Ledger<S: BlockStore> {
    store: S,
    max_append_retries: u32,
    low_stock_window_days: u32,
    prediction_threshold_days: u64,
}

impl<S: BlockStore> Ledger<S> {
    /// Create a ledger with default settings
    pub fn new(store: S) -> Self {
        Self::with_config(store, &Config::default())
    }

    pub fn with_config(store: S, config: &Config) -> Self {
        Self {
            store,
            max_append_retries: config.max_append_retries,
            low_stock_window_days: config.low_stock_window_days,
            prediction_threshold_days: config.prediction_threshold_days,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the genesis block, creating it if the store has none.
    ///
    /// Two callers may both find no genesis and both try to insert one; the
    /// loser sees an index conflict and reads the winner's block instead.
    pub fn genesis(&self) -> Result<Block> {
        if let Some(genesis) = self.store.get_block(GENESIS_INDEX)? {
            return Ok(genesis);
        }

        info!("No genesis block found. Creating one...");
        let genesis = create_genesis_block()?;
        match self.store.insert_block(&genesis) {
            Ok(()) => {
                info!("Genesis block created: {}", genesis.hash);
                Ok(genesis)
            }
            Err(e) if e.is_conflict() => {
                info!("Genesis block already created by another writer");
                self.store
                    .get_block(GENESIS_INDEX)?
                    .ok_or(LedgerError::EmptyChain)
            }
            Err(e) => Err(e),
        }
    }

    /// The full chain, ascending by index, genesis included
    pub fn chain(&self) -> Result<Vec<Block>> {
        self.genesis()?;
        let blocks = self.store.load_chain()?;
        if blocks.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        Ok(blocks)
    }

    /// Validate a transaction against the current chain and append it.
    pub fn submit(&self, tx: Transaction) -> Result<SubmitOutcome> {
        let attempts = self.max_append_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let chain = self.chain()?;

            if let Err(rejection) = check_transaction(&tx, &chain) {
                info!("Validation failed: {}", rejection);
                return Ok(SubmitOutcome::Rejected {
                    message: rejection.to_string(),
                });
            }

            let last = chain.last().ok_or(LedgerError::EmptyChain)?;
            if last.hash.trim().is_empty() {
                error!("CRITICAL: block {} is missing a hash", last.index);
                return Err(LedgerError::MissingHash(last.index));
            }

            let block = create_block(last.index + 1, tx.clone(), last.hash.trim())?;
            match self.store.insert_block(&block) {
                Ok(()) => {
                    info!("Block {} added to chain", block.index);
                    return Ok(SubmitOutcome::Appended(block));
                }
                Err(e) if e.is_conflict() => {
                    warn!(
                        "Block index {} taken by another writer (attempt {}/{}), revalidating",
                        block.index, attempt, attempts
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(LedgerError::AppendContention(attempts))
    }

    /// Check link and digest integrity of the whole persisted chain
    pub fn verify(&self) -> Result<bool> {
        let chain = self.chain()?;
        match verify_chain(&chain) {
            Ok(()) => {
                info!("Chain is valid ({} blocks)", chain.len());
                Ok(true)
            }
            Err(fault) => {
                error!("CHAIN IS INVALID: {}", fault);
                Ok(false)
            }
        }
    }

    /// Current inventory
    pub fn inventory(&self) -> Result<Inventory> {
        Ok(rebuild(&self.chain()?))
    }

    /// Inventory and KPIs as they stood at `cutoff`
    pub fn snapshot_at(&self, cutoff: &str) -> Result<Snapshot> {
        let snapshot = Snapshot::requested(&self.chain()?, cutoff)?;
        info!("Snapshot generated for {}", snapshot.snapshot_time);
        Ok(snapshot)
    }

    /// Wipe every block and start over from a fresh genesis
    pub fn clear(&self) -> Result<Block> {
        self.store.clear()?;
        warn!("Entire chain wiped");
        self.genesis()
    }

    pub fn low_stock_predictions(&self, now: &DateTime<Utc>) -> Result<Vec<LowStockPrediction>> {
        let chain = self.chain()?;
        let predictions = low_stock_predictions(
            &chain,
            now,
            self.low_stock_window_days,
            self.prediction_threshold_days,
        );
        info!("Found {} low-stock warnings", predictions.len());
        Ok(predictions)
    }

    pub fn anomaly_report(&self, users: &[UserRecord]) -> Result<AnomalyReport> {
        let report = anomaly_report(&self.chain()?, users);
        info!(
            "Anomaly scan complete: {} of {} transactions flagged",
            report.summary.total_anomalies, report.summary.total_transactions
        );
        Ok(report)
    }

    /// [`Ledger::low_stock_predictions`] as of the current instant
    pub fn low_stock_predictions_now(&self) -> Result<Vec<LowStockPrediction>> {
        self.low_stock_predictions(&timestamp::now())
    }
}
