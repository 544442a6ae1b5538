//! BIMS ledger command line
//!
//! Every command opens the sled database, makes sure a genesis block exists
//! and prints its result as JSON on stdout. Logs go to stderr.

use bims_ledger::analytics::UserRecord;
use bims_ledger::config::Config;
use bims_ledger::storage::LedgerDb;
use bims_ledger::{Ledger, SubmitOutcome, Transaction};
use clap::{Parser, Subcommand};
use log::error;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Debug, Parser)]
#[command(name = "bims-ledger", about = "Hash-linked inventory ledger")]
struct Opt {
    #[arg(long, global = true, help = "Database directory (overrides BIMS_DB_PATH)")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Create the genesis block if the ledger is empty")]
    Init,
    #[command(about = "Validate a transaction and append it to the chain")]
    Submit {
        #[arg(help = "Transaction as JSON", conflicts_with = "file")]
        json: Option<String>,
        #[arg(long, short, help = "Read the transaction JSON from a file")]
        file: Option<PathBuf>,
    },
    #[command(about = "Print every block")]
    Chain,
    #[command(about = "Check link and digest integrity of the chain")]
    Verify,
    #[command(name = "state-at", about = "Inventory and KPIs as of a past instant")]
    StateAt {
        #[arg(help = "RFC 3339 timestamp or YYYY-MM-DD")]
        timestamp: String,
    },
    #[command(about = "Items expected to run out soon")]
    Predictions,
    #[command(about = "Flag suspicious transactions")]
    Anomalies {
        #[arg(long, help = "JSON array of {id, name, role} user records")]
        users: Option<PathBuf>,
    },
    #[command(about = "Wipe the chain and recreate genesis")]
    Clear,
}

fn main() {
    let opt = Opt::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    if let Some(db) = opt.db {
        config.db_path = db;
    }

    env_logger::builder().filter_level(config.log_level).init();

    if let Err(e) = run_command(opt.command, &config) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = LedgerDb::open(&config.db_path)?;
    let ledger = Ledger::with_config(store, config);

    match command {
        Command::Init => print_json(&ledger.genesis()?)?,
        Command::Submit { json, file } => {
            let raw = match (json, file) {
                (Some(json), _) => json,
                (None, Some(path)) => fs::read_to_string(path)?,
                (None, None) => return Err("Provide transaction JSON or --file".into()),
            };
            let tx: Transaction = serde_json::from_str(&raw)?;
            let outcome = ledger.submit(tx)?;
            print_json(&outcome)?;
            if matches!(outcome, SubmitOutcome::Rejected { .. }) {
                process::exit(2);
            }
        }
        Command::Chain => print_json(&ledger.chain()?)?,
        Command::Verify => {
            let valid = ledger.verify()?;
            print_json(&serde_json::json!({ "valid": valid }))?;
            if !valid {
                process::exit(3);
            }
        }
        Command::StateAt { timestamp } => print_json(&ledger.snapshot_at(&timestamp)?)?,
        Command::Predictions => print_json(&ledger.low_stock_predictions_now()?)?,
        Command::Anomalies { users } => {
            let users: Vec<UserRecord> = match users {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                None => Vec::new(),
            };
            print_json(&ledger.anomaly_report(&users)?)?
        }
        Command::Clear => print_json(&ledger.clear()?)?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
