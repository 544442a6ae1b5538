//! Transaction structure
//!
//! A closed set of inventory operations, tagged on the wire by `txType`.
//! Each kind carries only the fields it needs, so a payload missing a
//! required field is refused at deserialization instead of being
//! interpreted later.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The operation a transaction performs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "txType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxKind {
    /// Register a new SKU and put its opening stock at a location
    #[serde(rename_all = "camelCase")]
    CreateItem {
        item_sku: String,
        item_name: String,
        quantity: u64,
        to_location: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        price: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    /// Receive stock at a location
    #[serde(rename_all = "camelCase")]
    StockIn {
        item_sku: String,
        quantity: u64,
        location: String,
    },
    /// Remove stock from a location
    #[serde(rename_all = "camelCase")]
    StockOut {
        item_sku: String,
        quantity: u64,
        location: String,
    },
    /// Transfer stock between two locations
    #[serde(rename_all = "camelCase")]
    Move {
        item_sku: String,
        quantity: u64,
        from_location: String,
        to_location: String,
    },
    /// Anchor of the chain; carries nothing
    Genesis,
}

/// Discriminant of [`TxKind`], for grouping and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    CreateItem,
    StockIn,
    StockOut,
    Move,
    Genesis,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::CreateItem => "CREATE_ITEM",
            TxType::StockIn => "STOCK_IN",
            TxType::StockOut => "STOCK_OUT",
            TxType::Move => "MOVE",
            TxType::Genesis => "GENESIS",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who submitted a transaction. Stamped by the service layer from the
/// session; every field is optional and omitted from the wire when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

/// A complete transaction as embedded in a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(flatten)]
    pub kind: TxKind,
    #[serde(flatten)]
    pub submitter: Submitter,
}

impl Transaction {
    pub fn new(kind: TxKind) -> Self {
        Self {
            kind,
            submitter: Submitter::default(),
        }
    }

    /// The payload of the genesis block
    pub fn genesis() -> Self {
        Self::new(TxKind::Genesis)
    }

    pub fn create_item(sku: &str, name: &str, quantity: u64, to_location: &str) -> Self {
        Self::new(TxKind::CreateItem {
            item_sku: sku.to_string(),
            item_name: name.to_string(),
            quantity,
            to_location: to_location.to_string(),
            price: None,
            category: None,
        })
    }

    pub fn stock_in(sku: &str, quantity: u64, location: &str) -> Self {
        Self::new(TxKind::StockIn {
            item_sku: sku.to_string(),
            quantity,
            location: location.to_string(),
        })
    }

    pub fn stock_out(sku: &str, quantity: u64, location: &str) -> Self {
        Self::new(TxKind::StockOut {
            item_sku: sku.to_string(),
            quantity,
            location: location.to_string(),
        })
    }

    pub fn move_stock(sku: &str, quantity: u64, from_location: &str, to_location: &str) -> Self {
        Self::new(TxKind::Move {
            item_sku: sku.to_string(),
            quantity,
            from_location: from_location.to_string(),
            to_location: to_location.to_string(),
        })
    }

    /// Set the unit price of a CREATE_ITEM; ignored for other kinds
    pub fn with_price(mut self, value: f64) -> Self {
        if let TxKind::CreateItem { price, .. } = &mut self.kind {
            *price = Some(value);
        }
        self
    }

    /// Set the category of a CREATE_ITEM; ignored for other kinds
    pub fn with_category(mut self, value: &str) -> Self {
        if let TxKind::CreateItem { category, .. } = &mut self.kind {
            *category = Some(value.to_string());
        }
        self
    }

    /// Attach submitter details
    pub fn submitted_by(mut self, submitter: Submitter) -> Self {
        self.submitter = submitter;
        self
    }

    pub fn tx_type(&self) -> TxType {
        match self.kind {
            TxKind::CreateItem { .. } => TxType::CreateItem,
            TxKind::StockIn { .. } => TxType::StockIn,
            TxKind::StockOut { .. } => TxType::StockOut,
            TxKind::Move { .. } => TxType::Move,
            TxKind::Genesis => TxType::Genesis,
        }
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self.kind, TxKind::Genesis)
    }

    /// SKU the transaction touches, if any
    pub fn item_sku(&self) -> Option<&str> {
        match &self.kind {
            TxKind::CreateItem { item_sku, .. }
            | TxKind::StockIn { item_sku, .. }
            | TxKind::StockOut { item_sku, .. }
            | TxKind::Move { item_sku, .. } => Some(item_sku),
            TxKind::Genesis => None,
        }
    }

    /// Quantity the transaction moves, if any
    pub fn quantity(&self) -> Option<u64> {
        match &self.kind {
            TxKind::CreateItem { quantity, .. }
            | TxKind::StockIn { quantity, .. }
            | TxKind::StockOut { quantity, .. }
            | TxKind::Move { quantity, .. } => Some(*quantity),
            TxKind::Genesis => None,
        }
    }

    /// JSON form, as embedded in a block and hashed
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
