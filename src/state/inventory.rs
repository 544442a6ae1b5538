//! Inventory projection
//!
//! The world state derived from the chain: SKU -> product record with a
//! quantity per location. It is never persisted; each replay builds and
//! owns its own instance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A product and where its stock sits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_name: String,
    pub price: f64,
    pub category: String,
    /// Location name -> quantity; an absent location holds 0
    pub locations: BTreeMap<String, u64>,
}

impl Product {
    pub fn new(product_name: &str, price: f64, category: &str) -> Self {
        Self {
            product_name: product_name.to_string(),
            price,
            category: category.to_string(),
            locations: BTreeMap::new(),
        }
    }

    /// Quantity at a location, 0 when the location was never stocked
    pub fn quantity_at(&self, location: &str) -> u64 {
        self.locations.get(location).copied().unwrap_or(0)
    }

    /// Whether `quantity` more units fit at a location without overflowing
    pub fn has_room(&self, location: &str, quantity: u64) -> bool {
        self.quantity_at(location).checked_add(quantity).is_some()
    }

    /// Add stock to a location. Returns false, leaving the product
    /// untouched, when the new quantity would not fit in a `u64`.
    pub fn credit(&mut self, location: &str, quantity: u64) -> bool {
        match self.quantity_at(location).checked_add(quantity) {
            Some(total) => {
                self.locations.insert(location.to_string(), total);
                true
            }
            None => false,
        }
    }

    /// Remove stock from a location. Returns false, leaving the product
    /// untouched, when the location holds less than `quantity`.
    pub fn debit(&mut self, location: &str, quantity: u64) -> bool {
        let available = self.quantity_at(location);
        if available < quantity {
            return false;
        }
        self.locations.insert(location.to_string(), available - quantity);
        true
    }

    /// Units across all locations, capped at `u64::MAX`
    pub fn total_stock(&self) -> u64 {
        self.locations
            .values()
            .fold(0u64, |acc, &q| acc.saturating_add(q))
    }

    /// Price times units across all locations
    pub fn stock_value(&self) -> f64 {
        self.price * self.total_stock() as f64
    }
}

/// SKU -> product mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    products: BTreeMap<String, Product>,
}

impl Inventory {
    /// Create an empty projection
    pub fn new() -> Self {
        Self {
            products: BTreeMap::new(),
        }
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.products.contains_key(sku)
    }

    pub fn get(&self, sku: &str) -> Option<&Product> {
        self.products.get(sku)
    }

    pub fn get_mut(&mut self, sku: &str) -> Option<&mut Product> {
        self.products.get_mut(sku)
    }

    /// Insert the product unless the SKU is already present, then return it
    pub fn get_or_insert(&mut self, sku: &str, product: Product) -> &mut Product {
        self.products.entry(sku.to_string()).or_insert(product)
    }

    /// Quantity of a SKU at a location, 0 for unknown SKUs or locations
    pub fn quantity(&self, sku: &str, location: &str) -> u64 {
        self.get(sku).map_or(0, |p| p.quantity_at(location))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Product)> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Units across every product and location, capped at `u64::MAX`
    pub fn total_units(&self) -> u64 {
        self.products
            .values()
            .map(Product::total_stock)
            .fold(0, u64::saturating_add)
    }

    /// Valuation across every product
    pub fn total_value(&self) -> f64 {
        self.products.values().map(Product::stock_value).sum()
    }
}
