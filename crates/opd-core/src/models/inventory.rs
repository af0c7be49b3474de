//! Inventory models.

use serde::{Deserialize, Serialize};

use super::{new_id, now_timestamp};

/// A doctor's inventory. Holds no fields of its own beyond the owner link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Inventory {
    pub id: String,
    pub doctor_id: String,
}

impl Inventory {
    pub fn new(doctor_id: String) -> Self {
        Self {
            id: new_id(),
            doctor_id,
        }
    }
}

/// A stocked item in an inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: String,
    pub inventory_id: String,
    pub item_name: String,
    pub item_quantity: u32,
    /// Unit price, never negative
    pub item_price: f64,
    pub last_updated: String,
    pub created_at: String,
}

impl InventoryItem {
    pub fn new(inventory_id: String, item_name: String, item_quantity: u32, item_price: f64) -> Self {
        let now = now_timestamp();
        Self {
            id: new_id(),
            inventory_id,
            item_name,
            item_quantity,
            item_price,
            last_updated: now.clone(),
            created_at: now,
        }
    }

    /// Quantity times unit price.
    pub fn stock_value(&self) -> f64 {
        self.item_quantity as f64 * self.item_price
    }
}

/// Inventory item edit. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InventoryItemUpdate {
    pub item_name: Option<String>,
    pub item_quantity: Option<u32>,
    pub item_price: Option<f64>,
}

impl InventoryItemUpdate {
    pub fn apply_to(&self, item: &mut InventoryItem) {
        if let Some(name) = &self.item_name {
            item.item_name = name.clone();
        }
        if let Some(quantity) = self.item_quantity {
            item.item_quantity = quantity;
        }
        if let Some(price) = self.item_price {
            item.item_price = price;
        }
    }
}
