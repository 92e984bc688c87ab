use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog item as presented by the client. Prices are integer minor
/// currency units (cents); money never touches floating point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub price: u64,
}

/// One line in a shopping cart: an item at a quantity, independently
/// addressable by its entry id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub id: Uuid,
    pub item: Item,
    pub quantity: u32,
}

impl CartEntry {
    pub fn line_total(&self) -> u64 {
        self.item.price * u64::from(self.quantity)
    }
}

/// A shopping cart and its entries. The total is always recomputed from the
/// current entries, never cached.
#[derive(Debug, Clone)]
pub struct ShoppingCart {
    id: Uuid,
    entries: HashMap<Uuid, CartEntry>,
}

impl ShoppingCart {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            entries: HashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Adds an entry under a freshly generated entry id and returns it.
    /// Quantity validation happens at the store boundary.
    pub fn add_entry(&mut self, item: Item, quantity: u32) -> CartEntry {
        let entry = CartEntry {
            id: Uuid::new_v4(),
            item,
            quantity,
        };
        self.entries.insert(entry.id, entry.clone());
        entry
    }

    pub fn remove_entry(&mut self, entry_id: &Uuid) -> Option<CartEntry> {
        self.entries.remove(entry_id)
    }

    pub fn total_price(&self) -> u64 {
        self.entries.values().map(CartEntry::line_total).sum()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            id: self.id,
            total: self.total_price(),
            items: self.entries.clone(),
        }
    }
}

/// Serializable view of a cart, keyed by entry id as clients expect it.
#[derive(Debug, Clone, Serialize)]
pub struct CartSnapshot {
    pub id: Uuid,
    pub total: u64,
    pub items: HashMap<Uuid, CartEntry>,
}

/// Finalized checkout record. Immutable once created; the ledger holds at
/// most one per order id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: u64,
}

/// Wire contract between the cart service and the checkout endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub order_id: Uuid,
    pub amount: u64,
}
