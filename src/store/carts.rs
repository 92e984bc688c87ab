use dashmap::DashMap;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{CartEntry, CartSnapshot, Item, ShoppingCart};

/// Owns all shopping carts for the process. Mutations on one cart are
/// serialized by the map's per-key guard; different carts proceed
/// independently.
#[derive(Debug, Default)]
pub struct CartStore {
    carts: DashMap<Uuid, ShoppingCart>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh empty cart and returns its id.
    pub fn create_cart(&self) -> Uuid {
        let cart_id = Uuid::new_v4();
        self.carts.insert(cart_id, ShoppingCart::new(cart_id));
        cart_id
    }

    pub fn get_cart(&self, cart_id: Uuid) -> Result<CartSnapshot, ServiceError> {
        self.carts
            .get(&cart_id)
            .map(|cart| cart.snapshot())
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))
    }

    /// Adds an item to the cart. Requires a positive quantity; the price is
    /// non-negative by construction.
    pub fn add_item(
        &self,
        cart_id: Uuid,
        item: Item,
        quantity: u32,
    ) -> Result<CartEntry, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }

        let mut cart = self
            .carts
            .get_mut(&cart_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        Ok(cart.add_entry(item, quantity))
    }

    pub fn remove_item(&self, cart_id: Uuid, entry_id: Uuid) -> Result<(), ServiceError> {
        let mut cart = self
            .carts
            .get_mut(&cart_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        cart.remove_entry(&entry_id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("Cart entry {} not found", entry_id)))
    }

    /// Recomputes the cart total from its current entries.
    pub fn total_price(&self, cart_id: Uuid) -> Result<u64, ServiceError> {
        self.carts
            .get(&cart_id)
            .map(|cart| cart.total_price())
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))
    }
}
