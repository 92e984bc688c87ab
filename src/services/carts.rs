use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::discovery::ServiceDiscovery;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{CartEntry, CartSnapshot, Checkout, CheckoutRequest, Item};
use crate::store::CartStore;

/// Cart service: fronts the cart store for the HTTP layer and orchestrates
/// the handoff to the checkout service.
#[derive(Clone)]
pub struct CartService {
    store: Arc<CartStore>,
    discovery: Arc<dyn ServiceDiscovery>,
    client: reqwest::Client,
    event_sender: Arc<EventSender>,
    checkout_service: String,
}

impl CartService {
    /// Creates a new `CartService`.
    ///
    /// The `client` carries the bounded timeout for the outbound checkout
    /// call; `checkout_service` is the logical name resolved through
    /// `discovery` on every checkout.
    pub fn new(
        store: Arc<CartStore>,
        discovery: Arc<dyn ServiceDiscovery>,
        client: reqwest::Client,
        event_sender: Arc<EventSender>,
        checkout_service: String,
    ) -> Self {
        Self {
            store,
            discovery,
            client,
            event_sender,
            checkout_service,
        }
    }

    #[instrument(skip(self))]
    pub async fn create_cart(&self) -> Result<CartSnapshot, ServiceError> {
        let cart_id = self.store.create_cart();
        self.event_sender.send_or_log(Event::CartCreated(cart_id)).await;
        info!("Created cart {}", cart_id);
        self.store.get_cart(cart_id)
    }

    pub fn get_cart(&self, cart_id: Uuid) -> Result<CartSnapshot, ServiceError> {
        self.store.get_cart(cart_id)
    }

    #[instrument(skip(self, item))]
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        item: Item,
        quantity: u32,
    ) -> Result<CartEntry, ServiceError> {
        let entry = self.store.add_item(cart_id, item, quantity)?;
        self.event_sender
            .send_or_log(Event::CartEntryAdded {
                cart_id,
                entry_id: entry.id,
            })
            .await;
        info!(
            "Added entry {} to cart {} (quantity {})",
            entry.id, cart_id, quantity
        );
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, cart_id: Uuid, entry_id: Uuid) -> Result<(), ServiceError> {
        self.store.remove_item(cart_id, entry_id)?;
        self.event_sender
            .send_or_log(Event::CartEntryRemoved { cart_id, entry_id })
            .await;
        info!("Removed entry {} from cart {}", entry_id, cart_id);
        Ok(())
    }

    /// Submits the cart for checkout and returns the checkout id.
    ///
    /// The cart's current total is sent as the authoritative amount; the
    /// call is not retried here. A timeout or transport failure means the
    /// outcome is unknown, and the checkout service's idempotency makes a
    /// caller-level replay with the same cart safe.
    #[instrument(skip(self))]
    pub async fn checkout_cart(&self, cart_id: Uuid) -> Result<Uuid, ServiceError> {
        let amount = self.store.total_price(cart_id)?;
        let endpoint = self.discovery.resolve(&self.checkout_service).await?;
        let url = format!("{}/checkout", endpoint.base_url());

        let request = CheckoutRequest {
            order_id: cart_id,
            amount,
        };
        let response = self
            .client
            .put(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Checkout request to {} failed: {}", url, e);
                ServiceError::Unavailable(format!("checkout request failed: {}", e))
            })?;

        if !response.status().is_success() {
            warn!(
                "Checkout service rejected order {}: status {}",
                cart_id,
                response.status()
            );
            return Err(ServiceError::Unavailable(format!(
                "checkout service returned status {}",
                response.status()
            )));
        }

        let record: Checkout = response.json().await.map_err(|e| {
            ServiceError::Unavailable(format!("malformed checkout response: {}", e))
        })?;

        info!(
            "Cart {} checked out: checkout {} amount {}",
            cart_id, record.id, amount
        );
        Ok(record.id)
    }
}
