use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events emitted by the cart and checkout services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartCreated(Uuid),
    CartEntryAdded {
        cart_id: Uuid,
        entry_id: Uuid,
    },
    CartEntryRemoved {
        cart_id: Uuid,
        entry_id: Uuid,
    },
    CheckoutRecorded {
        order_id: Uuid,
        checkout_id: Uuid,
        amount: u64,
    },
    CheckoutReplayed {
        order_id: Uuid,
        checkout_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone.
    /// Event delivery is best-effort and never blocks a request outcome.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Consumes events from the channel and logs them. Both server binaries
/// spawn this as their event processing loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::CartCreated(cart_id) => {
                info!("Cart created: {}", cart_id);
            }
            Event::CartEntryAdded { cart_id, entry_id } => {
                debug!("Cart entry added: cart={} entry={}", cart_id, entry_id);
            }
            Event::CartEntryRemoved { cart_id, entry_id } => {
                debug!("Cart entry removed: cart={} entry={}", cart_id, entry_id);
            }
            Event::CheckoutRecorded {
                order_id,
                checkout_id,
                amount,
            } => {
                info!(
                    "Checkout recorded: order={} checkout={} amount={}",
                    order_id, checkout_id, amount
                );
            }
            Event::CheckoutReplayed {
                order_id,
                checkout_id,
            } => {
                info!(
                    "Checkout replayed: order={} checkout={}",
                    order_id, checkout_id
                );
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let cart_id = Uuid::new_v4();

        sender.send(Event::CartCreated(cart_id)).await.unwrap();

        match rx.recv().await.unwrap() {
            Event::CartCreated(received) => assert_eq!(received, cart_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_survives_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out
        sender.send_or_log(Event::CartCreated(Uuid::new_v4())).await;
    }
}
