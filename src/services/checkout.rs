use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::Checkout;
use crate::store::{CheckoutLedger, CheckoutOutcome};

/// Checkout service: adapts the ledger's idempotent creation for the HTTP
/// layer and emits the corresponding events.
#[derive(Clone)]
pub struct CheckoutService {
    ledger: Arc<CheckoutLedger>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(ledger: Arc<CheckoutLedger>, event_sender: Arc<EventSender>) -> Self {
        Self {
            ledger,
            event_sender,
        }
    }

    /// Records a checkout for the order, or replays the canonical record.
    /// A differing amount for a known order is a conflict and leaves the
    /// ledger untouched.
    #[instrument(skip(self))]
    pub async fn checkout(&self, order_id: Uuid, amount: u64) -> Result<Checkout, ServiceError> {
        let outcome = self.ledger.checkout(order_id, amount).map_err(|e| {
            warn!("Checkout conflict for order {}: {}", order_id, e);
            e
        })?;

        let record = match outcome {
            CheckoutOutcome::Created(record) => {
                self.event_sender
                    .send_or_log(Event::CheckoutRecorded {
                        order_id,
                        checkout_id: record.id,
                        amount,
                    })
                    .await;
                info!("Recorded checkout {} for order {}", record.id, order_id);
                record
            }
            CheckoutOutcome::Replayed(record) => {
                self.event_sender
                    .send_or_log(Event::CheckoutReplayed {
                        order_id,
                        checkout_id: record.id,
                    })
                    .await;
                debug!("Replayed checkout {} for order {}", record.id, order_id);
                record
            }
        };

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokio::sync::mpsc;

    fn service() -> (CheckoutService, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(16);
        let service = CheckoutService::new(
            Arc::new(CheckoutLedger::new()),
            Arc::new(EventSender::new(tx)),
        );
        (service, rx)
    }

    #[tokio::test]
    async fn replay_returns_identical_record_and_emits_events() {
        let (service, mut rx) = service();
        let order_id = Uuid::new_v4();

        let first = service.checkout(order_id, 100).await.unwrap();
        let second = service.checkout(order_id, 100).await.unwrap();
        assert_eq!(first, second);

        assert_matches!(rx.recv().await, Some(Event::CheckoutRecorded { .. }));
        assert_matches!(rx.recv().await, Some(Event::CheckoutReplayed { .. }));
    }

    #[tokio::test]
    async fn conflicting_amount_fails_without_an_event() {
        let (service, mut rx) = service();
        let order_id = Uuid::new_v4();

        service.checkout(order_id, 100).await.unwrap();
        assert_matches!(
            service.checkout(order_id, 150).await,
            Err(ServiceError::Conflict(_))
        );

        assert_matches!(rx.recv().await, Some(Event::CheckoutRecorded { .. }));
        assert_matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Empty));
    }
}
