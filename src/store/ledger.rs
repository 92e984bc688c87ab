use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::Checkout;

/// Whether a checkout call created the record or replayed an existing one.
/// The record is the canonical one either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Created(Checkout),
    Replayed(Checkout),
}

impl CheckoutOutcome {
    pub fn into_checkout(self) -> Checkout {
        match self {
            Self::Created(record) | Self::Replayed(record) => record,
        }
    }
}

/// The idempotent order -> checkout mapping. The first `(order_id, amount)`
/// observed is authoritative: identical replays return the stored record,
/// a differing amount is a conflict, and no update or overwrite path exists.
#[derive(Debug, Default)]
pub struct CheckoutLedger {
    records: DashMap<Uuid, Checkout>,
}

impl CheckoutLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a checkout for `order_id`, or replays the existing record.
    ///
    /// The check-then-insert-or-compare runs under the map's entry guard for
    /// the order id: of N concurrent first-time callers exactly one inserts,
    /// and the rest observe the inserted record.
    pub fn checkout(&self, order_id: Uuid, amount: u64) -> Result<CheckoutOutcome, ServiceError> {
        match self.records.entry(order_id) {
            Entry::Occupied(existing) => {
                let record = existing.get();
                if record.amount == amount {
                    Ok(CheckoutOutcome::Replayed(record.clone()))
                } else {
                    Err(ServiceError::Conflict(format!(
                        "Order {} already checked out with a different amount",
                        order_id
                    )))
                }
            }
            Entry::Vacant(slot) => {
                let record = Checkout {
                    id: Uuid::new_v4(),
                    order_id,
                    amount,
                };
                slot.insert(record.clone());
                Ok(CheckoutOutcome::Created(record))
            }
        }
    }

    pub fn get(&self, order_id: Uuid) -> Option<Checkout> {
        self.records.get(&order_id).map(|record| record.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn first_checkout_creates_a_record() {
        let ledger = CheckoutLedger::new();
        let order_id = Uuid::new_v4();

        let outcome = ledger.checkout(order_id, 100).unwrap();
        assert_matches!(&outcome, CheckoutOutcome::Created(_));

        let record = outcome.into_checkout();
        assert_eq!(record.order_id, order_id);
        assert_eq!(record.amount, 100);
        assert_eq!(ledger.get(order_id), Some(record));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn identical_replay_returns_the_same_record() {
        let ledger = CheckoutLedger::new();
        let order_id = Uuid::new_v4();

        let first = ledger.checkout(order_id, 100).unwrap().into_checkout();
        let second = ledger.checkout(order_id, 100).unwrap();

        assert_matches!(&second, CheckoutOutcome::Replayed(_));
        assert_eq!(second.into_checkout(), first);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn conflicting_amount_is_rejected_and_preserves_the_original() {
        let ledger = CheckoutLedger::new();
        let order_id = Uuid::new_v4();

        let original = ledger.checkout(order_id, 100).unwrap().into_checkout();

        assert_matches!(
            ledger.checkout(order_id, 150),
            Err(ServiceError::Conflict(_))
        );
        assert_eq!(ledger.get(order_id), Some(original));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn different_orders_do_not_interfere() {
        let ledger = CheckoutLedger::new();
        let first = ledger.checkout(Uuid::new_v4(), 100).unwrap().into_checkout();
        let second = ledger.checkout(Uuid::new_v4(), 100).unwrap().into_checkout();

        assert_ne!(first.id, second.id);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn concurrent_first_checkouts_converge_on_one_record() {
        use std::sync::Barrier;

        let ledger = CheckoutLedger::new();
        let order_id = Uuid::new_v4();
        let barrier = Barrier::new(16);

        let ids: Vec<Uuid> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        ledger
                            .checkout(order_id, 100)
                            .unwrap()
                            .into_checkout()
                            .id
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(ledger.len(), 1);
    }
}
