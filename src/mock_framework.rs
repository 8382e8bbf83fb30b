//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_get`] or [`expect_action`] to script the
//! store's side of the conversation.

use tokio::sync::{mpsc, oneshot};

use crate::actor_framework::{Entity, FrameworkError, ResourceClient, ResourceRequest, Versioned};

type Reply<R, T> = oneshot::Sender<Result<R, FrameworkError<<T as Entity>::Error>>>;

/// Creates a mock client and a receiver for asserting requests.
///
/// The client sends to a channel the test controls instead of a running
/// `ResourceActor`, so each response (success, conflict, missing record) can be
/// chosen deterministically.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is an Insert request
pub async fn expect_insert<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::CreateParams, Reply<(), T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Insert { id, params, respond_to }) => Some((id, params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Reply<Option<Versioned<T>>, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Patch, Option<u64>, Reply<Versioned<T>, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Update {
            id,
            patch,
            expected_version,
            respond_to,
        }) => Some((id, patch, expected_version, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Reply<T::ActionResult, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_system::RetryPolicy;
    use crate::cart_actor::CartAction;
    use crate::clients::{CartStore, InventoryLedger};
    use crate::domain::{Cart, ProductSnapshot, StockEntry};
    use crate::error::StoreError;
    use crate::stock_actor::StockAction;
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn stock(version: u64, available: u32) -> Option<Versioned<StockEntry>> {
        Some(Versioned {
            version,
            entity: StockEntry {
                product_id: "p1".into(),
                available,
            },
        })
    }

    fn conflict(expected: u64, actual: u64) -> FrameworkError<StoreError> {
        FrameworkError::VersionConflict {
            kind: "product stock",
            id: "p1".into(),
            expected,
            actual,
        }
    }

    fn ledger(max_attempts: u32) -> (InventoryLedger, mpsc::Receiver<ResourceRequest<StockEntry>>) {
        let (client, receiver) = create_mock_client::<StockEntry>(10);
        let retry = RetryPolicy {
            max_attempts,
            backoff: Duration::ZERO,
        };
        (InventoryLedger::new(client, retry), receiver)
    }

    #[tokio::test]
    async fn test_decrement_rereads_after_conflict() {
        let (ledger, mut receiver) = ledger(3);
        let task = tokio::spawn(async move { ledger.decrement("p1", 2).await });

        let (_, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        responder.send(Ok(stock(1, 5))).unwrap();
        let (_, patch, expected, responder) = expect_update(&mut receiver).await.expect("Expected Update request");
        assert_eq!((patch.available, expected), (3, Some(1)));
        responder.send(Err(conflict(1, 2))).unwrap();

        // Someone else took one unit in between.
        let (_, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        responder.send(Ok(stock(2, 4))).unwrap();
        let (_, patch, expected, responder) = expect_update(&mut receiver).await.expect("Expected Update request");
        assert_eq!((patch.available, expected), (2, Some(2)));
        responder
            .send(Ok(Versioned {
                version: 3,
                entity: StockEntry {
                    product_id: "p1".into(),
                    available: 2,
                },
            }))
            .unwrap();

        assert_eq!(task.await.unwrap(), Ok(2));
    }

    #[tokio::test]
    async fn test_decrement_gives_up_after_max_attempts() {
        let (ledger, mut receiver) = ledger(2);
        let task = tokio::spawn(async move { ledger.decrement("p1", 1).await });

        for version in 1..=2 {
            let (_, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
            responder.send(Ok(stock(version, 5))).unwrap();
            let (_, _, _, responder) = expect_update(&mut receiver).await.expect("Expected Update request");
            responder.send(Err(conflict(version, version + 1))).unwrap();
        }

        let result = task.await.unwrap();
        assert_eq!(
            result,
            Err(StoreError::TransientWriteConflict {
                product_id: "p1".into(),
                attempts: 2
            })
        );
        assert!(result.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_increment_sends_restock_action() {
        let (ledger, mut receiver) = ledger(1);
        let task = tokio::spawn(async move { ledger.increment("p1", 3).await });

        let (id, action, responder) = expect_action(&mut receiver).await.expect("Expected Action request");
        assert_eq!(id, "p1");
        assert!(matches!(action, StockAction::Restock(3)));
        responder.send(Ok(8)).unwrap();

        assert_eq!(task.await.unwrap(), Ok(Some(8)));
    }

    #[tokio::test]
    async fn test_first_add_creates_cart_lazily() {
        let (client, mut receiver) = create_mock_client::<Cart>(10);
        let store = CartStore::new(client);
        let product = ProductSnapshot::new("tea", "Jasmine Tea", Decimal::from(12_000));
        let task = tokio::spawn(async move { store.add_item("c1", product, 1).await });

        let (id, _, responder) = expect_action(&mut receiver).await.expect("Expected Action request");
        assert_eq!(id, "c1");
        responder
            .send(Err(FrameworkError::NotFound {
                kind: "cart",
                id: "c1".into(),
            }))
            .unwrap();

        let (id, (), responder) = expect_insert(&mut receiver).await.expect("Expected Insert request");
        assert_eq!(id, "c1");
        responder.send(Ok(())).unwrap();

        let (_, action, responder) = expect_action(&mut receiver).await.expect("Expected Action request");
        let mut cart = Cart::new("c1");
        match action {
            CartAction::Add { product, quantity } => cart.add(product, quantity).unwrap(),
            other => panic!("Expected Add action, got {other:?}"),
        }
        responder.send(Ok(cart.snapshot())).unwrap();

        let snapshot = task.await.unwrap().unwrap();
        assert_eq!(snapshot.quantity_of("tea"), Some(1));
    }
}
