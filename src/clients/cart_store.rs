use tracing::{debug, instrument};

use crate::actor_framework::{FrameworkError, ResourceClient};
use crate::cart_actor::CartAction;
use crate::domain::{Cart, CartSnapshot, ProductSnapshot};
use crate::error::StoreError;

/// Per-customer carts. A cart record is created on the first add.
#[derive(Clone)]
pub struct CartStore {
    inner: ResourceClient<Cart>,
}

impl_basic_client!(CartStore, Cart, cart);

impl CartStore {
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub async fn add_item(
        &self,
        customer_id: &str,
        product: ProductSnapshot,
        quantity: u32,
    ) -> Result<CartSnapshot, StoreError> {
        debug!("Sending request");
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        let action = CartAction::Add { product, quantity };
        match self.inner.perform_action(customer_id.to_string(), action.clone()).await {
            Err(FrameworkError::NotFound { .. }) => {
                debug!("Creating cart on first add");
                match self.inner.insert(customer_id.to_string(), ()).await {
                    // Lost the race to a concurrent first add; the cart exists either way.
                    Ok(()) | Err(FrameworkError::AlreadyExists { .. }) => {}
                    Err(e) => return Err(e.into()),
                }
                self.inner
                    .perform_action(customer_id.to_string(), action)
                    .await
                    .map_err(StoreError::from)
            }
            result => result.map_err(StoreError::from),
        }
    }

    /// # Errors
    /// `InvalidQuantity` below 1; `NotFound` when the product is not in the cart.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        customer_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<CartSnapshot, StoreError> {
        debug!("Sending request");
        if quantity < 1 {
            return Err(StoreError::InvalidQuantity(quantity));
        }
        let action = CartAction::SetQuantity {
            product_id: product_id.to_string(),
            quantity,
        };
        match self.inner.perform_action(customer_id.to_string(), action).await {
            Err(FrameworkError::NotFound { .. }) => Err(StoreError::NotFound {
                entity: "cart item",
                id: product_id.to_string(),
            }),
            result => result.map_err(StoreError::from),
        }
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, customer_id: &str, product_id: &str) -> Result<CartSnapshot, StoreError> {
        debug!("Sending request");
        let action = CartAction::Remove(product_id.to_string());
        match self.inner.perform_action(customer_id.to_string(), action).await {
            Err(FrameworkError::NotFound { .. }) => Ok(CartSnapshot::empty(customer_id)),
            result => result.map_err(StoreError::from),
        }
    }

    #[instrument(skip(self))]
    pub async fn clear(&self, customer_id: &str) -> Result<(), StoreError> {
        debug!("Sending request");
        match self.inner.perform_action(customer_id.to_string(), CartAction::Clear).await {
            Ok(_) | Err(FrameworkError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the checked-out quantities, leaving anything added since.
    #[instrument(skip(self, ordered))]
    pub async fn remove_ordered(&self, customer_id: &str, ordered: Vec<(String, u32)>) -> Result<(), StoreError> {
        debug!(lines = ordered.len(), "Sending request");
        match self
            .inner
            .perform_action(customer_id.to_string(), CartAction::RemoveOrdered(ordered))
            .await
        {
            Ok(_) | Err(FrameworkError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Current contents with a total computed at read time.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, customer_id: &str) -> Result<CartSnapshot, StoreError> {
        debug!("Sending request");
        Ok(self
            .inner
            .get(customer_id.to_string())
            .await?
            .map(|cart| cart.snapshot())
            .unwrap_or_else(|| CartSnapshot::empty(customer_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use rust_decimal::Decimal;

    fn spawn_store() -> CartStore {
        let (actor, client) = ResourceActor::<Cart>::keyed(16);
        tokio::spawn(actor.run());
        CartStore::new(client)
    }

    fn tea() -> ProductSnapshot {
        ProductSnapshot::new("tea", "Jasmine Tea", Decimal::from(12_000)).with_image("img/tea.png")
    }

    #[tokio::test]
    async fn test_first_add_creates_cart() {
        let store = spawn_store();
        assert!(store.snapshot("c1").await.unwrap().is_empty());

        let snapshot = store.add_item("c1", tea(), 2).await.unwrap();
        assert_eq!(snapshot.quantity_of("tea"), Some(2));
        assert_eq!(snapshot.total, Decimal::from(24_000));
        assert!(store.get_cart("c1".into()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_cart_edge_cases() {
        let store = spawn_store();
        assert_eq!(
            store.set_quantity("c1", "tea", 3).await,
            Err(StoreError::NotFound {
                entity: "cart item",
                id: "tea".into()
            })
        );
        assert!(store.remove_item("c1", "tea").await.unwrap().is_empty());
        assert_eq!(store.clear("c1").await, Ok(()));
        assert_eq!(store.add_item("c1", tea(), 0).await, Err(StoreError::InvalidQuantity(0)));
        assert!(store.get_cart("c1".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_remove_and_clear() {
        let store = spawn_store();
        store.add_item("c1", tea(), 1).await.unwrap();
        store
            .add_item("c1", ProductSnapshot::new("cup", "Cup", Decimal::from(30_000)), 1)
            .await
            .unwrap();

        let snapshot = store.set_quantity("c1", "tea", 4).await.unwrap();
        assert_eq!(snapshot.total, Decimal::from(78_000));
        assert_eq!(store.set_quantity("c1", "tea", 0).await, Err(StoreError::InvalidQuantity(0)));

        let snapshot = store.remove_item("c1", "cup").await.unwrap();
        assert_eq!(snapshot.items.len(), 1);

        store.clear("c1").await.unwrap();
        assert!(store.snapshot("c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_ordered_subtracts_quantities() {
        let store = spawn_store();
        store.add_item("c1", tea(), 3).await.unwrap();
        store
            .add_item("c1", ProductSnapshot::new("cup", "Cup", Decimal::from(30_000)), 1)
            .await
            .unwrap();

        store
            .remove_ordered("c1", vec![("tea".into(), 2), ("cup".into(), 1)])
            .await
            .unwrap();
        let snapshot = store.snapshot("c1").await.unwrap();
        assert_eq!(snapshot.quantity_of("tea"), Some(1));
        assert_eq!(snapshot.quantity_of("cup"), None);

        assert_eq!(store.remove_ordered("nobody", vec![("tea".into(), 1)]).await, Ok(()));
    }
}
