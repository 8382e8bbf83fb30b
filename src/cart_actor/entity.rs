use std::convert::Infallible;

use super::actions::CartAction;
use crate::actor_framework::Entity;
use crate::domain::{Cart, CartSnapshot};
use crate::error::StoreError;

impl Entity for Cart {
    const KIND: &'static str = "cart";

    type Id = String;
    type CreateParams = ();
    type Patch = Infallible;
    type Action = CartAction;
    type ActionResult = CartSnapshot;
    type Error = StoreError;

    fn from_create_params(customer_id: String, _params: ()) -> Result<Self, StoreError> {
        Ok(Cart::new(customer_id))
    }

    fn on_update(&mut self, patch: Infallible) -> Result<(), StoreError> {
        match patch {}
    }

    fn handle_action(&mut self, action: CartAction) -> Result<CartSnapshot, StoreError> {
        match action {
            CartAction::Add { product, quantity } => self.add(product, quantity)?,
            CartAction::SetQuantity { product_id, quantity } => self.set_quantity(&product_id, quantity)?,
            CartAction::Remove(product_id) => {
                self.remove(&product_id);
            }
            CartAction::Clear => self.clear(),
            CartAction::RemoveOrdered(ordered) => self.remove_ordered(&ordered),
        }
        Ok(self.snapshot())
    }
}
