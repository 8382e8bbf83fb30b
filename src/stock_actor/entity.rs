use super::actions::StockAction;
use crate::actor_framework::Entity;
use crate::domain::{StockCreate, StockEntry, StockPatch};
use crate::error::StoreError;

impl Entity for StockEntry {
    const KIND: &'static str = "product stock";

    type Id = String;
    type CreateParams = StockCreate;
    type Patch = StockPatch;
    type Action = StockAction;
    type ActionResult = u32;
    type Error = StoreError;

    fn from_create_params(product_id: String, params: StockCreate) -> Result<Self, StoreError> {
        Ok(Self {
            product_id,
            available: params.available,
        })
    }

    /// Overwrites the quantity. Callers pair this with an expected version.
    fn on_update(&mut self, patch: StockPatch) -> Result<(), StoreError> {
        self.available = patch.available;
        Ok(())
    }

    fn handle_action(&mut self, action: StockAction) -> Result<u32, StoreError> {
        match action {
            StockAction::Restock(quantity) => {
                self.available = self
                    .available
                    .checked_add(quantity)
                    .ok_or(StoreError::InvalidQuantity(quantity))?;
                Ok(self.available)
            }
        }
    }
}
