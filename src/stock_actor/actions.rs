/// Custom actions for stock entries.
///
/// Decrements are deliberately absent: they go through versioned updates so the
/// ledger can check availability against the value it read.
#[derive(Debug, Clone)]
pub enum StockAction {
    /// Adds units back. Returns the new quantity.
    ///
    /// # Errors
    /// Fails with `InvalidQuantity` if the count would overflow.
    Restock(u32),
}
