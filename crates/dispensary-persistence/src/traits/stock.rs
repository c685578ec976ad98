//! Stock persistence trait
//!
//! Name lookups are case-insensitive.

use async_trait::async_trait;

use crate::model::{MedicineInfo, StockLevel};

#[async_trait]
pub trait StockPersistence: Send + Sync {
    /// Identifier and quantity of the medicine called `name`
    async fn medicine_find_stock(&self, name: &str) -> anyhow::Result<Option<StockLevel>>;

    /// Insert a new stock record
    async fn medicine_insert(
        &self,
        name: &str,
        dosage_form: &str,
        stock_quantity: i32,
    ) -> anyhow::Result<MedicineInfo>;

    /// Add `delta` to the quantity in one statement, returning the updated record
    async fn medicine_increment(&self, id: i64, delta: i32)
    -> anyhow::Result<Option<MedicineInfo>>;

    /// Subtract `quantity` in one statement; `false` when no row matched
    async fn medicine_decrement(&self, id: i64, quantity: i32) -> anyhow::Result<bool>;

    async fn medicine_find_by_id(&self, id: i64) -> anyhow::Result<Option<MedicineInfo>>;

    /// All stock records ordered by identifier
    async fn medicine_find_all(&self) -> anyhow::Result<Vec<MedicineInfo>>;

    /// Delete the medicine called `name`; `false` when none existed
    async fn medicine_delete(&self, name: &str) -> anyhow::Result<bool>;
}
