// Stock mutations guarded by the per-medicine resource lock
// Reads and writes inside a critical section are separate round-trips; the lock
// is the only thing keeping them consistent.

use std::sync::Arc;

use tracing::{debug, info};

use dispensary_common::InventoryError;
use dispensary_consistency::{LockCoordinator, LockKey};
use dispensary_persistence::{MedicineInfo, PersistenceService};

use crate::model::{AddMedicineRequest, DispenseRequest};

pub struct StockService {
    persistence: Arc<dyn PersistenceService>,
    locks: LockCoordinator,
}

impl StockService {
    pub fn new(persistence: Arc<dyn PersistenceService>, locks: LockCoordinator) -> Self {
        Self { persistence, locks }
    }

    pub fn locks(&self) -> &LockCoordinator {
        &self.locks
    }

    /// Increase the stock of a medicine, inserting it when the name is unknown
    pub async fn add_medicine(
        &self,
        request: &AddMedicineRequest,
    ) -> Result<MedicineInfo, InventoryError> {
        let name = required_name(&request.name)?;
        if request.stock_quantity < 0 {
            return Err(InventoryError::illegal_argument(
                "stock quantity must not be negative",
            ));
        }

        let dosage_form = request.dosage_form.trim();
        let delta = request.stock_quantity;
        self.locks
            .with_resource_lock(&LockKey::medicine(name), move || {
                self.upsert_increment(name, dosage_form, delta)
            })
            .await
    }

    /// Remove `quantity` units, failing without a write when stock is short
    pub async fn dispense(&self, request: &DispenseRequest) -> Result<MedicineInfo, InventoryError> {
        let name = required_name(&request.name)?;
        if request.quantity <= 0 {
            return Err(InventoryError::illegal_argument(
                "quantity must be greater than zero",
            ));
        }

        let quantity = request.quantity;
        self.locks
            .with_resource_lock(&LockKey::medicine(name), move || {
                self.dispense_decrement(name, quantity)
            })
            .await
    }

    pub async fn list_medicines(&self) -> Result<Vec<MedicineInfo>, InventoryError> {
        self.persistence
            .medicine_find_all()
            .await
            .map_err(InventoryError::persistence)
    }

    /// Delete a medicine; serialised with stock mutations on the same name
    pub async fn delete_medicine(&self, name: &str) -> Result<(), InventoryError> {
        let name = required_name(name)?;

        self.locks
            .with_resource_lock(&LockKey::medicine(name), move || async move {
                let deleted = self
                    .persistence
                    .medicine_delete(name)
                    .await
                    .map_err(InventoryError::persistence)?;
                if !deleted {
                    return Err(InventoryError::ResourceNotFound(name.to_string()));
                }

                info!(medicine = %name, "Medicine deleted");
                Ok(())
            })
            .await
    }

    async fn upsert_increment(
        &self,
        name: &str,
        dosage_form: &str,
        delta: i32,
    ) -> Result<MedicineInfo, InventoryError> {
        let existing = self
            .persistence
            .medicine_find_stock(name)
            .await
            .map_err(InventoryError::persistence)?;

        match existing {
            Some(level) => {
                if level.stock_quantity.checked_add(delta).is_none() {
                    return Err(InventoryError::illegal_argument(format!(
                        "stock quantity of '{}' would exceed {}",
                        name,
                        i32::MAX
                    )));
                }

                let updated = self
                    .persistence
                    .medicine_increment(level.id, delta)
                    .await
                    .map_err(InventoryError::persistence)?
                    .ok_or_else(|| InventoryError::ResourceNotFound(name.to_string()))?;

                info!(
                    medicine = %name,
                    delta,
                    stock_quantity = updated.stock_quantity,
                    "Medicine stock increased"
                );
                Ok(updated)
            }
            None => {
                let inserted = self
                    .persistence
                    .medicine_insert(name, dosage_form, delta)
                    .await
                    .map_err(InventoryError::persistence)?;

                info!(
                    medicine = %name,
                    stock_quantity = inserted.stock_quantity,
                    "Medicine added"
                );
                Ok(inserted)
            }
        }
    }

    async fn dispense_decrement(
        &self,
        name: &str,
        quantity: i32,
    ) -> Result<MedicineInfo, InventoryError> {
        let level = self
            .persistence
            .medicine_find_stock(name)
            .await
            .map_err(InventoryError::persistence)?
            .ok_or_else(|| InventoryError::ResourceNotFound(name.to_string()))?;

        if quantity > level.stock_quantity {
            debug!(
                medicine = %name,
                available = level.stock_quantity,
                requested = quantity,
                "Dispense rejected"
            );
            return Err(InventoryError::InsufficientQuantity {
                name: name.to_string(),
                available: level.stock_quantity,
                requested: quantity,
            });
        }

        let decremented = self
            .persistence
            .medicine_decrement(level.id, quantity)
            .await
            .map_err(InventoryError::persistence)?;
        if !decremented {
            return Err(InventoryError::ResourceNotFound(name.to_string()));
        }

        let current = self
            .persistence
            .medicine_find_by_id(level.id)
            .await
            .map_err(InventoryError::persistence)?
            .ok_or_else(|| InventoryError::ResourceNotFound(name.to_string()))?;

        info!(
            medicine = %name,
            quantity,
            stock_quantity = current.stock_quantity,
            "Medicine dispensed"
        );
        Ok(current)
    }
}

fn required_name(name: &str) -> Result<&str, InventoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InventoryError::illegal_argument("medicine name is required"));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_name_trims() {
        assert_eq!(required_name("  Aspirin ").unwrap(), "Aspirin");
        assert!(matches!(
            required_name("   "),
            Err(InventoryError::IllegalArgument(_))
        ));
    }
}
