// Prescription records; they never touch stock, so no lock is taken

use std::sync::Arc;

use tracing::info;

use dispensary_common::InventoryError;
use dispensary_persistence::{PersistenceService, PrescriptionInfo};

use crate::model::CreatePrescriptionRequest;

pub struct PrescriptionService {
    persistence: Arc<dyn PersistenceService>,
}

impl PrescriptionService {
    pub fn new(persistence: Arc<dyn PersistenceService>) -> Self {
        Self { persistence }
    }

    pub async fn create(
        &self,
        request: &CreatePrescriptionRequest,
    ) -> Result<PrescriptionInfo, InventoryError> {
        let patient_name = request.patient_name.trim();
        let medicine_name = request.medicine_name.trim();

        if patient_name.is_empty() {
            return Err(InventoryError::illegal_argument("patient name is required"));
        }
        if medicine_name.is_empty() {
            return Err(InventoryError::illegal_argument("medicine name is required"));
        }
        if request.quantity <= 0 {
            return Err(InventoryError::illegal_argument(
                "quantity must be greater than zero",
            ));
        }

        let created = self
            .persistence
            .prescription_create(
                patient_name,
                medicine_name,
                request.dosage.trim(),
                request.quantity,
            )
            .await
            .map_err(InventoryError::persistence)?;

        info!(id = created.id, medicine = %medicine_name, "Prescription created");
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<PrescriptionInfo>, InventoryError> {
        self.persistence
            .prescription_find_all()
            .await
            .map_err(InventoryError::persistence)
    }
}
