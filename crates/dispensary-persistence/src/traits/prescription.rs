//! Prescription persistence trait

use async_trait::async_trait;

use crate::model::PrescriptionInfo;

#[async_trait]
pub trait PrescriptionPersistence: Send + Sync {
    async fn prescription_create(
        &self,
        patient_name: &str,
        medicine_name: &str,
        dosage: &str,
        quantity: i32,
    ) -> anyhow::Result<PrescriptionInfo>;

    /// All prescriptions ordered by identifier
    async fn prescription_find_all(&self) -> anyhow::Result<Vec<PrescriptionInfo>>;
}
