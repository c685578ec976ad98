//! In-memory persistence backend
//!
//! Each call is atomic on its own, but nothing isolates a sequence of calls:
//! a read followed by a write can interleave with other callers exactly as it
//! would against the external database. Every call yields to the scheduler
//! first, standing in for the round-trip a real store would take.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::bail;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::model::*;
use crate::traits::*;

#[derive(Debug, Clone)]
struct MedicineRow {
    name: String,
    dosage_form: String,
    stock_quantity: i32,
}

/// Process-memory persistence service
#[derive(Default)]
pub struct MemoryPersistService {
    medicines: RwLock<BTreeMap<i64, MedicineRow>>,
    prescriptions: RwLock<BTreeMap<i64, PrescriptionInfo>>,
    next_medicine_id: AtomicI64,
    next_prescription_id: AtomicI64,
}

impl MemoryPersistService {
    pub fn new() -> Self {
        Self::default()
    }

    fn info(id: i64, row: &MedicineRow) -> MedicineInfo {
        MedicineInfo {
            id,
            name: row.name.clone(),
            dosage_form: row.dosage_form.clone(),
            stock_quantity: row.stock_quantity,
        }
    }

    fn find_id_by_name(medicines: &BTreeMap<i64, MedicineRow>, name: &str) -> Option<i64> {
        let name = name.to_lowercase();
        medicines
            .iter()
            .find(|(_, row)| row.name.to_lowercase() == name)
            .map(|(id, _)| *id)
    }
}

#[async_trait]
impl PersistenceService for MemoryPersistService {
    fn storage_mode(&self) -> StorageMode {
        StorageMode::Memory
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl StockPersistence for MemoryPersistService {
    async fn medicine_find_stock(&self, name: &str) -> anyhow::Result<Option<StockLevel>> {
        tokio::task::yield_now().await;

        let medicines = self.medicines.read();
        Ok(Self::find_id_by_name(&medicines, name).and_then(|id| {
            medicines.get(&id).map(|row| StockLevel {
                id,
                stock_quantity: row.stock_quantity,
            })
        }))
    }

    async fn medicine_insert(
        &self,
        name: &str,
        dosage_form: &str,
        stock_quantity: i32,
    ) -> anyhow::Result<MedicineInfo> {
        tokio::task::yield_now().await;

        let mut medicines = self.medicines.write();
        // Mirrors the unique constraint on the name column
        if medicines.values().any(|row| row.name == name) {
            bail!("duplicate medicine name '{}'", name);
        }

        let id = self.next_medicine_id.fetch_add(1, Ordering::Relaxed) + 1;
        let row = MedicineRow {
            name: name.to_string(),
            dosage_form: dosage_form.to_string(),
            stock_quantity,
        };
        let info = Self::info(id, &row);
        medicines.insert(id, row);
        Ok(info)
    }

    async fn medicine_increment(
        &self,
        id: i64,
        delta: i32,
    ) -> anyhow::Result<Option<MedicineInfo>> {
        tokio::task::yield_now().await;

        let mut medicines = self.medicines.write();
        let Some(row) = medicines.get_mut(&id) else {
            return Ok(None);
        };
        let Some(stock_quantity) = row.stock_quantity.checked_add(delta) else {
            bail!("stock quantity overflow for medicine {}", id);
        };
        row.stock_quantity = stock_quantity;
        Ok(Some(Self::info(id, row)))
    }

    async fn medicine_decrement(&self, id: i64, quantity: i32) -> anyhow::Result<bool> {
        tokio::task::yield_now().await;

        let mut medicines = self.medicines.write();
        let Some(row) = medicines.get_mut(&id) else {
            return Ok(false);
        };
        let Some(stock_quantity) = row.stock_quantity.checked_sub(quantity) else {
            bail!("stock quantity underflow for medicine {}", id);
        };
        row.stock_quantity = stock_quantity;
        Ok(true)
    }

    async fn medicine_find_by_id(&self, id: i64) -> anyhow::Result<Option<MedicineInfo>> {
        tokio::task::yield_now().await;

        Ok(self
            .medicines
            .read()
            .get(&id)
            .map(|row| Self::info(id, row)))
    }

    async fn medicine_find_all(&self) -> anyhow::Result<Vec<MedicineInfo>> {
        tokio::task::yield_now().await;

        Ok(self
            .medicines
            .read()
            .iter()
            .map(|(id, row)| Self::info(*id, row))
            .collect())
    }

    async fn medicine_delete(&self, name: &str) -> anyhow::Result<bool> {
        tokio::task::yield_now().await;

        let mut medicines = self.medicines.write();
        Ok(Self::find_id_by_name(&medicines, name)
            .and_then(|id| medicines.remove(&id))
            .is_some())
    }
}

#[async_trait]
impl PrescriptionPersistence for MemoryPersistService {
    async fn prescription_create(
        &self,
        patient_name: &str,
        medicine_name: &str,
        dosage: &str,
        quantity: i32,
    ) -> anyhow::Result<PrescriptionInfo> {
        tokio::task::yield_now().await;

        let id = self.next_prescription_id.fetch_add(1, Ordering::Relaxed) + 1;
        let info = PrescriptionInfo {
            id,
            patient_name: patient_name.to_string(),
            medicine_name: medicine_name.to_string(),
            dosage: dosage.to_string(),
            quantity,
        };
        self.prescriptions.write().insert(id, info.clone());
        Ok(info)
    }

    async fn prescription_find_all(&self) -> anyhow::Result<Vec<PrescriptionInfo>> {
        tokio::task::yield_now().await;

        Ok(self.prescriptions.read().values().cloned().collect())
    }
}
