//! Domain model types for the persistence abstraction layer
//!
//! These types are returned by the persistence traits, decoupled from the
//! storage backend that produced them.

use serde::{Deserialize, Serialize};

use crate::entity::{medicine, prescription};

/// A stock record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInfo {
    pub id: i64,
    pub name: String,
    pub dosage_form: String,
    pub stock_quantity: i32,
}

impl From<medicine::Model> for MedicineInfo {
    fn from(value: medicine::Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            dosage_form: value.dosage_form,
            stock_quantity: value.stock_quantity,
        }
    }
}

/// Identifier and quantity of a stock record, read before a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub id: i64,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionInfo {
    pub id: i64,
    pub patient_name: String,
    pub medicine_name: String,
    pub dosage: String,
    pub quantity: i32,
}

impl From<prescription::Model> for PrescriptionInfo {
    fn from(value: prescription::Model) -> Self {
        Self {
            id: value.id,
            patient_name: value.patient_name,
            medicine_name: value.medicine_name,
            dosage: value.dosage,
            quantity: value.quantity,
        }
    }
}

/// Storage mode for the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageMode {
    /// External database (MySQL/PostgreSQL via SeaORM)
    ExternalDb,
    /// Process memory, lost on restart
    Memory,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::ExternalDb => write!(f, "external"),
            StorageMode::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "external" | "external_db" => Ok(StorageMode::ExternalDb),
            "memory" => Ok(StorageMode::Memory),
            _ => Err(format!("Invalid storage mode: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_mode_parse() {
        assert_eq!("external".parse::<StorageMode>(), Ok(StorageMode::ExternalDb));
        assert_eq!("Memory".parse::<StorageMode>(), Ok(StorageMode::Memory));
        assert!("rocksdb".parse::<StorageMode>().is_err());
        assert_eq!(StorageMode::ExternalDb.to_string(), "external");
    }
}
