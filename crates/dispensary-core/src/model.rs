//! Request models for the stock and prescription services
//!
//! Fields are camelCase on the wire; the snake_case spellings are accepted as aliases.

use serde::{Deserialize, Serialize};

/// Add stock to a medicine, creating it when unknown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMedicineRequest {
    pub name: String,
    #[serde(default, alias = "dosage_form")]
    pub dosage_form: String,
    #[serde(alias = "stock_quantity")]
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispenseRequest {
    pub name: String,
    #[serde(alias = "stock_quantity", alias = "stockQuantity")]
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMedicineRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    #[serde(alias = "patientname", alias = "patient_name")]
    pub patient_name: String,
    #[serde(alias = "medicinename", alias = "medicine_name")]
    pub medicine_name: String,
    #[serde(default)]
    pub dosage: String,
    pub quantity: i32,
}
