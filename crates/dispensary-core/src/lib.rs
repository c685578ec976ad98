//! Dispensary Core - Stock and prescription services
//!
//! This crate provides:
//! - Request models accepted by the services
//! - `StockService`: guarded stock mutations (add, dispense, delete) and listing
//! - `PrescriptionService`: prescription records

pub mod model;
pub mod service;

pub use model::{AddMedicineRequest, CreatePrescriptionRequest, DeleteMedicineRequest, DispenseRequest};
pub use service::{PrescriptionService, StockService};
