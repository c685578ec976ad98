pub use super::medicine::Entity as Medicine;
pub use super::prescription::Entity as Prescription;
