//! `SeaORM` entities for the dispensary schema

pub mod prelude;

pub mod medicine;
pub mod prescription;
