//! HTTP API handlers

pub mod admin;
pub mod health;
pub mod medicine;
pub mod prescription;
pub mod route;
