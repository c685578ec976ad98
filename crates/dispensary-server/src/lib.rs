//! Dispensary server - HTTP surface, configuration and bootstrap
//!
//! Stock-changing endpoints run through `StockService`, which serialises every
//! mutation of a medicine on its resource lock.

pub mod api;
pub mod error;
pub mod model;
pub mod startup;

pub use error::AppError;
