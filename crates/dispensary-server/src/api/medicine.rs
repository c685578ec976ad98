//! Medicine listing and dispensing
//!
//! - GET  /medicines     - list every medicine with its stock
//! - POST /dispenseStock - remove units from a medicine's stock

use actix_web::{Responder, get, post, web};

use dispensary_core::DispenseRequest;

use crate::{error::AppError, model::common::AppState, model::response::Result};

#[get("/medicines")]
pub async fn list_medicines(
    data: web::Data<AppState>,
) -> std::result::Result<impl Responder, AppError> {
    let medicines = data.stock.list_medicines().await?;

    Ok(Result::<()>::http_success(medicines))
}

/// Dispense stock
///
/// Runs under the medicine's resource lock. Answers 400 with the available
/// quantity when stock is short, 404 for an unknown medicine and 409 when
/// the lock could not be obtained in time.
#[post("/dispenseStock")]
pub async fn dispense_stock(
    data: web::Data<AppState>,
    body: web::Json<DispenseRequest>,
) -> std::result::Result<impl Responder, AppError> {
    let medicine = data.stock.dispense(&body).await?;

    tracing::info!(
        medicine = %medicine.name,
        quantity = body.quantity,
        stock_quantity = medicine.stock_quantity,
        "Stock dispensed via API"
    );

    Ok(Result::<()>::http_success(medicine))
}
