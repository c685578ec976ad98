//! Administrative stock management
//!
//! - POST   /admin/addMedicine    - add stock, creating the medicine when unknown
//! - DELETE /admin/deleteMedicine - remove a medicine (JSON body `{"name": ...}`)
//! - GET    /admin/locks/stats    - resource lock counters

use actix_web::{Responder, delete, get, post, web};

use dispensary_core::{AddMedicineRequest, DeleteMedicineRequest};

use crate::{error::AppError, model::common::AppState, model::response::Result};

#[post("/addMedicine")]
pub async fn add_medicine(
    data: web::Data<AppState>,
    body: web::Json<AddMedicineRequest>,
) -> std::result::Result<impl Responder, AppError> {
    let medicine = data.stock.add_medicine(&body).await?;

    Ok(Result::<()>::http_success(medicine))
}

#[delete("/deleteMedicine")]
pub async fn delete_medicine(
    data: web::Data<AppState>,
    body: web::Json<DeleteMedicineRequest>,
) -> std::result::Result<impl Responder, AppError> {
    data.stock.delete_medicine(&body.name).await?;

    Ok(Result::<()>::http_success(true))
}

#[get("/locks/stats")]
pub async fn lock_stats(data: web::Data<AppState>) -> impl Responder {
    Result::<()>::http_success(data.stock.locks().stats())
}

pub fn routes() -> actix_web::Scope {
    web::scope("/admin")
        .service(add_medicine)
        .service(delete_medicine)
        .service(lock_stats)
}
