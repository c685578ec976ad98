//! Prescriptions
//!
//! - POST /presc - record a prescription
//! - GET  /presc - list prescriptions

use actix_web::{Responder, get, post, web};

use dispensary_core::CreatePrescriptionRequest;

use crate::{error::AppError, model::common::AppState, model::response::Result};

#[post("")]
pub async fn create_prescription(
    data: web::Data<AppState>,
    body: web::Json<CreatePrescriptionRequest>,
) -> std::result::Result<impl Responder, AppError> {
    let prescription = data.prescriptions.create(&body).await?;

    Ok(Result::<()>::http_success(prescription))
}

#[get("")]
pub async fn list_prescriptions(
    data: web::Data<AppState>,
) -> std::result::Result<impl Responder, AppError> {
    let prescriptions = data.prescriptions.list().await?;

    Ok(Result::<()>::http_success(prescriptions))
}

pub fn routes() -> actix_web::Scope {
    web::scope("/presc")
        .service(create_prescription)
        .service(list_prescriptions)
}
