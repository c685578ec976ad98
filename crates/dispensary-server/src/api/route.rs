//! Route registration for all HTTP endpoints

use actix_web::web;

use super::{admin, health, medicine, prescription};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(medicine::list_medicines)
        .service(medicine::dispense_stock)
        .service(prescription::routes())
        .service(admin::routes())
        .service(health::health);
}
