//! GET /health - storage backend check

use actix_web::{Responder, get, web};
use serde::Serialize;

use dispensary_common::error::DATA_ACCESS_ERROR;

use crate::{model::common::AppState, model::response::Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub storage_mode: String,
}

#[get("/health")]
pub async fn health(data: web::Data<AppState>) -> impl Responder {
    let storage_mode = data.persistence.storage_mode().to_string();

    match data.persistence.health_check().await {
        Ok(()) => Result::<()>::http_success(HealthStatus {
            status: "UP",
            storage_mode,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            Result::<HealthStatus>::http_response(
                503,
                DATA_ACCESS_ERROR.code,
                e.to_string(),
                HealthStatus {
                    status: "DOWN",
                    storage_mode,
                },
            )
        }
    }
}
