// Actix-web rendering of application errors
// InventoryError lives in dispensary-common, so the ResponseError impl needs a local wrapper.

use std::fmt::{Display, Formatter};

use actix_web::HttpResponse;
use tracing::error;

pub use dispensary_common::error::{
    DATA_ACCESS_ERROR, INSUFFICIENT_STOCK, LOCK_STORE_UNAVAILABLE, PARAMETER_VALIDATE_ERROR,
    RESOURCE_CONFLICT, RESOURCE_NOT_FOUND, SERVER_ERROR, SUCCESS,
};
pub use dispensary_common::{ErrorCode, InventoryError};

use crate::model::response as common;

#[derive(Debug)]
pub struct AppError {
    inner: anyhow::Error,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError { inner: value }
    }
}

impl From<InventoryError> for AppError {
    fn from(value: InventoryError) -> Self {
        AppError {
            inner: anyhow::Error::new(value),
        }
    }
}

impl AppError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn downcast_ref<E: std::error::Error + Send + Sync + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }
}

impl actix_web::error::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self.downcast_ref::<InventoryError>() {
            Some(e) => {
                if e.status() >= 500 {
                    error!(error = %e, "Request failed");
                }
                common::Result::<String>::http_response(
                    e.status(),
                    e.error_code().code,
                    e.to_string(),
                    String::new(),
                )
            }
            None => {
                error!(error = %self.inner, "Unhandled error");
                common::Result::<String>::http_response(
                    500,
                    SERVER_ERROR.code,
                    self.inner.to_string(),
                    String::new(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::ResponseError;
    use actix_web::body::MessageBody;
    use actix_web::http::StatusCode;

    use super::*;

    fn body_json(resp: HttpResponse) -> serde_json::Value {
        let bytes = resp.into_body().try_into_bytes().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_insufficient_quantity_renders_400() {
        let err = AppError::from(InventoryError::InsufficientQuantity {
            name: "aspirin".to_string(),
            available: 3,
            requested: 5,
        });
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json = body_json(resp);
        assert_eq!(json["code"], INSUFFICIENT_STOCK.code);
        assert_eq!(json["message"], "not enough stock. Available: 3");
    }

    #[test]
    fn test_lock_timeout_renders_409() {
        let err = AppError::from(InventoryError::LockTimeout("lock:medicine:a".to_string()));
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(resp)["message"], "system busy, try again later");
    }

    #[test]
    fn test_foreign_error_renders_500() {
        let err = AppError::from(anyhow::anyhow!("boom"));
        assert!(err.downcast_ref::<InventoryError>().is_none());

        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp)["code"], SERVER_ERROR.code);
    }
}
