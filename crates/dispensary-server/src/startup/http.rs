//! HTTP server setup.

use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, error, middleware::Logger, web};

use dispensary_common::error::PARAMETER_VALIDATE_ERROR;

use crate::{api, model::common::AppState, model::response::Result};

/// Malformed request bodies get the same envelope as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = Result::<String>::http_response(
            400,
            PARAMETER_VALIDATE_ERROR.code,
            format!("caused: {}", err),
            String::new(),
        );
        error::InternalError::from_response(err, response).into()
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).configure(api::route::routes);
}

/// Creates and binds the main HTTP server.
pub fn main_server(
    app_state: Arc<AppState>,
    address: String,
    port: u16,
) -> std::result::Result<Server, std::io::Error> {
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::from(app_state.clone()))
            .configure(configure_routes)
    })
    .bind((address, port))?
    .run())
}
