//! Main entry point for the Dispensary server.

use dispensary_server::{model::common::Configuration, startup};
use tracing::info;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let configuration = Configuration::new()?;

    let logging_config = configuration.logging_config();
    let _logging_guard = startup::init_logging(&logging_config)?;

    info!(
        "Persistence mode: {}, lock store: {}",
        configuration.persistence_mode(),
        configuration.lock_store()
    );

    let (app_state, _background_tasks) = startup::build_app_state(&configuration).await?;

    let address = configuration.server_address();
    let port = configuration.server_port();
    info!("Starting HTTP server on {}:{}", address, port);

    startup::main_server(app_state, address, port)?.await?;

    info!("Server stopped");
    Ok(())
}
