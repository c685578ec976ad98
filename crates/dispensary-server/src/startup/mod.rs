//! Application startup: logging, backend wiring and the HTTP server.

mod http;
mod logging;
mod state;

pub use http::{configure_routes, json_config, main_server};
pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};
pub use state::{BackgroundTasks, build_app_state};
