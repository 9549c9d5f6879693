//! liqflow application: configuration, logging and orchestration.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::Application;
pub use config::{AppConfig, WsConfig};
pub use error::{AppError, AppResult};
pub use logging::init_logging;
