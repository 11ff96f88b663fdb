pub mod app;
pub mod config;

pub use app::{ApiDoc, HealthState, build_app};
pub use config::ServerConfig;
