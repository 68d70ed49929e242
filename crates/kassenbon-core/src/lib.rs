//! Shared domain types and configuration for the receipt tools: the
//! canonical [`Receipt`] record, locale-decimal amount handling, and the
//! env-driven [`AppConfig`].

use thiserror::Error;

pub mod amount;
pub mod app_config;
pub mod config;
pub mod receipt;

pub use app_config::AppConfig;
pub use config::{load_config, load_config_from_env};
pub use receipt::{ItemUnit, LineItem, Receipt};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
