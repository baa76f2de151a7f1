//! Error types for the perps console.

use perps_console::error::PerpsError;

use crate::config::ConfigError;

/// Main error type for the perps console.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),

    #[error("{0}")]
    Perps(#[from] PerpsError),
}

pub type Result<T> = std::result::Result<T, Error>;
