//! cryptdl Configuration
//!
//! Tells the bindings where to find libcryptsetup and the C runtime, and how
//! chatty to be about it.
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Global config (~/.cryptdl/config.toml)
//! 2. Environment variables (CRYPTDL_*)
//! 3. CLI flags (handled by the caller)
//!
//! # Example
//!
//! ```no_run
//! use cryptdl_config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load().unwrap();
//! println!("libcryptsetup: {:?}", config.library.cryptsetup);
//! ```

pub mod global;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::{GlobalConfig, LibraryConfig, LoggingConfig};
pub use loader::{Config, ConfigLoader};
