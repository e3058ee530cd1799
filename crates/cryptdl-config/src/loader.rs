//! Configuration Loader
//!
//! Loads the global configuration and applies environment overrides.

use crate::global::{validate_log_level, validate_native_debug, GlobalConfig, LibraryConfig, LoggingConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::PathBuf;

/// Log filter used when nothing is configured
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Configuration loader
///
/// Sources, lowest priority first:
/// 1. Global config (~/.cryptdl/config.toml)
/// 2. Environment variables (CRYPTDL_*)
/// 3. CLI flags (handled by caller)
pub struct ConfigLoader {
    /// Global config path; `None` means ~/.cryptdl/config.toml
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub library: LibraryConfig,
    pub logging: LoggingConfig,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Read the global configuration from `path` instead of the home directory
    pub fn with_global_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load the global configuration and apply environment overrides
    pub fn load(&mut self) -> ConfigResult<Config> {
        let global = self.load_global_config()?;
        global.validate()?;
        Ok(Config {
            library: apply_library_env(global.library.unwrap_or_default())?,
            logging: apply_logging_env(global.logging.unwrap_or_default())?,
        })
    }

    /// Load only the `[library]` section and its environment overrides.
    ///
    /// Invalid logging settings, in the file or in `CRYPTDL_LOG` /
    /// `CRYPTDL_DEBUG`, do not affect the result.
    pub fn load_library(&mut self) -> ConfigResult<LibraryConfig> {
        let global = self.load_global_config()?;
        let library = global.library.unwrap_or_default();
        library.validate()?;
        apply_library_env(library)
    }

    /// Parse the global configuration. A missing file, or a missing home
    /// directory, yields the default configuration.
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        if self.global_config_path.is_none() {
            match GlobalConfig::global_config_path() {
                Ok(path) => self.global_config_path = Some(path),
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            }
        }

        match self.global_config_path.as_deref() {
            Some(path) if path.exists() => GlobalConfig::parse_file(path),
            _ => Ok(GlobalConfig::default()),
        }
    }
}

/// Apply library environment overrides
///
/// - CRYPTDL_LIBRARY: libcryptsetup soname or path
/// - CRYPTDL_LIBC: C runtime soname or path
/// - CRYPTDL_LIBRARY_PATH: search directories, `:`-separated
fn apply_library_env(mut library: LibraryConfig) -> ConfigResult<LibraryConfig> {
    if let Some(name) = non_empty_var("CRYPTDL_LIBRARY") {
        library.cryptsetup = Some(name);
    }

    if let Some(libc) = non_empty_var("CRYPTDL_LIBC") {
        library.libc = Some(libc);
    }

    if let Some(paths) = env::var_os("CRYPTDL_LIBRARY_PATH") {
        library.search_paths = env::split_paths(&paths)
            .filter(|path| !path.as_os_str().is_empty())
            .collect();
    }

    library.validate()?;
    Ok(library)
}

/// Apply logging environment overrides
///
/// - CRYPTDL_LOG: log level
/// - CRYPTDL_DEBUG: libcryptsetup debug (`1`/`true`/`all` or `0`/`false`/`none`)
fn apply_logging_env(mut logging: LoggingConfig) -> ConfigResult<LoggingConfig> {
    if let Some(level) = non_empty_var("CRYPTDL_LOG") {
        let level = level.to_lowercase();
        validate_log_level("CRYPTDL_LOG", &level)?;
        logging.level = Some(level);
    }

    if let Some(debug) = non_empty_var("CRYPTDL_DEBUG") {
        let level = parse_native_debug(&debug)?;
        validate_native_debug("CRYPTDL_DEBUG", level)?;
        logging.native_debug = Some(level);
    }

    Ok(logging)
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Effective log level (configured or "warn")
    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Effective libcryptsetup debug level (configured or 0)
    pub fn native_debug(&self) -> i32 {
        self.logging.native_debug.unwrap_or(0)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_native_debug(value: &str) -> ConfigResult<i32> {
    match value.trim().to_lowercase().as_str() {
        "1" | "-1" | "true" | "yes" | "all" => Ok(-1),
        "0" | "false" | "no" | "none" => Ok(0),
        other => Err(ConfigError::InvalidValue {
            field: "CRYPTDL_DEBUG".to_string(),
            reason: format!("expected a boolean or 'all'/'none', got '{}'", other),
        }),
    }
}
