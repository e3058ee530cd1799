//! Global Configuration (~/.cryptdl/config.toml)

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.cryptdl/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Native library locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryConfig>,

    /// Logging settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Where the native libraries live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// soname or path of libcryptsetup (default: libcryptsetup.so.12)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cryptsetup: Option<String>,

    /// soname or path of the C runtime (default: libc.so.6)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libc: Option<String>,

    /// Directories searched before the system library path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default log filter ("error", "warn", "info", "debug", "trace")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// libcryptsetup debug level: 0 (none) or -1 (all)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_debug: Option<i32>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let config = Self::parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file without validating its values
    pub(crate) fn parse_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(library) = &self.library {
            library.validate()?;
        }
        if let Some(logging) = &self.logging {
            logging.validate()?;
        }
        Ok(())
    }

    /// Get the global config file path (~/.cryptdl/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".cryptdl").join("config.toml"))
    }
}

impl LibraryConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        validate_library_name("library.cryptsetup", self.cryptsetup.as_deref())?;
        validate_library_name("library.libc", self.libc.as_deref())?;
        for path in &self.search_paths {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "library.search_paths".to_string(),
                    reason: "empty directory".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(level) = &self.level {
            validate_log_level("logging.level", level)?;
        }
        if let Some(debug) = self.native_debug {
            validate_native_debug("logging.native_debug", debug)?;
        }
        Ok(())
    }
}

fn validate_library_name(field: &str, name: Option<&str>) -> ConfigResult<()> {
    match name {
        Some(name) if name.trim().is_empty() => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "library name must not be empty".to_string(),
        }),
        Some(name) if name.contains('\0') => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "library name contains a NUL byte".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Validate a log level name
pub(crate) fn validate_log_level(field: &str, level: &str) -> ConfigResult<()> {
    if !matches!(level, "error" | "warn" | "info" | "debug" | "trace") {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!(
                "must be 'error', 'warn', 'info', 'debug', or 'trace', got '{}'",
                level
            ),
        });
    }
    Ok(())
}

/// Validate a libcryptsetup debug level
pub(crate) fn validate_native_debug(field: &str, debug: i32) -> ConfigResult<()> {
    if !matches!(debug, -1 | 0) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("must be 0 or -1, got {}", debug),
        });
    }
    Ok(())
}
