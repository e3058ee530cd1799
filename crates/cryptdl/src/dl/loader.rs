//! Shared library loading
//!
//! Resolves a soname against the configured candidates and opens it with
//! `libloading`. Libraries are opened with `RTLD_NOW | RTLD_GLOBAL` so that
//! missing dependencies fail here instead of at the first call.

use crate::error::{CryptError, CryptResult};
use libloading::Library;
use std::path::{Path, PathBuf};

/// soname of the libcryptsetup ABI this crate is written against
pub const CRYPTSETUP_SONAME: &str = "libcryptsetup.so.12";

/// soname of the C runtime providing the allocator libcryptsetup uses
pub const LIBC_SONAME: &str = "libc.so.6";

/// Where to look for the native libraries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryOptions {
    /// Name or absolute path of libcryptsetup
    pub cryptsetup: String,
    /// Name or absolute path of the C runtime
    pub libc: String,
    /// Directories tried before the system search path
    pub search_paths: Vec<PathBuf>,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            cryptsetup: CRYPTSETUP_SONAME.to_string(),
            libc: LIBC_SONAME.to_string(),
            search_paths: Vec::new(),
        }
    }
}

impl LibraryOptions {
    /// Build options from the user configuration, keeping defaults for
    /// anything left unset.
    pub fn from_config(config: &cryptdl_config::LibraryConfig) -> Self {
        let defaults = Self::default();
        Self {
            cryptsetup: config.cryptsetup.clone().unwrap_or(defaults.cryptsetup),
            libc: config.libc.clone().unwrap_or(defaults.libc),
            search_paths: config.search_paths.clone(),
        }
    }

    /// Options from the `[library]` section of `~/.cryptdl/config.toml` and
    /// the `CRYPTDL_LIBRARY*` variables, or defaults when that section
    /// cannot be loaded. Logging settings are not consulted.
    pub fn resolve() -> Self {
        Self::resolve_with(&mut cryptdl_config::ConfigLoader::new())
    }

    /// [`resolve`](Self::resolve) through an explicit loader.
    pub fn resolve_with(loader: &mut cryptdl_config::ConfigLoader) -> Self {
        match loader.load_library() {
            Ok(library) => Self::from_config(&library),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring invalid cryptdl library configuration");
                Self::default()
            }
        }
    }
}

/// Candidate files for `name`, most specific first.
///
/// A name containing a path separator is used as is. Otherwise each search
/// directory is tried, and finally the bare name is handed to the system
/// dynamic linker.
pub fn candidates(name: &str, search_paths: &[PathBuf]) -> Vec<PathBuf> {
    let path = Path::new(name);
    if path.components().count() > 1 {
        return vec![path.to_path_buf()];
    }

    let mut out: Vec<PathBuf> = search_paths
        .iter()
        .map(|dir| dir.join(name))
        .filter(|candidate| candidate.exists())
        .collect();
    out.push(path.to_path_buf());
    out
}

/// Open a native library by soname or path.
#[cfg(target_os = "linux")]
pub fn open(name: &str, search_paths: &[PathBuf]) -> CryptResult<Library> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};

    let mut last_error = None;
    for candidate in candidates(name, search_paths) {
        // Safety: running the library's initializers is inherent to loading
        // it; the caller chose which library to trust.
        match unsafe { UnixLibrary::open(Some(&candidate), RTLD_NOW | RTLD_GLOBAL) } {
            Ok(library) => {
                tracing::debug!(library = %candidate.display(), "opened native library");
                return Ok(library.into());
            }
            Err(e) => {
                tracing::trace!(library = %candidate.display(), error = %e, "candidate rejected");
                last_error = Some(e.to_string());
            }
        }
    }

    let reason = last_error.unwrap_or_else(|| "no candidate paths".to_string());
    tracing::warn!(library = name, %reason, "failed to load native library");
    Err(CryptError::Load {
        library: name.to_string(),
        reason,
    })
}

/// Open a native library by soname or path.
#[cfg(not(target_os = "linux"))]
pub fn open(name: &str, _search_paths: &[PathBuf]) -> CryptResult<Library> {
    Err(CryptError::Unsupported {
        what: format!("loading {}", name),
    })
}
