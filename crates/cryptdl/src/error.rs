//! Error type shared by every layer of the binding

use thiserror::Error;

/// Errors returned by the loader, the binder, the memory gateway and the
/// device facade.
///
/// Load errors are retryable: the library may be installed later in the life
/// of the process. Everything else describes a fixed property of the host or
/// of the call that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptError {
    /// This platform cannot load libcryptsetup at all
    #[error("{what} is not supported on this platform")]
    Unsupported { what: String },

    /// A shared library could not be opened
    #[error("failed to load {library}: {reason}")]
    Load { library: String, reason: String },

    /// A required entry point is missing from a library that did load
    #[error("symbol '{symbol}' not found in {library}")]
    Bind { library: String, symbol: String },

    /// An optional entry point needed by this operation is not exported by the
    /// loaded libcryptsetup
    #[error("{symbol} is not available in the loaded libcryptsetup")]
    Unavailable { symbol: &'static str },

    /// The native allocator returned null
    #[error("native allocation of {size} bytes failed")]
    Allocation { size: usize },

    /// A libcryptsetup call returned a negative status
    #[error("{function} failed with code {code}")]
    Native { function: &'static str, code: i32 },

    /// Host text that has no native representation
    #[error("invalid string: {reason}")]
    InvalidString { reason: String },

    /// Host parameters that contradict each other
    #[error("invalid parameters: {reason}")]
    InvalidParams { reason: String },

    /// A context constructor reported success without producing a context
    #[error("{function} returned no device context")]
    NullHandle { function: &'static str },
}

impl CryptError {
    /// Whether retrying the same call later can succeed without rebuilding
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CryptError::Load { .. } | CryptError::Allocation { .. } | CryptError::Native { .. }
        )
    }

    /// Raw status of a failed native call
    pub fn native_code(&self) -> Option<i32> {
        match self {
            CryptError::Native { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for binding operations
pub type CryptResult<T> = Result<T, CryptError>;

/// Map a libcryptsetup status to a result: negative is failure, anything else
/// is passed through as the success value (often a keyslot or token id).
pub(crate) fn check(function: &'static str, code: i32) -> CryptResult<i32> {
    if code < 0 {
        tracing::debug!(function, code, "native call failed");
        Err(CryptError::Native { function, code })
    } else {
        tracing::trace!(function, code, "native call succeeded");
        Ok(code)
    }
}
