//! cryptdl - runtime-loaded bindings for libcryptsetup
//!
//! This library provides:
//! - Native integer widths for the build target (`abi`)
//! - Loading and binding of libcryptsetup and the C runtime (`dl`)
//! - Native memory management through the C allocator (`memory`, `marshal`)
//! - The device handle and its operations (`device`)
//!
//! Nothing is linked at build time. The first call that needs libcryptsetup
//! opens it; a host without it gets [`CryptError::Load`] instead of a failure
//! to start.

/// cryptdl version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod abi;
pub mod bindings;
pub mod consts;
pub mod device;
pub mod dl;
pub mod error;
pub mod hooks;
pub mod marshal;
pub mod memory;
pub mod params;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use abi::{AbiModel, CInt, CSizeT, ABI_MODEL};
pub use bindings::{
    ensure_ready, set_debug_level, token_external_disable, token_external_path, token_max,
    Bindings,
};
pub use consts::TokenInfo;
pub use device::Device;
pub use dl::crypt::{CryptLibrary, CryptSymbols, OptionalCryptSymbols};
pub use dl::libc::LibcSymbols;
pub use dl::loader::LibraryOptions;
pub use error::{CryptError, CryptResult};
pub use hooks::{LogHook, LogLevel, ProgressHook, TracingLog};
pub use marshal::DeallocationPlan;
pub use memory::{AllocationStats, MemoryGateway};
pub use params::{
    DeviceType, GenericParams, IntegrityParams, Luks1, Luks2, PbkdfType, Plain,
    TokenParamsLuks2Keyring,
};
