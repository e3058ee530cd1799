//! Process-wide libcryptsetup bindings
//!
//! [`ensure_ready`] opens libcryptsetup and the C runtime on first use and
//! hands every later caller the same [`Bindings`]. Tests and embedders that
//! supply their own function pointers build a `Bindings` with
//! [`Bindings::from_parts`] and pass it to the `*_with` constructors of
//! [`Device`](crate::Device).

use crate::abi::CInt;
use crate::dl::crypt::CryptLibrary;
use crate::dl::loader::{self, LibraryOptions};
use crate::dl::slot::InitSlot;
use crate::error::{check, CryptError, CryptResult};
use crate::marshal::{read_text, DeallocationPlan};
use crate::memory::MemoryGateway;
use std::sync::Arc;

/// Bound libcryptsetup plus the allocator it shares with us
pub struct Bindings {
    pub(crate) crypt: CryptLibrary,
    pub(crate) memory: MemoryGateway,
}

static BINDINGS: InitSlot<Bindings> = InitSlot::new();

/// Bindings for this process, opening them on first use.
///
/// Library locations come from [`LibraryOptions::resolve`]. A failed load is
/// retried by the next caller.
pub fn ensure_ready() -> CryptResult<Arc<Bindings>> {
    BINDINGS.get_or_open(|| Bindings::open(&LibraryOptions::resolve()))
}

impl Bindings {
    /// Open and bind both native libraries.
    pub fn open(options: &LibraryOptions) -> CryptResult<Self> {
        let libc = loader::open(&options.libc, &options.search_paths)?;
        // Safety: the C runtime exports these symbols with C signatures.
        let memory = unsafe { MemoryGateway::bind(libc, &options.libc)? };

        let crypt = loader::open(&options.cryptsetup, &options.search_paths)?;
        // Safety: the soname pins the 2.x ABI the symbol table is written for.
        let crypt = unsafe { CryptLibrary::bind(crypt, &options.cryptsetup)? };

        tracing::info!(
            cryptsetup = %options.cryptsetup,
            abi = %crate::abi::ABI_MODEL,
            "libcryptsetup bindings ready"
        );
        Ok(Self { crypt, memory })
    }

    /// Combine independently bound parts.
    pub fn from_parts(crypt: CryptLibrary, memory: MemoryGateway) -> Self {
        Self { crypt, memory }
    }

    pub fn memory(&self) -> &MemoryGateway {
        &self.memory
    }

    /// Optional entry points the loaded libcryptsetup exports
    pub fn capabilities(&self) -> Vec<&'static str> {
        self.crypt.capabilities()
    }

    /// Set libcryptsetup's global debug level (`CRYPT_DEBUG_*`).
    pub fn set_debug_level(&self, level: CInt) {
        // Safety: takes a plain integer.
        unsafe { (self.crypt.symbols.crypt_set_debug_level)(level) };
    }

    /// Maximum number of tokens a device of `device_type` can hold.
    pub fn token_max(&self, device_type: &str) -> CryptResult<i32> {
        let token_max = self
            .crypt
            .optional
            .crypt_token_max
            .ok_or(CryptError::Unavailable {
                symbol: "crypt_token_max",
            })?;
        let mut plan = DeallocationPlan::new(&self.memory);
        let device_type = plan.text(device_type)?;
        // Safety: device_type is a NUL-terminated string owned by the plan.
        let code = unsafe { token_max(device_type) };
        check("crypt_token_max", code)
    }

    /// Stop libcryptsetup from loading external token plugins.
    pub fn token_external_disable(&self) -> CryptResult<()> {
        let disable = self
            .crypt
            .optional
            .crypt_token_external_disable
            .ok_or(CryptError::Unavailable {
                symbol: "crypt_token_external_disable",
            })?;
        // Safety: no arguments.
        unsafe { disable() };
        Ok(())
    }

    /// Directory searched for external token plugins, `None` when disabled.
    pub fn token_external_path(&self) -> CryptResult<Option<String>> {
        let path = self
            .crypt
            .optional
            .crypt_token_external_path
            .ok_or(CryptError::Unavailable {
                symbol: "crypt_token_external_path",
            })?;
        // Safety: the returned string is static library data; it is copied,
        // never freed.
        Ok(unsafe { read_text(&self.memory, path()) })
    }
}

/// [`Bindings::set_debug_level`] on the process bindings
pub fn set_debug_level(level: CInt) -> CryptResult<()> {
    ensure_ready()?.set_debug_level(level);
    Ok(())
}

/// [`Bindings::token_max`] on the process bindings
pub fn token_max(device_type: &str) -> CryptResult<i32> {
    ensure_ready()?.token_max(device_type)
}

/// [`Bindings::token_external_disable`] on the process bindings
pub fn token_external_disable() -> CryptResult<()> {
    ensure_ready()?.token_external_disable()
}

/// [`Bindings::token_external_path`] on the process bindings
pub fn token_external_path() -> CryptResult<Option<String>> {
    ensure_ready()?.token_external_path()
}
