//! Native memory gateway
//!
//! Buffers handed to libcryptsetup, and buffers it hands back, must come from
//! the allocator libcryptsetup itself links against. The gateway resolves that
//! allocator from the C runtime at load time instead of using Rust's global
//! allocator.

use crate::abi::{from_size, to_size};
use crate::dl::libc::LibcSymbols;
use crate::error::{CryptError, CryptResult};
use libloading::Library;
use std::ffi::{c_char, c_void};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

/// Count of gateway allocations and releases since creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocationStats {
    pub allocations: u64,
    pub releases: u64,
}

impl AllocationStats {
    /// Buffers allocated but not yet released
    pub fn outstanding(&self) -> u64 {
        self.allocations.saturating_sub(self.releases)
    }

    /// Activity between an earlier snapshot and this one
    pub fn since(&self, earlier: AllocationStats) -> AllocationStats {
        AllocationStats {
            allocations: self.allocations - earlier.allocations,
            releases: self.releases - earlier.releases,
        }
    }
}

/// Allocate, release and copy through the C runtime
pub struct MemoryGateway {
    _library: Option<Library>,
    symbols: LibcSymbols,
    allocations: AtomicU64,
    releases: AtomicU64,
}

impl MemoryGateway {
    /// Bind the gateway to an opened C runtime.
    ///
    /// # Safety
    ///
    /// `library` must be the C runtime libcryptsetup is linked against.
    pub unsafe fn bind(library: Library, library_name: &str) -> CryptResult<Self> {
        let symbols = LibcSymbols::resolve(&library, library_name)?;
        tracing::debug!(library = library_name, "bound native memory gateway");
        Ok(Self {
            _library: Some(library),
            symbols,
            allocations: AtomicU64::new(0),
            releases: AtomicU64::new(0),
        })
    }

    /// Build a gateway from host-supplied primitives.
    ///
    /// # Safety
    ///
    /// The pointers must implement the C semantics of `malloc`, `free`,
    /// `memcpy`, `strlen` and `strncpy`, and `free` must accept what `malloc`
    /// returns.
    pub unsafe fn from_symbols(symbols: LibcSymbols) -> Self {
        Self {
            _library: None,
            symbols,
            allocations: AtomicU64::new(0),
            releases: AtomicU64::new(0),
        }
    }

    /// Allocate `size` bytes. A null result is an allocation error.
    pub fn allocate(&self, size: usize) -> CryptResult<NonNull<u8>> {
        // Safety: malloc has no preconditions.
        let ptr = unsafe { (self.symbols.malloc)(to_size(size)) };
        match NonNull::new(ptr.cast::<u8>()) {
            Some(ptr) => {
                self.allocations.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(size, "native allocate");
                Ok(ptr)
            }
            None => {
                tracing::warn!(size, "native allocation failed");
                Err(CryptError::Allocation { size })
            }
        }
    }

    /// Release a buffer. Null is ignored.
    ///
    /// # Safety
    ///
    /// `ptr` must come from this allocator and must not be used afterwards.
    pub unsafe fn release(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        (self.symbols.free)(ptr.cast::<c_void>());
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy `len` bytes from `src` to `dst`.
    ///
    /// # Safety
    ///
    /// Both regions must be valid for `len` bytes and must not overlap.
    pub unsafe fn copy(&self, dst: *mut u8, src: *const u8, len: usize) {
        if len == 0 {
            return;
        }
        (self.symbols.memcpy)(dst.cast::<c_void>(), src.cast::<c_void>(), to_size(len));
    }

    /// Length of a NUL-terminated byte string, terminator excluded.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a NUL-terminated string.
    pub unsafe fn measure_length(&self, ptr: *const c_char) -> usize {
        from_size((self.symbols.strlen)(ptr))
    }

    /// Copy at most `len` bytes of a NUL-terminated string, padding with NUL.
    ///
    /// # Safety
    ///
    /// `dst` must be valid for `len` bytes; `src` must be NUL-terminated or
    /// readable for `len` bytes.
    pub unsafe fn bounded_copy(&self, dst: *mut c_char, src: *const c_char, len: usize) {
        if len == 0 {
            return;
        }
        (self.symbols.strncpy)(dst, src, to_size(len));
    }

    pub fn stats(&self) -> AllocationStats {
        AllocationStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
        }
    }
}
