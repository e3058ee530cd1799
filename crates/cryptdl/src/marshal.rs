//! Scoped encoding of host values into native memory
//!
//! A [`DeallocationPlan`] is created for one native call. Every buffer the
//! call needs is allocated through the plan, which records the matching
//! release before the buffer is filled. When the plan is executed or dropped,
//! every recorded buffer is released exactly once, whether the call
//! succeeded, failed, or never happened because a later allocation failed.
//!
//! # Conventions
//!
//! - text is copied with a trailing NUL; `Some("")` is a one-byte buffer and
//!   `None` is a null pointer
//! - byte strings are copied at their exact length; an empty slice is null
//! - secrets are zeroed before they are released
//! - structs are copied into a buffer of exactly `size_of::<T>()` bytes

use crate::error::{CryptError, CryptResult};
use crate::memory::MemoryGateway;
use std::ffi::{c_char, c_void};
use std::mem::{align_of, size_of};
use std::ptr;

/// Largest alignment `malloc` guarantees on every supported target
const MALLOC_ALIGN: usize = 8;

#[derive(Debug)]
enum Release {
    Free(*mut u8),
    WipeAndFree(*mut u8, usize),
}

/// Pending releases for the native buffers of one call
pub struct DeallocationPlan<'g> {
    gateway: &'g MemoryGateway,
    releases: Vec<Release>,
}

impl<'g> DeallocationPlan<'g> {
    pub fn new(gateway: &'g MemoryGateway) -> Self {
        Self {
            gateway,
            releases: Vec::new(),
        }
    }

    /// Number of buffers waiting to be released
    pub fn pending(&self) -> usize {
        self.releases.len()
    }

    /// Allocate `size` uninitialized bytes owned by this plan.
    pub fn allocate(&mut self, size: usize) -> CryptResult<*mut u8> {
        let ptr = self.gateway.allocate(size)?.as_ptr();
        self.releases.push(Release::Free(ptr));
        Ok(ptr)
    }

    /// Copy `text` into a NUL-terminated native string.
    pub fn text(&mut self, text: &str) -> CryptResult<*const c_char> {
        if let Some(pos) = text.bytes().position(|b| b == 0) {
            return Err(CryptError::InvalidString {
                reason: format!("interior NUL byte at offset {}", pos),
            });
        }
        let len = text.len();
        let buf = self.allocate(len + 1)?;
        // Safety: buf holds len + 1 bytes and does not overlap text.
        unsafe {
            self.gateway.copy(buf, text.as_ptr(), len);
            buf.add(len).write(0);
        }
        Ok(buf.cast::<c_char>().cast_const())
    }

    /// Copy optional text; `None` becomes a null pointer.
    pub fn optional_text(&mut self, text: Option<&str>) -> CryptResult<*const c_char> {
        match text {
            Some(text) => self.text(text),
            None => Ok(ptr::null()),
        }
    }

    /// Copy a byte string without terminator; empty becomes null.
    pub fn bytes(&mut self, bytes: &[u8]) -> CryptResult<*const c_char> {
        if bytes.is_empty() {
            return Ok(ptr::null());
        }
        let buf = self.allocate(bytes.len())?;
        // Safety: buf holds bytes.len() bytes.
        unsafe { self.gateway.copy(buf, bytes.as_ptr(), bytes.len()) };
        Ok(buf.cast::<c_char>().cast_const())
    }

    /// Like [`bytes`](Self::bytes), but the copy is zeroed before release.
    pub fn secret(&mut self, bytes: &[u8]) -> CryptResult<*const c_char> {
        let buf = self.secret_buffer(bytes.len())?;
        if !buf.is_null() {
            // Safety: buf holds bytes.len() bytes.
            unsafe { self.gateway.copy(buf, bytes.as_ptr(), bytes.len()) };
        }
        Ok(buf.cast::<c_char>().cast_const())
    }

    /// Zero-filled output buffer for secret material the native side writes.
    pub fn secret_buffer(&mut self, size: usize) -> CryptResult<*mut u8> {
        if size == 0 {
            return Ok(ptr::null_mut());
        }
        let buf = self.gateway.allocate(size)?.as_ptr();
        self.releases.push(Release::WipeAndFree(buf, size));
        // Safety: buf holds size bytes.
        unsafe { ptr::write_bytes(buf, 0, size) };
        Ok(buf)
    }

    /// Copy a `#[repr(C)]` value into native memory.
    pub fn value<T: Copy>(&mut self, value: T) -> CryptResult<*mut T> {
        debug_assert!(align_of::<T>() <= MALLOC_ALIGN);
        let buf = self.allocate(size_of::<T>())?;
        // Safety: buf holds size_of::<T>() bytes, suitably aligned by malloc.
        unsafe {
            self.gateway
                .copy(buf, (&value as *const T).cast::<u8>(), size_of::<T>())
        };
        Ok(buf.cast::<T>())
    }

    /// Take ownership of a buffer the native side allocated for the caller.
    ///
    /// # Safety
    ///
    /// `ptr` must come from the gateway's allocator and nobody else may free
    /// it.
    pub unsafe fn adopt(&mut self, ptr: *mut c_void) {
        if !ptr.is_null() {
            self.releases.push(Release::Free(ptr.cast::<u8>()));
        }
    }

    /// Release everything now. Dropping the plan has the same effect.
    pub fn execute(mut self) {
        self.release_all();
    }

    fn release_all(&mut self) {
        for release in self.releases.drain(..) {
            // Safety: each pointer was allocated by this gateway and recorded
            // once; draining guarantees it is released once.
            unsafe {
                match release {
                    Release::Free(ptr) => self.gateway.release(ptr),
                    Release::WipeAndFree(ptr, len) => {
                        for i in 0..len {
                            ptr::write_volatile(ptr.add(i), 0);
                        }
                        self.gateway.release(ptr);
                    }
                }
            }
        }
    }
}

impl Drop for DeallocationPlan<'_> {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Copy a NUL-terminated native string into host memory.
///
/// Returns `None` for a null pointer. The native buffer is left alone; adopt
/// it into a plan first if the caller owns it.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn read_terminated(gateway: &MemoryGateway, ptr: *const c_char) -> Option<Vec<u8>> {
    if ptr.is_null() {
        return None;
    }
    let len = gateway.measure_length(ptr);
    let mut out = vec![0u8; len];
    gateway.bounded_copy(out.as_mut_ptr().cast::<c_char>(), ptr, len);
    Some(out)
}

/// [`read_terminated`] decoded as UTF-8, replacing invalid sequences.
///
/// # Safety
///
/// Same contract as [`read_terminated`].
pub unsafe fn read_text(gateway: &MemoryGateway, ptr: *const c_char) -> Option<String> {
    read_terminated(gateway, ptr).map(|bytes| match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Copy `len` bytes of native memory into host memory.
///
/// # Safety
///
/// `ptr` must be readable for `len` bytes.
pub unsafe fn read_bytes(gateway: &MemoryGateway, ptr: *const u8, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    if len > 0 {
        gateway.copy(out.as_mut_ptr(), ptr, len);
    }
    out
}
