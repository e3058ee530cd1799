//! Shared helpers for unit tests
//!
//! A C-runtime stand-in backed by Rust's allocator, so gateway and plan tests
//! do not depend on the host's libc.

use crate::abi::{from_size, to_size, CSizeT};
use crate::dl::libc::LibcSymbols;
use crate::memory::MemoryGateway;
use std::alloc::{alloc, dealloc, Layout};
use std::ffi::{c_char, c_void, CStr};
use std::ptr;

const HEADER: usize = 16;

unsafe extern "C" fn host_malloc(size: CSizeT) -> *mut c_void {
    let total = from_size(size) + HEADER;
    let Ok(layout) = Layout::from_size_align(total, HEADER) else {
        return ptr::null_mut();
    };
    let base = alloc(layout);
    if base.is_null() {
        return ptr::null_mut();
    }
    base.cast::<usize>().write(total);
    base.add(HEADER).cast()
}

unsafe extern "C" fn host_free(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    let base = ptr.cast::<u8>().sub(HEADER);
    let total = base.cast::<usize>().read();
    dealloc(base, Layout::from_size_align_unchecked(total, HEADER));
}

unsafe extern "C" fn failing_malloc(_size: CSizeT) -> *mut c_void {
    ptr::null_mut()
}

unsafe extern "C" fn host_memcpy(dst: *mut c_void, src: *const c_void, n: CSizeT) -> *mut c_void {
    ptr::copy_nonoverlapping(src.cast::<u8>(), dst.cast::<u8>(), from_size(n));
    dst
}

unsafe extern "C" fn host_strlen(s: *const c_char) -> CSizeT {
    to_size(CStr::from_ptr(s).to_bytes().len())
}

unsafe extern "C" fn host_strncpy(dst: *mut c_char, src: *const c_char, n: CSizeT) -> *mut c_char {
    let n = from_size(n);
    let mut i = 0;
    while i < n {
        let c = *src.add(i);
        *dst.add(i) = c;
        i += 1;
        if c == 0 {
            break;
        }
    }
    while i < n {
        *dst.add(i) = 0;
        i += 1;
    }
    dst
}

fn host_symbols() -> LibcSymbols {
    LibcSymbols {
        malloc: host_malloc,
        free: host_free,
        memcpy: host_memcpy,
        strlen: host_strlen,
        strncpy: host_strncpy,
    }
}

/// Gateway whose allocator is Rust's global allocator
pub fn host_gateway() -> MemoryGateway {
    unsafe { MemoryGateway::from_symbols(host_symbols()) }
}

/// Gateway whose `malloc` always returns null
pub fn failing_gateway() -> MemoryGateway {
    unsafe {
        MemoryGateway::from_symbols(LibcSymbols {
            malloc: failing_malloc,
            ..host_symbols()
        })
    }
}
