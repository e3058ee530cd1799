//! C runtime entry points used for native memory

use super::symbol_table;
use crate::abi::CSizeT;
use std::ffi::{c_char, c_void};

pub type MallocFn = unsafe extern "C" fn(size: CSizeT) -> *mut c_void;
pub type FreeFn = unsafe extern "C" fn(ptr: *mut c_void);
pub type MemcpyFn = unsafe extern "C" fn(dst: *mut c_void, src: *const c_void, n: CSizeT) -> *mut c_void;
pub type StrlenFn = unsafe extern "C" fn(s: *const c_char) -> CSizeT;
pub type StrncpyFn = unsafe extern "C" fn(dst: *mut c_char, src: *const c_char, n: CSizeT) -> *mut c_char;

symbol_table! {
    /// Allocator and copy primitives of the C runtime libcryptsetup links
    /// against.
    pub struct LibcSymbols: required {
        malloc: MallocFn,
        free: FreeFn,
        memcpy: MemcpyFn,
        strlen: StrlenFn,
        strncpy: StrncpyFn,
    }
}
