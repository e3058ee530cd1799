//! Native integer widths for the current build target
//!
//! libcryptsetup is compiled against the platform C ABI, so every integer that
//! crosses the boundary must have the width the C compiler picked for that
//! target. Three models exist:
//!
//! | model | int | long | size_t | targets |
//! |-------|-----|------|--------|---------|
//! | ILP32 | 32  | 32   | 32     | every 32-bit architecture |
//! | LP64  | 32  | 64   | 64     | 64-bit Linux, BSD, macOS |
//! | LLP64 | 32  | 32   | 64     | 64-bit Windows |
//!
//! The model is chosen at compile time. A target that fits none of them does
//! not build.

use std::fmt;

/// Integer model of the native C ABI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiModel {
    /// 32-bit int, long and pointers
    Ilp32,
    /// 64-bit long and pointers (POSIX)
    Lp64,
    /// 32-bit long, 64-bit pointers (Windows)
    Llp64,
}

impl AbiModel {
    /// Width of `long` in bytes under this model
    pub const fn long_bytes(self) -> usize {
        match self {
            AbiModel::Ilp32 | AbiModel::Llp64 => 4,
            AbiModel::Lp64 => 8,
        }
    }

    /// Width of `size_t` in bytes under this model
    pub const fn size_bytes(self) -> usize {
        match self {
            AbiModel::Ilp32 => 4,
            AbiModel::Lp64 | AbiModel::Llp64 => 8,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AbiModel::Ilp32 => "ILP32",
            AbiModel::Lp64 => "LP64",
            AbiModel::Llp64 => "LLP64",
        }
    }
}

impl fmt::Display for AbiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(target_pointer_width = "32")]
mod model {
    pub type CInt = i32;
    pub type CUint = u32;
    pub type CLong = i32;
    pub type CULong = u32;
    pub type CULongLong = u64;
    pub type CSizeT = u32;

    pub const ABI_MODEL: super::AbiModel = super::AbiModel::Ilp32;
}

#[cfg(all(target_pointer_width = "64", target_os = "windows"))]
mod model {
    pub type CInt = i32;
    pub type CUint = u32;
    pub type CLong = i32;
    pub type CULong = u32;
    pub type CULongLong = u64;
    pub type CSizeT = u64;

    pub const ABI_MODEL: super::AbiModel = super::AbiModel::Llp64;
}

#[cfg(all(target_pointer_width = "64", not(target_os = "windows")))]
mod model {
    pub type CInt = i32;
    pub type CUint = u32;
    pub type CLong = i64;
    pub type CULong = u64;
    pub type CULongLong = u64;
    pub type CSizeT = u64;

    pub const ABI_MODEL: super::AbiModel = super::AbiModel::Lp64;
}

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("unclassified target: assign it an ABI model in cryptdl::abi before defining native structs");

pub use model::{CInt, CLong, CSizeT, CUint, CULong, CULongLong, ABI_MODEL};

const _: () = {
    use std::mem::size_of;

    assert!(size_of::<CInt>() == 4);
    assert!(size_of::<CUint>() == 4);
    assert!(size_of::<CULongLong>() == 8);
    assert!(size_of::<CLong>() == ABI_MODEL.long_bytes());
    assert!(size_of::<CULong>() == ABI_MODEL.long_bytes());
    assert!(size_of::<CSizeT>() == ABI_MODEL.size_bytes());

    // Must agree with what the Rust toolchain believes the C ABI is.
    assert!(size_of::<CInt>() == size_of::<std::ffi::c_int>());
    assert!(size_of::<CLong>() == size_of::<std::ffi::c_long>());
    assert!(size_of::<CULong>() == size_of::<std::ffi::c_ulong>());
    assert!(size_of::<CULongLong>() == size_of::<std::ffi::c_ulonglong>());
    assert!(size_of::<CSizeT>() == size_of::<usize>());
};

/// Convert a host length to `size_t`.
///
/// Lossless: `size_t` and `usize` have the same width on every classified
/// target (checked above).
#[inline]
pub fn to_size(len: usize) -> CSizeT {
    len as CSizeT
}

/// Convert a `size_t` returned by native code to a host length.
#[inline]
pub fn from_size(size: CSizeT) -> usize {
    size as usize
}
