//! `#[repr(C)]` mirrors of the libcryptsetup parameter structs
//!
//! Field order and widths follow `libcryptsetup.h`. Only the ABI aliases and
//! fixed-width integers are used, so the layout matches the C compiler's on
//! every supported target.

use crate::abi::{CSizeT, CUint};
use std::ffi::c_char;
use std::ptr;

/// `struct crypt_params_plain`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CryptParamsPlainRaw {
    pub hash: *const c_char,
    pub offset: u64,
    pub skip: u64,
    pub size: u64,
    pub sector_size: u32,
}

/// `struct crypt_params_luks1`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CryptParamsLuks1Raw {
    pub hash: *const c_char,
    pub data_alignment: CSizeT,
    pub data_device: *const c_char,
}

/// `struct crypt_pbkdf_type`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CryptPbkdfTypeRaw {
    pub type_: *const c_char,
    pub hash: *const c_char,
    pub time_ms: u32,
    pub iterations: u32,
    pub max_memory_kb: u32,
    pub parallel_threads: u32,
    pub flags: u32,
}

/// `struct crypt_params_integrity`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CryptParamsIntegrityRaw {
    pub journal_size: u64,
    pub journal_watermark: CUint,
    pub journal_commit_time: CUint,
    pub interleave_sectors: u32,
    pub tag_size: u32,
    pub sector_size: u32,
    pub buffer_sectors: u32,
    pub integrity: *const c_char,
    pub integrity_key_size: u32,
    pub journal_integrity: *const c_char,
    pub journal_integrity_key: *const c_char,
    pub journal_integrity_key_size: u32,
    pub journal_crypt: *const c_char,
    pub journal_crypt_key: *const c_char,
    pub journal_crypt_key_size: u32,
}

/// `struct crypt_params_luks2`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CryptParamsLuks2Raw {
    pub pbkdf: *const CryptPbkdfTypeRaw,
    pub integrity_params: *const CryptParamsIntegrityRaw,
    pub integrity: *const c_char,
    pub data_alignment: CSizeT,
    pub data_device: *const c_char,
    pub sector_size: u32,
    pub label: *const c_char,
    pub subsystem: *const c_char,
}

/// `struct crypt_token_params_luks2_keyring`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TokenParamsLuks2KeyringRaw {
    pub key_description: *const c_char,
}

impl Default for TokenParamsLuks2KeyringRaw {
    fn default() -> Self {
        Self {
            key_description: ptr::null(),
        }
    }
}
