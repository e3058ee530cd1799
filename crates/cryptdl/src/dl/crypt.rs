//! libcryptsetup entry points
//!
//! Signatures follow `libcryptsetup.h` for the 2.x ABI (`libcryptsetup.so.12`).

use super::symbol_table;
use crate::abi::{CInt, CSizeT};
use crate::error::CryptResult;
use crate::params::native::TokenParamsLuks2KeyringRaw;
use libloading::Library;
use std::ffi::{c_char, c_void};

/// Opaque `struct crypt_device`
#[repr(C)]
pub struct CryptDevice {
    _private: [u8; 0],
}

/// `int (*progress)(uint64_t size, uint64_t offset, void *usrptr)`
pub type ProgressCallback = unsafe extern "C" fn(size: u64, offset: u64, usrptr: *mut c_void) -> CInt;

/// `void (*log)(int level, const char *msg, void *usrptr)`
pub type LogCallback = unsafe extern "C" fn(level: CInt, msg: *const c_char, usrptr: *mut c_void);

pub type InitFn = unsafe extern "C" fn(cd: *mut *mut CryptDevice, device: *const c_char) -> CInt;
pub type InitByNameFn = unsafe extern "C" fn(cd: *mut *mut CryptDevice, name: *const c_char) -> CInt;
pub type FreeFn = unsafe extern "C" fn(cd: *mut CryptDevice);
pub type DumpFn = unsafe extern "C" fn(cd: *mut CryptDevice) -> CInt;
pub type GetTextFn = unsafe extern "C" fn(cd: *mut CryptDevice) -> *const c_char;
pub type FormatFn = unsafe extern "C" fn(
    cd: *mut CryptDevice,
    type_: *const c_char,
    cipher: *const c_char,
    cipher_mode: *const c_char,
    uuid: *const c_char,
    volume_key: *const c_char,
    volume_key_size: CSizeT,
    params: *mut c_void,
) -> CInt;
pub type WipeFn = unsafe extern "C" fn(
    cd: *mut CryptDevice,
    dev_path: *const c_char,
    pattern: CInt,
    offset: u64,
    length: u64,
    wipe_block_size: CSizeT,
    flags: u32,
    progress: Option<ProgressCallback>,
    usrptr: *mut c_void,
) -> CInt;
pub type ResizeFn = unsafe extern "C" fn(cd: *mut CryptDevice, name: *const c_char, new_size: u64) -> CInt;
pub type LoadFn =
    unsafe extern "C" fn(cd: *mut CryptDevice, requested_type: *const c_char, params: *mut c_void) -> CInt;
pub type KeyslotAddByVolumeKeyFn = unsafe extern "C" fn(
    cd: *mut CryptDevice,
    keyslot: CInt,
    volume_key: *const c_char,
    volume_key_size: CSizeT,
    passphrase: *const c_char,
    passphrase_size: CSizeT,
) -> CInt;
pub type KeyslotAddByPassphraseFn = unsafe extern "C" fn(
    cd: *mut CryptDevice,
    keyslot: CInt,
    passphrase: *const c_char,
    passphrase_size: CSizeT,
    new_passphrase: *const c_char,
    new_passphrase_size: CSizeT,
) -> CInt;
pub type KeyslotChangeByPassphraseFn = unsafe extern "C" fn(
    cd: *mut CryptDevice,
    keyslot_old: CInt,
    keyslot_new: CInt,
    passphrase: *const c_char,
    passphrase_size: CSizeT,
    new_passphrase: *const c_char,
    new_passphrase_size: CSizeT,
) -> CInt;
pub type ActivateByPassphraseFn = unsafe extern "C" fn(
    cd: *mut CryptDevice,
    name: *const c_char,
    keyslot: CInt,
    passphrase: *const c_char,
    passphrase_size: CSizeT,
    flags: u32,
) -> CInt;
pub type ActivateByTokenFn = unsafe extern "C" fn(
    cd: *mut CryptDevice,
    name: *const c_char,
    token: CInt,
    usrptr: *mut c_void,
    flags: u32,
) -> CInt;
pub type ActivateByVolumeKeyFn = unsafe extern "C" fn(
    cd: *mut CryptDevice,
    name: *const c_char,
    volume_key: *const c_char,
    volume_key_size: CSizeT,
    flags: u32,
) -> CInt;
pub type DeactivateFn = unsafe extern "C" fn(cd: *mut CryptDevice, name: *const c_char) -> CInt;
pub type SetDebugLevelFn = unsafe extern "C" fn(level: CInt);
pub type VolumeKeySizeFn = unsafe extern "C" fn(cd: *mut CryptDevice) -> CInt;
pub type VolumeKeyGetFn = unsafe extern "C" fn(
    cd: *mut CryptDevice,
    keyslot: CInt,
    volume_key: *mut c_char,
    volume_key_size: *mut CSizeT,
    passphrase: *const c_char,
    passphrase_size: CSizeT,
) -> CInt;
pub type TokenJsonGetFn =
    unsafe extern "C" fn(cd: *mut CryptDevice, token: CInt, json: *mut *const c_char) -> CInt;
pub type TokenJsonSetFn = unsafe extern "C" fn(cd: *mut CryptDevice, token: CInt, json: *const c_char) -> CInt;
pub type TokenKeyringGetFn =
    unsafe extern "C" fn(cd: *mut CryptDevice, token: CInt, params: *mut TokenParamsLuks2KeyringRaw) -> CInt;
pub type TokenKeyringSetFn =
    unsafe extern "C" fn(cd: *mut CryptDevice, token: CInt, params: *const TokenParamsLuks2KeyringRaw) -> CInt;
pub type TokenKeyslotFn = unsafe extern "C" fn(cd: *mut CryptDevice, token: CInt, keyslot: CInt) -> CInt;
pub type TokenStatusFn =
    unsafe extern "C" fn(cd: *mut CryptDevice, token: CInt, type_: *mut *const c_char) -> CInt;
pub type SetLogCallbackFn =
    unsafe extern "C" fn(cd: *mut CryptDevice, log: Option<LogCallback>, usrptr: *mut c_void);

// libcryptsetup >= 2.4
pub type DumpJsonFn = unsafe extern "C" fn(cd: *mut CryptDevice, json: *mut *const c_char, flags: u32) -> CInt;
pub type ActivateByTokenPinFn = unsafe extern "C" fn(
    cd: *mut CryptDevice,
    name: *const c_char,
    type_: *const c_char,
    token: CInt,
    pin: *const c_char,
    pin_size: CSizeT,
    usrptr: *mut c_void,
    flags: u32,
) -> CInt;
pub type TokenMaxFn = unsafe extern "C" fn(type_: *const c_char) -> CInt;
pub type TokenExternalDisableFn = unsafe extern "C" fn();
pub type TokenExternalPathFn = unsafe extern "C" fn() -> *const c_char;

symbol_table! {
    /// Entry points every supported libcryptsetup exports
    pub struct CryptSymbols: required {
        crypt_init: InitFn,
        crypt_init_by_name: InitByNameFn,
        crypt_free: FreeFn,
        crypt_dump: DumpFn,
        crypt_get_type: GetTextFn,
        crypt_format: FormatFn,
        crypt_wipe: WipeFn,
        crypt_resize: ResizeFn,
        crypt_load: LoadFn,
        crypt_keyslot_add_by_volume_key: KeyslotAddByVolumeKeyFn,
        crypt_keyslot_add_by_passphrase: KeyslotAddByPassphraseFn,
        crypt_keyslot_change_by_passphrase: KeyslotChangeByPassphraseFn,
        crypt_activate_by_passphrase: ActivateByPassphraseFn,
        crypt_activate_by_token: ActivateByTokenFn,
        crypt_activate_by_volume_key: ActivateByVolumeKeyFn,
        crypt_deactivate: DeactivateFn,
        crypt_set_debug_level: SetDebugLevelFn,
        crypt_get_volume_key_size: VolumeKeySizeFn,
        crypt_volume_key_get: VolumeKeyGetFn,
        crypt_get_device_name: GetTextFn,
        crypt_get_uuid: GetTextFn,
        crypt_token_json_get: TokenJsonGetFn,
        crypt_token_json_set: TokenJsonSetFn,
        crypt_token_luks2_keyring_get: TokenKeyringGetFn,
        crypt_token_luks2_keyring_set: TokenKeyringSetFn,
        crypt_token_assign_keyslot: TokenKeyslotFn,
        crypt_token_unassign_keyslot: TokenKeyslotFn,
        crypt_token_is_assigned: TokenKeyslotFn,
        crypt_token_status: TokenStatusFn,
        crypt_set_log_callback: SetLogCallbackFn,
    }
}

symbol_table! {
    /// Entry points added in later libcryptsetup releases
    pub struct OptionalCryptSymbols: optional {
        crypt_dump_json: DumpJsonFn,
        crypt_activate_by_token_pin: ActivateByTokenPinFn,
        crypt_token_max: TokenMaxFn,
        crypt_token_external_disable: TokenExternalDisableFn,
        crypt_token_external_path: TokenExternalPathFn,
    }
}

/// Bound libcryptsetup: the open library plus its resolved entry points
pub struct CryptLibrary {
    /// Keeps the resolved function pointers valid. Never unloaded.
    _library: Option<Library>,
    pub(crate) symbols: CryptSymbols,
    pub(crate) optional: OptionalCryptSymbols,
}

impl CryptLibrary {
    /// Resolve every required entry point of an opened libcryptsetup.
    ///
    /// # Safety
    ///
    /// `library` must be a libcryptsetup built for the 2.x ABI.
    pub unsafe fn bind(library: Library, library_name: &str) -> CryptResult<Self> {
        let symbols = CryptSymbols::resolve(&library, library_name)?;
        let optional = OptionalCryptSymbols::resolve(&library);
        tracing::debug!(
            library = library_name,
            required = CryptSymbols::SYMBOLS.len(),
            optional = ?optional.available(),
            "bound libcryptsetup"
        );
        Ok(Self {
            _library: Some(library),
            symbols,
            optional,
        })
    }

    /// Build a library from function pointers supplied by the host.
    ///
    /// # Safety
    ///
    /// Every pointer must behave like the libcryptsetup function it stands in
    /// for.
    pub unsafe fn from_symbols(symbols: CryptSymbols, optional: OptionalCryptSymbols) -> Self {
        Self {
            _library: None,
            symbols,
            optional,
        }
    }

    /// Optional entry points exported by this library
    pub fn capabilities(&self) -> Vec<&'static str> {
        self.optional.available()
    }
}
