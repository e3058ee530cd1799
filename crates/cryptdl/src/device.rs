//! Device handle and the libcryptsetup call facade
//!
//! A [`Device`] owns one `struct crypt_device *`. Every operation follows the
//! same shape: encode the arguments into a [`DeallocationPlan`], make the
//! native call, copy the outputs back into host memory, and let the plan
//! release everything when it goes out of scope.
//!
//! Strings libcryptsetup returns from getters (`crypt_get_type`,
//! `crypt_get_uuid`, token JSON, ...) belong to the device context. They are
//! copied and never freed here.

use crate::abi::{from_size, to_size, CInt, CSizeT};
use crate::bindings::{ensure_ready, Bindings};
use crate::consts::CRYPT_ANY_TOKEN;
use crate::dl::crypt::{CryptDevice, CryptSymbols, OptionalCryptSymbols};
use crate::error::{check, CryptError, CryptResult};
use crate::hooks::{log_trampoline, progress_trampoline, progress_usrptr, LogHook, LogHookSlot, ProgressHook};
use crate::marshal::{read_bytes, read_text, DeallocationPlan};
use crate::memory::MemoryGateway;
use crate::params::native::TokenParamsLuks2KeyringRaw;
use crate::params::{DeviceType, GenericParams, TokenParamsLuks2Keyring};
use crate::TokenInfo;
use std::ffi::c_char;
use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::Arc;

/// `-ENOENT`
const ENOENT: CInt = -2;

/// Handle to one libcryptsetup device context
pub struct Device {
    bindings: Arc<Bindings>,
    handle: Option<NonNull<CryptDevice>>,
    log_hook: Option<LogHookSlot>,
}

// Safety: the context is only reached through this handle, and `Device` is
// not `Sync`, so one thread uses it at a time.
unsafe impl Send for Device {}

impl Device {
    /// Open a context for the block device or image at `path`.
    pub fn init(path: &str) -> CryptResult<Self> {
        Self::init_with(ensure_ready()?, path)
    }

    /// Open a context for the active mapping `name`.
    pub fn init_by_name(name: &str) -> CryptResult<Self> {
        Self::init_by_name_with(ensure_ready()?, name)
    }

    /// [`init`](Self::init) against explicit bindings.
    pub fn init_with(bindings: Arc<Bindings>, path: &str) -> CryptResult<Self> {
        let init = bindings.crypt.symbols.crypt_init;
        Self::open(bindings, "crypt_init", init, path)
    }

    /// [`init_by_name`](Self::init_by_name) against explicit bindings.
    pub fn init_by_name_with(bindings: Arc<Bindings>, name: &str) -> CryptResult<Self> {
        let init = bindings.crypt.symbols.crypt_init_by_name;
        Self::open(bindings, "crypt_init_by_name", init, name)
    }

    fn open(
        bindings: Arc<Bindings>,
        function: &'static str,
        init: unsafe extern "C" fn(*mut *mut CryptDevice, *const c_char) -> CInt,
        target: &str,
    ) -> CryptResult<Self> {
        let handle = {
            let mut plan = DeallocationPlan::new(&bindings.memory);
            let target_ptr = plan.text(target)?;
            let mut raw: *mut CryptDevice = ptr::null_mut();
            // Safety: raw is a valid out-pointer; target_ptr lives until the
            // plan drops at the end of this block.
            check(function, unsafe { init(&mut raw, target_ptr) })?;
            NonNull::new(raw).ok_or(CryptError::NullHandle { function })?
        };
        tracing::debug!(device = target, function, "opened device context");
        Ok(Self {
            bindings,
            handle: Some(handle),
            log_hook: None,
        })
    }

    /// Release the native context. Returns `false` if it was already freed.
    pub fn free(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                // Safety: the handle came from crypt_init* and is freed once.
                unsafe { (self.symbols().crypt_free)(handle.as_ptr()) };
                self.log_hook = None;
                tracing::debug!("freed device context");
                true
            }
            None => false,
        }
    }

    /// Whether [`free`](Self::free) has not yet been called
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Bindings this device calls through
    pub fn bindings(&self) -> &Arc<Bindings> {
        &self.bindings
    }

    fn raw(&self) -> *mut CryptDevice {
        match self.handle {
            Some(handle) => handle.as_ptr(),
            None => panic!("cryptsetup device used after free"),
        }
    }

    fn symbols(&self) -> &CryptSymbols {
        &self.bindings.crypt.symbols
    }

    fn optional(&self) -> &OptionalCryptSymbols {
        &self.bindings.crypt.optional
    }

    fn memory(&self) -> &MemoryGateway {
        &self.bindings.memory
    }

    fn plan(&self) -> DeallocationPlan<'_> {
        DeallocationPlan::new(self.memory())
    }

    fn copy_text(&self, text: *const c_char) -> Option<String> {
        // Safety: libcryptsetup returns null or a NUL-terminated string.
        unsafe { read_text(self.memory(), text) }
    }

    /// Print the on-disk header to the library log.
    pub fn dump(&self) -> CryptResult<()> {
        let code = unsafe { (self.symbols().crypt_dump)(self.raw()) };
        check("crypt_dump", code).map(drop)
    }

    /// Header metadata as JSON (libcryptsetup 2.4+).
    pub fn dump_json(&self, flags: u32) -> CryptResult<String> {
        let dump_json = self.optional().crypt_dump_json.ok_or(CryptError::Unavailable {
            symbol: "crypt_dump_json",
        })?;
        let mut json: *const c_char = ptr::null();
        check("crypt_dump_json", unsafe { dump_json(self.raw(), &mut json, flags) })?;
        Ok(self.copy_text(json).unwrap_or_default())
    }

    /// Device type (`"LUKS2"`, `"PLAIN"`, ...) or `None` before format/load
    pub fn type_name(&self) -> Option<String> {
        let name = unsafe { (self.symbols().crypt_get_type)(self.raw()) };
        self.copy_text(name)
    }

    /// Write a new header (or plain mapping description) to the device.
    pub fn format(&self, device_type: &dyn DeviceType, params: &GenericParams) -> CryptResult<()> {
        let key_size = params.native_key_size()?;
        let mut plan = self.plan();
        let type_name = plan.text(device_type.name())?;
        let cipher = plan.text(&params.cipher)?;
        let cipher_mode = plan.text(&params.cipher_mode)?;
        let uuid = plan.optional_text(params.uuid.as_deref().filter(|uuid| !uuid.is_empty()))?;
        let volume_key = plan.secret(params.volume_key.as_deref().unwrap_or_default())?;
        let type_params = device_type.to_native(&mut plan)?;

        let code = unsafe {
            (self.symbols().crypt_format)(
                self.raw(),
                type_name,
                cipher,
                cipher_mode,
                uuid,
                volume_key,
                to_size(key_size),
                type_params,
            )
        };
        check("crypt_format", code)?;
        tracing::debug!(device_type = device_type.name(), cipher = %params.cipher, "formatted device");
        Ok(())
    }

    /// Fill part of a device with `pattern` (`CRYPT_WIPE_*`).
    #[allow(clippy::too_many_arguments)]
    pub fn wipe(
        &self,
        device_path: &str,
        pattern: CInt,
        offset: u64,
        length: u64,
        wipe_block_size: usize,
        flags: u32,
        progress: Option<&mut dyn ProgressHook>,
    ) -> CryptResult<()> {
        let mut plan = self.plan();
        let device_path = plan.text(device_path)?;

        let mut progress = progress;
        let (callback, usrptr) = match progress.as_mut() {
            Some(hook) => (Some(progress_trampoline()), progress_usrptr(hook)),
            None => (None, ptr::null_mut()),
        };

        // Safety: usrptr borrows the hook for the duration of the call.
        let code = unsafe {
            (self.symbols().crypt_wipe)(
                self.raw(),
                device_path,
                pattern,
                offset,
                length,
                to_size(wipe_block_size),
                flags,
                callback,
                usrptr,
            )
        };
        check("crypt_wipe", code).map(drop)
    }

    /// Resize an active mapping. `new_size` 0 uses the whole device.
    pub fn resize(&self, name: &str, new_size: u64) -> CryptResult<()> {
        let mut plan = self.plan();
        let name = plan.text(name)?;
        let code = unsafe { (self.symbols().crypt_resize)(self.raw(), name, new_size) };
        check("crypt_resize", code).map(drop)
    }

    /// Load the on-disk header, restricted to `device_type` when given.
    pub fn load(&self, device_type: Option<&dyn DeviceType>) -> CryptResult<()> {
        let mut plan = self.plan();
        let (type_name, type_params) = match device_type {
            Some(device_type) => (plan.text(device_type.name())?, device_type.to_native(&mut plan)?),
            None => (ptr::null(), ptr::null_mut()),
        };
        let code = unsafe { (self.symbols().crypt_load)(self.raw(), type_name, type_params) };
        check("crypt_load", code).map(drop)
    }

    /// Add a keyslot protected by `passphrase`, proving access with the
    /// volume key. `None` uses the key held by the context after `format`.
    ///
    /// Returns the keyslot number.
    pub fn keyslot_add_by_volume_key(
        &self,
        keyslot: CInt,
        volume_key: Option<&[u8]>,
        passphrase: &[u8],
    ) -> CryptResult<i32> {
        let mut plan = self.plan();
        let volume_key = volume_key.unwrap_or_default();
        let key_ptr = plan.secret(volume_key)?;
        let passphrase_ptr = plan.secret(passphrase)?;
        let code = unsafe {
            (self.symbols().crypt_keyslot_add_by_volume_key)(
                self.raw(),
                keyslot,
                key_ptr,
                to_size(volume_key.len()),
                passphrase_ptr,
                to_size(passphrase.len()),
            )
        };
        check("crypt_keyslot_add_by_volume_key", code)
    }

    /// Add a keyslot for `new_passphrase`, unlocking with `passphrase`.
    ///
    /// Returns the keyslot number.
    pub fn keyslot_add_by_passphrase(
        &self,
        keyslot: CInt,
        passphrase: &[u8],
        new_passphrase: &[u8],
    ) -> CryptResult<i32> {
        let mut plan = self.plan();
        let current = plan.secret(passphrase)?;
        let new = plan.secret(new_passphrase)?;
        let code = unsafe {
            (self.symbols().crypt_keyslot_add_by_passphrase)(
                self.raw(),
                keyslot,
                current,
                to_size(passphrase.len()),
                new,
                to_size(new_passphrase.len()),
            )
        };
        check("crypt_keyslot_add_by_passphrase", code)
    }

    /// Replace the passphrase of `keyslot_old`, storing it in `keyslot_new`.
    ///
    /// Returns the new keyslot number.
    pub fn keyslot_change_by_passphrase(
        &self,
        keyslot_old: CInt,
        keyslot_new: CInt,
        passphrase: &[u8],
        new_passphrase: &[u8],
    ) -> CryptResult<i32> {
        let mut plan = self.plan();
        let current = plan.secret(passphrase)?;
        let new = plan.secret(new_passphrase)?;
        let code = unsafe {
            (self.symbols().crypt_keyslot_change_by_passphrase)(
                self.raw(),
                keyslot_old,
                keyslot_new,
                current,
                to_size(passphrase.len()),
                new,
                to_size(new_passphrase.len()),
            )
        };
        check("crypt_keyslot_change_by_passphrase", code)
    }

    /// Activate as `name`, or only verify the passphrase when `name` is
    /// `None`.
    ///
    /// Returns the keyslot that opened.
    pub fn activate_by_passphrase(
        &self,
        name: Option<&str>,
        keyslot: CInt,
        passphrase: &[u8],
        flags: u32,
    ) -> CryptResult<i32> {
        let mut plan = self.plan();
        let name = plan.optional_text(name.filter(|name| !name.is_empty()))?;
        let passphrase_ptr = plan.secret(passphrase)?;
        let code = unsafe {
            (self.symbols().crypt_activate_by_passphrase)(
                self.raw(),
                name,
                keyslot,
                passphrase_ptr,
                to_size(passphrase.len()),
                flags,
            )
        };
        check("crypt_activate_by_passphrase", code)
    }

    /// Activate using a token. `user_data` is handed to the token handler.
    ///
    /// Returns the keyslot that opened.
    pub fn activate_by_token(
        &self,
        name: Option<&str>,
        token: CInt,
        user_data: Option<&str>,
        flags: u32,
    ) -> CryptResult<i32> {
        let mut plan = self.plan();
        let name = plan.optional_text(name.filter(|name| !name.is_empty()))?;
        let user_data = plan.optional_text(user_data.filter(|data| !data.is_empty()))?;
        let code = unsafe {
            (self.symbols().crypt_activate_by_token)(self.raw(), name, token, user_data.cast_mut().cast(), flags)
        };
        check("crypt_activate_by_token", code)
    }

    /// Activate using a token that needs a PIN (libcryptsetup 2.4+).
    ///
    /// Returns the keyslot that opened.
    pub fn activate_by_token_pin(
        &self,
        name: Option<&str>,
        token_type: Option<&str>,
        token: CInt,
        pin: &[u8],
        flags: u32,
    ) -> CryptResult<i32> {
        let activate = self
            .optional()
            .crypt_activate_by_token_pin
            .ok_or(CryptError::Unavailable {
                symbol: "crypt_activate_by_token_pin",
            })?;
        let mut plan = self.plan();
        let name = plan.optional_text(name.filter(|name| !name.is_empty()))?;
        let token_type = plan.optional_text(token_type)?;
        let pin_ptr = plan.secret(pin)?;
        let code = unsafe {
            activate(
                self.raw(),
                name,
                token_type,
                token,
                pin_ptr,
                to_size(pin.len()),
                ptr::null_mut(),
                flags,
            )
        };
        check("crypt_activate_by_token_pin", code)
    }

    /// Activate with the raw volume key, or only verify it when `name` is
    /// `None`.
    pub fn activate_by_volume_key(&self, name: Option<&str>, volume_key: Option<&[u8]>, flags: u32) -> CryptResult<()> {
        let mut plan = self.plan();
        let name = plan.optional_text(name.filter(|name| !name.is_empty()))?;
        let volume_key = volume_key.unwrap_or_default();
        let key_ptr = plan.secret(volume_key)?;
        let code = unsafe {
            (self.symbols().crypt_activate_by_volume_key)(
                self.raw(),
                name,
                key_ptr,
                to_size(volume_key.len()),
                flags,
            )
        };
        check("crypt_activate_by_volume_key", code).map(drop)
    }

    /// Remove the active mapping `name`.
    pub fn deactivate(&self, name: &str) -> CryptResult<()> {
        let mut plan = self.plan();
        let name = plan.text(name)?;
        let code = unsafe { (self.symbols().crypt_deactivate)(self.raw(), name) };
        check("crypt_deactivate", code).map(drop)
    }

    /// Volume key size in bytes, 0 when unknown
    pub fn volume_key_size(&self) -> usize {
        let size = unsafe { (self.symbols().crypt_get_volume_key_size)(self.raw()) };
        usize::try_from(size).unwrap_or_else(|_| {
            tracing::debug!(code = size, "crypt_get_volume_key_size failed");
            0
        })
    }

    /// Unlock `keyslot` with `passphrase` and copy out the volume key.
    ///
    /// Returns the key and the keyslot that opened.
    pub fn volume_key_get(&self, keyslot: CInt, passphrase: &[u8]) -> CryptResult<(Vec<u8>, i32)> {
        let capacity = self.volume_key_size();
        let mut plan = self.plan();
        let key = plan.secret_buffer(capacity)?;
        let passphrase_ptr = plan.secret(passphrase)?;
        let mut size: CSizeT = to_size(capacity);

        let code = unsafe {
            (self.symbols().crypt_volume_key_get)(
                self.raw(),
                keyslot,
                key.cast(),
                &mut size,
                passphrase_ptr,
                to_size(passphrase.len()),
            )
        };
        let slot = check("crypt_volume_key_get", code)?;
        let len = from_size(size).min(capacity);
        // Safety: the library wrote `len` bytes into a buffer of `capacity`.
        let volume_key = unsafe { read_bytes(self.memory(), key, len) };
        Ok((volume_key, slot))
    }

    /// Path of the underlying block device
    pub fn device_name(&self) -> Option<String> {
        let name = unsafe { (self.symbols().crypt_get_device_name)(self.raw()) };
        self.copy_text(name)
    }

    pub fn uuid(&self) -> Option<String> {
        let uuid = unsafe { (self.symbols().crypt_get_uuid)(self.raw()) };
        self.copy_text(uuid)
    }

    /// JSON definition of `token`.
    pub fn token_json_get(&self, token: CInt) -> CryptResult<String> {
        let mut json: *const c_char = ptr::null();
        let code = unsafe { (self.symbols().crypt_token_json_get)(self.raw(), token, &mut json) };
        check("crypt_token_json_get", code)?;
        Ok(self.copy_text(json).unwrap_or_default())
    }

    /// Store a token definition, or remove the token when `json` is `None`.
    /// `CRYPT_ANY_TOKEN` allocates a new id.
    ///
    /// Returns the token id.
    pub fn token_json_set(&self, token: CInt, json: Option<&str>) -> CryptResult<i32> {
        let mut plan = self.plan();
        let json = plan.optional_text(json)?;
        let code = unsafe { (self.symbols().crypt_token_json_set)(self.raw(), token, json) };
        check("crypt_token_json_set", code)
    }

    pub fn token_luks2_keyring_get(&self, token: CInt) -> CryptResult<TokenParamsLuks2Keyring> {
        let mut plan = self.plan();
        let params = plan.value(TokenParamsLuks2KeyringRaw::default())?;
        let code = unsafe { (self.symbols().crypt_token_luks2_keyring_get)(self.raw(), token, params) };
        check("crypt_token_luks2_keyring_get", code)?;
        // Safety: params is a live struct owned by the plan; the description
        // it points to belongs to the device context.
        let key_description = unsafe { (*params).key_description };
        Ok(TokenParamsLuks2Keyring {
            key_description: self.copy_text(key_description).unwrap_or_default(),
        })
    }

    /// Returns the token id.
    pub fn token_luks2_keyring_set(&self, token: CInt, params: &TokenParamsLuks2Keyring) -> CryptResult<i32> {
        let mut plan = self.plan();
        let raw = TokenParamsLuks2KeyringRaw {
            key_description: plan.text(&params.key_description)?,
        };
        let raw = plan.value(raw)?;
        let code = unsafe { (self.symbols().crypt_token_luks2_keyring_set)(self.raw(), token, raw) };
        check("crypt_token_luks2_keyring_set", code)
    }

    /// Assign `token` to `keyslot`. `CRYPT_ANY_TOKEN` assigns every token.
    pub fn token_assign_keyslot(&self, token: CInt, keyslot: CInt) -> CryptResult<()> {
        let code = unsafe { (self.symbols().crypt_token_assign_keyslot)(self.raw(), token, keyslot) };
        check_any_token("crypt_token_assign_keyslot", token, code)
    }

    /// Remove the assignment of `token` to `keyslot`.
    pub fn token_unassign_keyslot(&self, token: CInt, keyslot: CInt) -> CryptResult<()> {
        let code = unsafe { (self.symbols().crypt_token_unassign_keyslot)(self.raw(), token, keyslot) };
        check_any_token("crypt_token_unassign_keyslot", token, code)
    }

    /// Whether `token` is assigned to `keyslot`
    pub fn token_is_assigned(&self, token: CInt, keyslot: CInt) -> CryptResult<bool> {
        let code = unsafe { (self.symbols().crypt_token_is_assigned)(self.raw(), token, keyslot) };
        match code {
            ENOENT => Ok(false),
            code => check("crypt_token_is_assigned", code).map(|_| true),
        }
    }

    /// State of `token` and its type name when active
    pub fn token_status(&self, token: CInt) -> (TokenInfo, Option<String>) {
        let mut token_type: *const c_char = ptr::null();
        let code = unsafe { (self.symbols().crypt_token_status)(self.raw(), token, &mut token_type) };
        (TokenInfo::from_raw(code), self.copy_text(token_type))
    }

    /// Route this device's log messages to `hook`, replacing any earlier one.
    pub fn set_log_hook(&mut self, hook: impl LogHook + 'static) {
        let slot = LogHookSlot::new(Box::new(hook));
        // Safety: the slot outlives the registration; it is replaced only
        // after a new registration and dropped only after crypt_free.
        unsafe { (self.symbols().crypt_set_log_callback)(self.raw(), Some(log_trampoline()), slot.usrptr()) };
        self.log_hook = Some(slot);
    }

    /// Restore libcryptsetup's default logging for this device.
    pub fn clear_log_hook(&mut self) {
        unsafe { (self.symbols().crypt_set_log_callback)(self.raw(), None, ptr::null_mut()) };
        self.log_hook = None;
    }
}

/// `CRYPT_ANY_TOKEN` calls report success by echoing the sentinel.
fn check_any_token(function: &'static str, token: CInt, code: CInt) -> CryptResult<()> {
    if token == CRYPT_ANY_TOKEN && code == CRYPT_ANY_TOKEN {
        return Ok(());
    }
    check(function, code).map(drop)
}

impl Drop for Device {
    fn drop(&mut self) {
        self.free();
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("handle", &self.handle)
            .field("log_hook", &self.log_hook.is_some())
            .finish()
    }
}
